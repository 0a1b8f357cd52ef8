use std::sync::Arc;

use smallvec::SmallVec;

use super::gpu::CommandBuffer as _;
use super::gpu::{
    ClearAttachment,
    ClearColor,
    ClearValue,
    DepthStencilValue,
    LoadOp,
};
use super::*;

/// Begins and ends render passes lazily and holds clears that were requested
/// while no pass was active.
pub(super) struct RenderPassController<B: GPUBackend> {
    framebuffer: Option<Arc<Framebuffer<B>>>,
    active: bool,
    ever_active: bool,
    color_clears: SmallVec<[Option<ClearColor>; 8]>,
    depth_clear: Option<DepthStencilValue>,
}

impl<B: GPUBackend> RenderPassController<B> {
    pub(super) fn new() -> Self {
        Self {
            framebuffer: None,
            active: false,
            ever_active: false,
            color_clears: SmallVec::new(),
            depth_clear: None,
        }
    }

    /// Forgets the framebuffer. A pass that is still open is abandoned along
    /// with its command buffer.
    pub(super) fn reset(&mut self) {
        self.active = false;
        self.framebuffer = None;
        self.ever_active = false;
        self.color_clears.clear();
        self.depth_clear = None;
    }

    #[inline(always)]
    pub(super) fn framebuffer(&self) -> Option<&Arc<Framebuffer<B>>> {
        self.framebuffer.as_ref()
    }

    #[inline(always)]
    pub(super) fn is_active(&self) -> bool {
        self.active
    }

    pub(super) unsafe fn set_framebuffer(&mut self, command_buffer: &mut B::CommandBuffer, framebuffer: &Arc<Framebuffer<B>>) {
        if self.active {
            self.end(command_buffer);
            // Make color and depth writes visible to the following passes.
            command_buffer.render_pass_barrier();
        }
        self.framebuffer = Some(framebuffer.clone());
        self.ever_active = false;
        self.color_clears.clear();
        self.color_clears
            .resize(framebuffer.color_target_count() as usize, None);
        self.depth_clear = None;
    }

    pub(super) unsafe fn clear_color_target(
        &mut self,
        command_buffer: &mut B::CommandBuffer,
        index: u32,
        color: ClearColor,
    ) -> Result<(), CommandError> {
        let framebuffer = self.framebuffer.as_ref().ok_or(CommandError::NoFramebuffer)?;
        let count = framebuffer.color_target_count();
        if count == 0 {
            return Err(CommandError::NoColorTarget);
        }
        if index >= count {
            return Err(CommandError::ColorTargetOutOfRange { index, count });
        }

        if self.active {
            command_buffer.clear_attachment(&ClearAttachment::Color { index, color }, &framebuffer.full_rect());
        } else {
            self.color_clears[index as usize] = Some(color);
        }
        Ok(())
    }

    pub(super) unsafe fn clear_depth_stencil(
        &mut self,
        command_buffer: &mut B::CommandBuffer,
        value: DepthStencilValue,
    ) -> Result<(), CommandError> {
        let framebuffer = self.framebuffer.as_ref().ok_or(CommandError::NoFramebuffer)?;
        if !framebuffer.has_depth_target() {
            return Err(CommandError::NoDepthTarget);
        }

        if self.active {
            command_buffer.clear_attachment(&ClearAttachment::DepthStencil(value), &framebuffer.full_rect());
        } else {
            self.depth_clear = Some(value);
        }
        Ok(())
    }

    pub(super) unsafe fn ensure_active(&mut self, command_buffer: &mut B::CommandBuffer) -> Result<(), CommandError> {
        if !self.active {
            self.begin(command_buffer)?;
        }
        Ok(())
    }

    pub(super) unsafe fn ensure_inactive(&mut self, command_buffer: &mut B::CommandBuffer) {
        if self.active {
            self.end(command_buffer);
        }
    }

    /// Ends the active pass. A framebuffer that was bound but never drawn to,
    /// or that got clears after its last pass, gets one more pass so the
    /// queued clears are applied.
    pub(super) unsafe fn finish(&mut self, command_buffer: &mut B::CommandBuffer) {
        if self.active {
            self.end(command_buffer);
        } else if self.framebuffer.is_some() && (!self.ever_active || self.has_pending_clears()) {
            if self.begin(command_buffer).is_ok() {
                self.end(command_buffer);
            }
        }
    }

    fn has_pending_clears(&self) -> bool {
        self.depth_clear.is_some() || self.color_clears.iter().any(Option::is_some)
    }

    unsafe fn begin(&mut self, command_buffer: &mut B::CommandBuffer) -> Result<(), CommandError> {
        let framebuffer = self.framebuffer.as_ref().ok_or(CommandError::NoFramebuffer)?;

        let has_attachments = !self.color_clears.is_empty() || framebuffer.has_depth_target();
        let colors_ready = self.color_clears.iter().all(Option::is_some);
        let depth_ready = !framebuffer.has_depth_target() || self.depth_clear.is_some();
        if has_attachments && colors_ready && depth_ready {
            let mut clear_values = SmallVec::<[ClearValue; 9]>::new();
            clear_values.extend(self.color_clears.iter().flatten().map(|color| ClearValue::Color(*color)));
            if framebuffer.has_depth_target() {
                clear_values.extend(self.depth_clear.map(ClearValue::DepthStencil));
            }
            command_buffer.begin_render_pass(framebuffer.handle(), LoadOp::Clear, &clear_values);
        } else {
            command_buffer.begin_render_pass(framebuffer.handle(), LoadOp::Load, &[]);
            let rect = framebuffer.full_rect();
            for (index, color) in self.color_clears.iter().enumerate() {
                if let Some(color) = color {
                    command_buffer.clear_attachment(
                        &ClearAttachment::Color {
                            index: index as u32,
                            color: *color,
                        },
                        &rect,
                    );
                }
            }
            if let Some(value) = self.depth_clear {
                command_buffer.clear_attachment(&ClearAttachment::DepthStencil(value), &rect);
            }
        }

        self.color_clears.iter_mut().for_each(|color| *color = None);
        self.depth_clear = None;
        self.active = true;
        self.ever_active = true;
        Ok(())
    }

    unsafe fn end(&mut self, command_buffer: &mut B::CommandBuffer) {
        debug_assert!(self.active);
        command_buffer.end_render_pass();
        self.active = false;
    }
}
