use std::sync::Arc;

use emberline_core::gpu::*;

use crate::buffer::BufferStorage;
use crate::command::{
    Command,
    ExecutedCommand,
};
use crate::descriptor::ResourceSetStorage;
use crate::device::SoftwareShared;
use crate::framebuffer::{
    AttachmentStorage,
    FramebufferStorage,
};
use crate::liveness::Liveness;
use crate::pipeline::PipelineStorage;
use crate::texel::{
    encode_color,
    encode_depth_stencil,
};
use crate::texture::TextureStorage;

#[derive(Default)]
struct BindState {
    pipeline: Option<Arc<PipelineStorage>>,
    sets: Vec<Option<Arc<ResourceSetStorage>>>,
}

/// Runs one submitted command buffer. Bound state does not carry over
/// between command buffers.
pub(crate) struct Executor<'a> {
    shared: &'a SoftwareShared,
    framebuffer: Option<Arc<FramebufferStorage>>,
    graphics: BindState,
    compute: BindState,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(shared: &'a SoftwareShared) -> Self {
        Self {
            shared,
            framebuffer: None,
            graphics: BindState::default(),
            compute: BindState::default(),
        }
    }

    pub(crate) fn execute(&mut self, commands: &[Command]) {
        for command in commands {
            let executed = self.execute_command(command);
            self.shared.log(executed);
        }
        if self.framebuffer.is_some() {
            self.violation("command buffer ended inside a render pass");
        }
    }

    fn violation(&self, message: impl Into<String>) {
        self.shared.violation(message.into());
    }

    fn check_alive(&self, liveness: &Liveness, operation: &str) {
        if liveness.is_destroyed() {
            self.violation(format!("{} used {} after it was destroyed", operation, liveness.describe()));
        }
    }

    fn check_outside_pass(&self, operation: &str) {
        if self.framebuffer.is_some() {
            self.violation(format!("{} recorded inside a render pass", operation));
        }
    }

    fn bind_state(&mut self, bind_point: BindPoint) -> &mut BindState {
        match bind_point {
            BindPoint::Graphics => &mut self.graphics,
            BindPoint::Compute => &mut self.compute,
        }
    }

    fn execute_command(&mut self, command: &Command) -> ExecutedCommand {
        match command {
            Command::BeginRenderPass {
                framebuffer,
                load_op,
                clear_values,
            } => {
                self.begin_render_pass(framebuffer, *load_op, clear_values);
                ExecutedCommand::BeginRenderPass {
                    load_op: *load_op,
                    clear_value_count: clear_values.len() as u32,
                }
            }
            Command::EndRenderPass => {
                if self.framebuffer.take().is_none() {
                    self.violation("ended a render pass that was never begun");
                }
                ExecutedCommand::EndRenderPass
            }
            Command::ClearAttachment { attachment, rect } => {
                self.clear_attachment(attachment, rect);
                ExecutedCommand::ClearAttachment(*attachment)
            }
            Command::RenderPassBarrier => {
                self.check_outside_pass("pipeline barrier");
                ExecutedCommand::RenderPassBarrier
            }
            Command::SetEvent(event) => {
                self.check_outside_pass("set event");
                self.check_alive(&event.liveness, "set event");
                event.set();
                ExecutedCommand::SetEvent
            }
            Command::BindPipeline(pipeline) => {
                self.check_alive(&pipeline.liveness, "bind pipeline");
                let bind_point = pipeline.info.bind_point;
                let state = self.bind_state(bind_point);
                state.sets.clear();
                state.sets.resize(pipeline.info.resource_set_count as usize, None);
                state.pipeline = Some(pipeline.clone());
                ExecutedCommand::BindPipeline(bind_point)
            }
            Command::BindResourceSets {
                bind_point,
                first_set,
                sets,
            } => {
                self.bind_resource_sets(*bind_point, *first_set, sets);
                ExecutedCommand::BindResourceSets {
                    bind_point: *bind_point,
                    first_set: *first_set,
                    count: sets.len() as u32,
                }
            }
            Command::SetVertexBuffer { index, buffer } => {
                self.check_alive(&buffer.liveness, "set vertex buffer");
                ExecutedCommand::SetVertexBuffer { index: *index }
            }
            Command::SetIndexBuffer(buffer) => {
                self.check_alive(&buffer.liveness, "set index buffer");
                ExecutedCommand::SetIndexBuffer
            }
            Command::SetViewport { index, .. } => ExecutedCommand::SetViewport { index: *index },
            Command::SetScissor { index, scissor } => ExecutedCommand::SetScissor {
                index: *index,
                scissor: *scissor,
            },
            Command::Draw => {
                self.validate_draw(None);
                ExecutedCommand::Draw
            }
            Command::DrawIndexed => {
                self.validate_draw(None);
                ExecutedCommand::DrawIndexed
            }
            Command::DrawIndirect(buffer) => {
                self.validate_draw(Some(buffer));
                ExecutedCommand::DrawIndirect
            }
            Command::DrawIndexedIndirect(buffer) => {
                self.validate_draw(Some(buffer));
                ExecutedCommand::DrawIndexedIndirect
            }
            Command::Dispatch => {
                self.validate_dispatch(None);
                ExecutedCommand::Dispatch
            }
            Command::DispatchIndirect(buffer) => {
                self.validate_dispatch(Some(buffer));
                ExecutedCommand::DispatchIndirect
            }
            Command::CopyBuffer { src, dst, region } => {
                self.copy_buffer(src, dst, region);
                ExecutedCommand::CopyBuffer { size: region.size }
            }
            Command::CopyTexture { src, dst, region } => {
                self.copy_texture(src, dst, region);
                ExecutedCommand::CopyTexture
            }
            Command::TransitionTexture { texture, range, layout } => {
                self.check_alive(&texture.liveness, "texture transition");
                let mut layouts = texture.layouts.lock();
                for layer in range.base_array_layer..range.base_array_layer + range.array_layer_length {
                    for mip in range.base_mip_level..range.base_mip_level + range.mip_level_length {
                        if let Some(current) = layouts.get_mut(texture.info.subresource_index(mip, layer) as usize) {
                            *current = *layout;
                        }
                    }
                }
                ExecutedCommand::TransitionTexture { layout: *layout }
            }
            Command::ResolveTexture { src, dst } => {
                self.resolve_texture(src, dst);
                ExecutedCommand::ResolveTexture
            }
        }
    }

    fn begin_render_pass(&mut self, framebuffer: &Arc<FramebufferStorage>, load_op: LoadOp, clear_values: &[ClearValue]) {
        if self.framebuffer.is_some() {
            self.violation("began a render pass inside another render pass");
        }
        self.check_alive(&framebuffer.liveness, "begin render pass");
        for attachment in framebuffer.attachments() {
            self.check_alive(&attachment.texture.liveness, "begin render pass");
        }

        for attachment in &framebuffer.color_targets {
            set_layout(attachment, TextureLayout::RenderTarget);
        }
        if let Some(depth) = &framebuffer.depth_target {
            set_layout(depth, TextureLayout::DepthStencilReadWrite);
        }

        if load_op == LoadOp::Clear {
            let attachment_count = framebuffer.color_targets.len() + framebuffer.depth_target.iter().count();
            if clear_values.len() != attachment_count {
                self.violation(format!(
                    "clearing render pass got {} clear values for {} attachments",
                    clear_values.len(),
                    attachment_count
                ));
            } else {
                let full = (0i32, 0i32, framebuffer.width, framebuffer.height);
                for (attachment, value) in framebuffer.attachments().zip(clear_values) {
                    let texel = match value {
                        ClearValue::Color(color) => encode_color(attachment.texture.info.format, color),
                        ClearValue::DepthStencil(value) => encode_depth_stencil(attachment.texture.info.format, value),
                    };
                    fill(attachment, &texel, full);
                }
            }
        }

        self.framebuffer = Some(framebuffer.clone());
    }

    fn clear_attachment(&self, attachment: &ClearAttachment, rect: &ClearRect) {
        let Some(framebuffer) = self.framebuffer.as_ref() else {
            self.violation("clear attachment recorded outside of a render pass");
            return;
        };
        let area = (rect.x, rect.y, rect.width, rect.height);
        match attachment {
            ClearAttachment::Color { index, color } => match framebuffer.color_targets.get(*index as usize) {
                Some(target) => fill(target, &encode_color(target.texture.info.format, color), area),
                None => self.violation(format!("cleared color attachment {} which does not exist", index)),
            },
            ClearAttachment::DepthStencil(value) => match &framebuffer.depth_target {
                Some(target) => fill(target, &encode_depth_stencil(target.texture.info.format, value), area),
                None => self.violation("cleared the depth attachment of a framebuffer without one"),
            },
        }
    }

    fn bind_resource_sets(&mut self, bind_point: BindPoint, first_set: u32, sets: &[Arc<ResourceSetStorage>]) {
        for set in sets {
            if let Some(destroyed) = set.find_destroyed() {
                self.violation(format!("bind resource sets used {} after it was destroyed", destroyed));
            }
        }
        let state = self.bind_state(bind_point);
        if state.pipeline.is_none() {
            self.violation("bound resource sets without a pipeline");
            return;
        }
        let state = self.bind_state(bind_point);
        let end = first_set as usize + sets.len();
        if state.sets.len() < end {
            state.sets.resize(end, None);
        }
        for (slot, set) in state.sets[first_set as usize..end].iter_mut().zip(sets) {
            *slot = Some(set.clone());
        }
    }

    fn validate_bindings(&self, bind_point: BindPoint, operation: &str) {
        let state = match bind_point {
            BindPoint::Graphics => &self.graphics,
            BindPoint::Compute => &self.compute,
        };
        let Some(pipeline) = state.pipeline.as_ref() else {
            self.violation(format!("{} without a bound pipeline", operation));
            return;
        };
        self.check_alive(&pipeline.liveness, operation);
        for slot in 0..pipeline.info.resource_set_count as usize {
            match state.sets.get(slot).and_then(|set| set.as_ref()) {
                Some(set) => {
                    if let Some(destroyed) = set.find_destroyed() {
                        self.violation(format!("{} used {} after it was destroyed", operation, destroyed));
                    }
                }
                None => self.violation(format!("{} with nothing bound to resource set {}", operation, slot)),
            }
        }
    }

    fn validate_draw(&self, indirect: Option<&Arc<BufferStorage>>) {
        match self.framebuffer.as_ref() {
            Some(framebuffer) => {
                self.check_alive(&framebuffer.liveness, "draw");
                for attachment in framebuffer.attachments() {
                    self.check_alive(&attachment.texture.liveness, "draw");
                }
            }
            None => self.violation("draw recorded outside of a render pass"),
        }
        self.validate_bindings(BindPoint::Graphics, "draw");
        if let Some(buffer) = indirect {
            self.check_alive(&buffer.liveness, "indirect draw");
        }
    }

    fn validate_dispatch(&self, indirect: Option<&Arc<BufferStorage>>) {
        self.check_outside_pass("dispatch");
        self.validate_bindings(BindPoint::Compute, "dispatch");
        if let Some(buffer) = indirect {
            self.check_alive(&buffer.liveness, "indirect dispatch");
        }
    }

    fn copy_buffer(&self, src: &Arc<BufferStorage>, dst: &Arc<BufferStorage>, region: &BufferCopyRegion) {
        self.check_outside_pass("buffer copy");
        self.check_alive(&src.liveness, "buffer copy");
        self.check_alive(&dst.liveness, "buffer copy");
        if region.src_offset + region.size > src.info.size || region.dst_offset + region.size > dst.info.size {
            self.violation(format!("buffer copy of {} bytes out of bounds", region.size));
            return;
        }
        let size = region.size as usize;
        let src_offset = region.src_offset as usize;
        let dst_offset = region.dst_offset as usize;
        if Arc::ptr_eq(src, dst) {
            src.data.lock().copy_within(src_offset..src_offset + size, dst_offset);
        } else {
            let src_data = src.data.lock();
            dst.data.lock()[dst_offset..dst_offset + size].copy_from_slice(&src_data[src_offset..src_offset + size]);
        }
    }

    fn check_layout(&self, texture: &TextureStorage, subresource: u32, expected: TextureLayout, operation: &str) {
        let layout = texture.layouts.lock().get(subresource as usize).copied();
        if layout != Some(expected) {
            self.violation(format!(
                "{} expected {} subresource {} in layout {:?}, found {:?}",
                operation,
                texture.liveness.describe(),
                subresource,
                expected,
                layout
            ));
        }
    }

    fn copy_texture(&self, src: &Arc<TextureStorage>, dst: &Arc<TextureStorage>, region: &TextureCopyRegion) {
        self.check_outside_pass("texture copy");
        self.check_alive(&src.liveness, "texture copy");
        self.check_alive(&dst.liveness, "texture copy");
        let element_size = src.info.format.element_size() as usize;
        if element_size != dst.info.format.element_size() as usize {
            self.violation("texture copy between formats of different sizes");
            return;
        }

        for layer in 0..region.layer_count {
            let src_index = location_index(src, &region.src, layer);
            let dst_index = location_index(dst, &region.dst, layer);
            self.check_layout(src, src_index, TextureLayout::CopySrc, "texture copy");
            self.check_layout(dst, dst_index, TextureLayout::CopyDst, "texture copy");

            let src_mip = src.mip_of(src_index);
            let dst_mip = dst.mip_of(dst_index);
            if !region_fits(src, src_mip, &region.src.offset, &region.extent)
                || !region_fits(dst, dst_mip, &region.dst.offset, &region.extent)
            {
                self.violation("texture copy out of bounds");
                return;
            }

            let (Some(src_subresource), Some(dst_subresource)) =
                (src.subresources.get(src_index as usize), dst.subresources.get(dst_index as usize))
            else {
                self.violation("texture copy addressed a subresource that does not exist");
                return;
            };
            let src_data = src_subresource.lock().clone();
            let mut dst_data = dst_subresource.lock();

            let row_length = region.extent.width as usize * element_size;
            let (src_row_pitch, src_slice_pitch) = (src.row_pitch(src_mip), src.slice_pitch(src_mip));
            let (dst_row_pitch, dst_slice_pitch) = (dst.row_pitch(dst_mip), dst.slice_pitch(dst_mip));
            for z in 0..region.extent.depth as usize {
                for y in 0..region.extent.height as usize {
                    let src_start = (region.src.offset.z as usize + z) * src_slice_pitch
                        + (region.src.offset.y as usize + y) * src_row_pitch
                        + region.src.offset.x as usize * element_size;
                    let dst_start = (region.dst.offset.z as usize + z) * dst_slice_pitch
                        + (region.dst.offset.y as usize + y) * dst_row_pitch
                        + region.dst.offset.x as usize * element_size;
                    dst_data[dst_start..dst_start + row_length].copy_from_slice(&src_data[src_start..src_start + row_length]);
                }
            }
        }
    }

    fn resolve_texture(&self, src: &Arc<TextureStorage>, dst: &Arc<TextureStorage>) {
        self.check_outside_pass("resolve");
        self.check_alive(&src.liveness, "resolve");
        self.check_alive(&dst.liveness, "resolve");
        self.check_layout(src, 0, TextureLayout::ResolveSrc, "resolve");
        self.check_layout(dst, 0, TextureLayout::ResolveDst, "resolve");

        // Every sample holds the same value, resolving is a plain copy.
        let src_data = src.subresources[0].lock().clone();
        let mut dst_data = dst.subresources[0].lock();
        if src_data.len() != dst_data.len() {
            self.violation("resolve between textures of different sizes");
            return;
        }
        dst_data.copy_from_slice(&src_data);
    }
}

fn set_layout(attachment: &AttachmentStorage, layout: TextureLayout) {
    if let Some(current) = attachment.texture.layouts.lock().get_mut(attachment.subresource() as usize) {
        *current = layout;
    }
}

fn location_index(texture: &TextureStorage, location: &TextureCopyLocation, layer: u32) -> u32 {
    location.staging_image.unwrap_or_else(|| {
        texture
            .info
            .subresource_index(location.subresource.mip_level, location.subresource.array_layer + layer)
    })
}

fn region_fits(texture: &TextureStorage, mip_level: u32, offset: &Offset3D, extent: &Extent3D) -> bool {
    let mip_extent = texture.info.mip_extent(mip_level);
    offset.x + extent.width <= mip_extent.width
        && offset.y + extent.height <= mip_extent.height
        && offset.z + extent.depth <= mip_extent.depth
}

/// Fills the clipped `(x, y, width, height)` area of the attachment's first depth slice.
fn fill(attachment: &AttachmentStorage, texel: &[u8], area: (i32, i32, u32, u32)) {
    let texture = &attachment.texture;
    let subresource = attachment.subresource();
    let mip_extent = texture.info.mip_extent(texture.mip_of(subresource));
    let x_start = area.0.max(0) as u32;
    let y_start = area.1.max(0) as u32;
    let x_end = ((area.0 as i64 + area.2 as i64).max(0) as u32).min(mip_extent.width);
    let y_end = ((area.1 as i64 + area.3 as i64).max(0) as u32).min(mip_extent.height);
    if texel.is_empty() || x_start >= x_end || y_start >= y_end {
        return;
    }

    let Some(storage) = texture.subresources.get(subresource as usize) else {
        return;
    };
    let mut data = storage.lock();
    let row_pitch = texture.row_pitch(texture.mip_of(subresource));
    for y in y_start..y_end {
        let row = y as usize * row_pitch;
        for x in x_start..x_end {
            let start = row + x as usize * texel.len();
            data[start..start + texel.len()].copy_from_slice(texel);
        }
    }
}
