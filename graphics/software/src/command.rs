use std::sync::Arc;

use emberline_core::gpu::*;
use smallvec::SmallVec;

use crate::buffer::BufferStorage;
use crate::descriptor::ResourceSetStorage;
use crate::framebuffer::FramebufferStorage;
use crate::pipeline::PipelineStorage;
use crate::sync::EventStorage;
use crate::texture::TextureStorage;
use crate::SoftwareBackend;

#[derive(Clone)]
pub(crate) enum Command {
    BeginRenderPass {
        framebuffer: Arc<FramebufferStorage>,
        load_op: LoadOp,
        clear_values: SmallVec<[ClearValue; 5]>,
    },
    EndRenderPass,
    ClearAttachment {
        attachment: ClearAttachment,
        rect: ClearRect,
    },
    RenderPassBarrier,
    SetEvent(Arc<EventStorage>),
    BindPipeline(Arc<PipelineStorage>),
    BindResourceSets {
        bind_point: BindPoint,
        first_set: u32,
        sets: SmallVec<[Arc<ResourceSetStorage>; 4]>,
    },
    SetVertexBuffer {
        index: u32,
        buffer: Arc<BufferStorage>,
    },
    SetIndexBuffer(Arc<BufferStorage>),
    SetViewport {
        index: u32,
        viewport: Viewport,
    },
    SetScissor {
        index: u32,
        scissor: Scissor,
    },
    Draw,
    DrawIndexed,
    DrawIndirect(Arc<BufferStorage>),
    DrawIndexedIndirect(Arc<BufferStorage>),
    Dispatch,
    DispatchIndirect(Arc<BufferStorage>),
    CopyBuffer {
        src: Arc<BufferStorage>,
        dst: Arc<BufferStorage>,
        region: BufferCopyRegion,
    },
    CopyTexture {
        src: Arc<TextureStorage>,
        dst: Arc<TextureStorage>,
        region: TextureCopyRegion,
    },
    TransitionTexture {
        texture: Arc<TextureStorage>,
        range: BarrierTextureRange,
        layout: TextureLayout,
    },
    ResolveTexture {
        src: Arc<TextureStorage>,
        dst: Arc<TextureStorage>,
    },
}

/// What the device executed, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutedCommand {
    BeginRenderPass { load_op: LoadOp, clear_value_count: u32 },
    EndRenderPass,
    ClearAttachment(ClearAttachment),
    RenderPassBarrier,
    SetEvent,
    BindPipeline(BindPoint),
    BindResourceSets { bind_point: BindPoint, first_set: u32, count: u32 },
    SetVertexBuffer { index: u32 },
    SetIndexBuffer,
    SetViewport { index: u32 },
    SetScissor { index: u32, scissor: Scissor },
    Draw,
    DrawIndexed,
    DrawIndirect,
    DrawIndexedIndirect,
    Dispatch,
    DispatchIndirect,
    CopyBuffer { size: u64 },
    CopyTexture,
    TransitionTexture { layout: TextureLayout },
    ResolveTexture,
}

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub(crate) enum SoftwareCommandBufferState {
    Ready,
    Recording,
    Finished,
}

pub struct SoftwareCommandBuffer {
    commands: Vec<Command>,
    state: SoftwareCommandBufferState,
    in_render_pass: bool,
}

impl SoftwareCommandBuffer {
    pub(crate) fn new() -> Self {
        Self {
            commands: Vec::new(),
            state: SoftwareCommandBufferState::Ready,
            in_render_pass: false,
        }
    }

    pub(crate) fn state(&self) -> SoftwareCommandBufferState {
        self.state
    }

    pub(crate) fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn push(&mut self, command: Command) {
        debug_assert_eq!(self.state, SoftwareCommandBufferState::Recording);
        self.commands.push(command);
    }
}

impl CommandBuffer<SoftwareBackend> for SoftwareCommandBuffer {
    unsafe fn reset(&mut self) {
        self.commands.clear();
        self.in_render_pass = false;
        self.state = SoftwareCommandBufferState::Ready;
    }

    unsafe fn begin(&mut self) {
        assert_eq!(self.state, SoftwareCommandBufferState::Ready);
        self.state = SoftwareCommandBufferState::Recording;
    }

    unsafe fn finish(&mut self) {
        assert_eq!(self.state, SoftwareCommandBufferState::Recording);
        debug_assert!(!self.in_render_pass);
        self.state = SoftwareCommandBufferState::Finished;
    }

    unsafe fn begin_render_pass(
        &mut self,
        framebuffer: &crate::SoftwareFramebuffer,
        load_op: LoadOp,
        clear_values: &[ClearValue],
    ) {
        debug_assert!(!self.in_render_pass);
        self.in_render_pass = true;
        self.push(Command::BeginRenderPass {
            framebuffer: framebuffer.storage().clone(),
            load_op,
            clear_values: clear_values.iter().copied().collect(),
        });
    }

    unsafe fn end_render_pass(&mut self) {
        debug_assert!(self.in_render_pass);
        self.in_render_pass = false;
        self.push(Command::EndRenderPass);
    }

    unsafe fn clear_attachment(&mut self, attachment: &ClearAttachment, rect: &ClearRect) {
        self.push(Command::ClearAttachment {
            attachment: *attachment,
            rect: *rect,
        });
    }

    unsafe fn render_pass_barrier(&mut self) {
        self.push(Command::RenderPassBarrier);
    }

    unsafe fn set_event(&mut self, event: &crate::SoftwareEvent, _sync: BarrierSync) {
        self.push(Command::SetEvent(event.storage().clone()));
    }

    unsafe fn bind_pipeline(&mut self, pipeline: &crate::SoftwarePipeline) {
        self.push(Command::BindPipeline(pipeline.storage().clone()));
    }

    unsafe fn bind_resource_sets(
        &mut self,
        bind_point: BindPoint,
        _pipeline: &crate::SoftwarePipeline,
        first_set: u32,
        sets: &[&crate::SoftwareResourceSet],
    ) {
        self.push(Command::BindResourceSets {
            bind_point,
            first_set,
            sets: sets.iter().map(|set| set.storage().clone()).collect(),
        });
    }

    unsafe fn set_vertex_buffer(&mut self, index: u32, buffer: &crate::SoftwareBuffer, _offset: u64) {
        self.push(Command::SetVertexBuffer {
            index,
            buffer: buffer.storage().clone(),
        });
    }

    unsafe fn set_index_buffer(&mut self, buffer: &crate::SoftwareBuffer, _offset: u64, _format: IndexFormat) {
        self.push(Command::SetIndexBuffer(buffer.storage().clone()));
    }

    unsafe fn set_viewport(&mut self, index: u32, viewport: &Viewport) {
        self.push(Command::SetViewport {
            index,
            viewport: *viewport,
        });
    }

    unsafe fn set_scissor(&mut self, index: u32, scissor: &Scissor) {
        self.push(Command::SetScissor {
            index,
            scissor: *scissor,
        });
    }

    unsafe fn draw(&mut self, _vertex_count: u32, _instance_count: u32, _first_vertex: u32, _first_instance: u32) {
        self.push(Command::Draw);
    }

    unsafe fn draw_indexed(
        &mut self,
        _index_count: u32,
        _instance_count: u32,
        _first_index: u32,
        _vertex_offset: i32,
        _first_instance: u32,
    ) {
        self.push(Command::DrawIndexed);
    }

    unsafe fn draw_indirect(&mut self, buffer: &crate::SoftwareBuffer, _offset: u64, _draw_count: u32, _stride: u32) {
        self.push(Command::DrawIndirect(buffer.storage().clone()));
    }

    unsafe fn draw_indexed_indirect(
        &mut self,
        buffer: &crate::SoftwareBuffer,
        _offset: u64,
        _draw_count: u32,
        _stride: u32,
    ) {
        self.push(Command::DrawIndexedIndirect(buffer.storage().clone()));
    }

    unsafe fn dispatch(&mut self, _group_count_x: u32, _group_count_y: u32, _group_count_z: u32) {
        self.push(Command::Dispatch);
    }

    unsafe fn dispatch_indirect(&mut self, buffer: &crate::SoftwareBuffer, _offset: u64) {
        self.push(Command::DispatchIndirect(buffer.storage().clone()));
    }

    unsafe fn copy_buffer(&mut self, src: &crate::SoftwareBuffer, dst: &crate::SoftwareBuffer, region: &BufferCopyRegion) {
        self.push(Command::CopyBuffer {
            src: src.storage().clone(),
            dst: dst.storage().clone(),
            region: *region,
        });
    }

    unsafe fn copy_texture(
        &mut self,
        src: &crate::SoftwareTexture,
        dst: &crate::SoftwareTexture,
        region: &TextureCopyRegion,
    ) {
        self.push(Command::CopyTexture {
            src: src.storage().clone(),
            dst: dst.storage().clone(),
            region: *region,
        });
    }

    unsafe fn transition_texture(
        &mut self,
        texture: &crate::SoftwareTexture,
        range: &BarrierTextureRange,
        layout: TextureLayout,
    ) {
        self.push(Command::TransitionTexture {
            texture: texture.storage().clone(),
            range: *range,
            layout,
        });
    }

    unsafe fn resolve_texture(&mut self, src: &crate::SoftwareTexture, dst: &crate::SoftwareTexture) {
        self.push(Command::ResolveTexture {
            src: src.storage().clone(),
            dst: dst.storage().clone(),
        });
    }
}
