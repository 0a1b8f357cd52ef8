use std::sync::Arc;

use log::{
    trace,
    warn,
};
use smallvec::SmallVec;

use super::gpu::Buffer as _;
use super::gpu::CommandBuffer as _;
use super::gpu::{
    BarrierSync,
    BarrierTextureRange,
    BindPoint,
    BufferCopyRegion,
    ClearColor,
    DepthStencilValue,
    Extent3D,
    GPUError,
    IndexFormat,
    Offset3D,
    Scissor,
    TextureCopyLocation,
    TextureCopyRegion,
    TextureLayout,
    TextureSubresource,
    Viewport,
};
use super::*;

#[derive(Debug, Clone, Default)]
pub struct CommandRecorderInfo {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandRecorderState {
    Initial,
    Recording,
    Ended,
}

/// Source and destination of a texture to texture copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureCopy {
    pub src_offset: Offset3D,
    pub src_mip_level: u32,
    pub src_base_array_layer: u32,
    pub dst_offset: Offset3D,
    pub dst_mip_level: u32,
    pub dst_base_array_layer: u32,
    pub extent: Extent3D,
    pub layer_count: u32,
}

impl TextureCopy {
    /// Copies all of mip 0 of a single layer.
    pub fn whole_texture(extent: Extent3D) -> Self {
        Self {
            src_offset: Offset3D::default(),
            src_mip_level: 0,
            src_base_array_layer: 0,
            dst_offset: Offset3D::default(),
            dst_mip_level: 0,
            dst_base_array_layer: 0,
            extent,
            layer_count: 1,
        }
    }
}

struct Recording<B: GPUBackend> {
    command_buffer: B::CommandBuffer,
    record: SubmissionRecord<B>,
}

enum RecorderState<B: GPUBackend> {
    Initial,
    Recording(Recording<B>),
    Ended(Recording<B>),
}

/// Records commands into a native command buffer.
///
/// Render passes are begun and ended on demand, resource sets are bound in
/// as few native calls as possible and everything a recording uses stays
/// alive until the device has finished executing it. Completion is only
/// ever polled, never waited on.
pub struct CommandRecorder<B: GPUBackend> {
    device: Arc<Device<B>>,
    name: Option<String>,
    state: RecorderState<B>,
    render_pass: RenderPassController<B>,
    graphics_pipeline: Option<Arc<Pipeline<B>>>,
    compute_pipeline: Option<Arc<Pipeline<B>>>,
    graphics_slots: BindingSlots<B>,
    compute_slots: BindingSlots<B>,
    scissors: SmallVec<[Option<Scissor>; 4]>,
    records: SubmissionRecords<B>,
    staging: StagingBufferPool<B>,
}

impl<B: GPUBackend> CommandRecorder<B> {
    pub(super) fn new(device: &Arc<Device<B>>, info: CommandRecorderInfo) -> Self {
        Self {
            device: device.clone(),
            name: info.name,
            state: RecorderState::Initial,
            render_pass: RenderPassController::new(),
            graphics_pipeline: None,
            compute_pipeline: None,
            graphics_slots: BindingSlots::new(BindPoint::Graphics),
            compute_slots: BindingSlots::new(BindPoint::Compute),
            scissors: SmallVec::new(),
            records: SubmissionRecords::new(),
            staging: StagingBufferPool::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn state(&self) -> CommandRecorderState {
        match self.state {
            RecorderState::Initial => CommandRecorderState::Initial,
            RecorderState::Recording(_) => CommandRecorderState::Recording,
            RecorderState::Ended(_) => CommandRecorderState::Ended,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording(_))
    }

    /// Submitted recordings whose completion has not been observed yet.
    pub fn in_flight_submissions(&self) -> usize {
        self.records.in_flight()
    }

    /// Completion events created so far, the high-water mark of
    /// recordings in flight at the same time.
    pub fn submission_event_count(&self) -> usize {
        self.records.event_count()
    }

    /// Sizes of all staging buffers owned by this recorder.
    pub fn staging_buffer_sizes(&self) -> Vec<u64> {
        self.staging.capacities()
    }

    pub fn staging_buffers_in_use(&self) -> usize {
        self.staging.in_use_count()
    }

    /// Number of distinct resources captured by the current recording.
    pub fn captured_resource_count(&self) -> usize {
        match &self.state {
            RecorderState::Recording(recording) | RecorderState::Ended(recording) => recording.record.captured_count(),
            RecorderState::Initial => 0,
        }
    }

    fn recording_mut(state: &mut RecorderState<B>) -> Result<&mut Recording<B>, CommandError> {
        match state {
            RecorderState::Recording(recording) => Ok(recording),
            _ => Err(CommandError::NotRecording),
        }
    }

    pub fn begin(&mut self) -> Result<(), CommandError> {
        match std::mem::replace(&mut self.state, RecorderState::Initial) {
            RecorderState::Recording(recording) => {
                self.state = RecorderState::Recording(recording);
                return Err(CommandError::AlreadyRecording);
            }
            RecorderState::Ended(recording) => {
                trace!("Discarding unsubmitted recording of {:?}", self.name);
                self.records.recycle_command_buffer(recording.command_buffer);
                self.records.discard(recording.record);
                self.staging.discard_recording();
            }
            RecorderState::Initial => {}
        }

        self.release_bindings();
        let device = self.device.handle();
        self.records.sweep(device);
        self.device.flush_deferred_destruction();

        let record = self.records.acquire(device)?;
        let mut command_buffer = match self.records.command_buffer(device) {
            Ok(command_buffer) => command_buffer,
            Err(error) => {
                self.records.discard(record);
                return Err(error.into());
            }
        };
        unsafe {
            command_buffer.begin();
        }

        self.staging.reclaim(device);
        self.state = RecorderState::Recording(Recording { command_buffer, record });
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), CommandError> {
        let mut recording = match std::mem::replace(&mut self.state, RecorderState::Initial) {
            RecorderState::Recording(recording) => recording,
            other => {
                self.state = other;
                return Err(CommandError::NotRecording);
            }
        };

        unsafe {
            self.render_pass.finish(&mut recording.command_buffer);
            recording
                .command_buffer
                .set_event(recording.record.event(), BarrierSync::all());
            recording.command_buffer.finish();
        }
        self.release_bindings();
        self.state = RecorderState::Ended(recording);
        Ok(())
    }

    /// Drops the bound framebuffer, pipelines and resource sets. The ended
    /// recording has captured them, so a handle the application dropped can
    /// be destroyed as soon as its submissions complete.
    fn release_bindings(&mut self) {
        self.render_pass.reset();
        self.graphics_pipeline = None;
        self.compute_pipeline = None;
        self.graphics_slots.reset(0);
        self.compute_slots.reset(0);
        self.scissors.clear();
    }

    pub(super) fn ended_command_buffer(&self) -> Result<&B::CommandBuffer, CommandError> {
        match &self.state {
            RecorderState::Ended(recording) => Ok(&recording.command_buffer),
            _ => Err(CommandError::NotEnded),
        }
    }

    /// Hands the ended recording to completion tracking, its resources stay
    /// referenced until its event fires.
    pub(super) fn on_submitted(&mut self) {
        if let RecorderState::Ended(recording) = std::mem::replace(&mut self.state, RecorderState::Initial) {
            self.records.archive(recording.record, recording.command_buffer);
            self.staging.on_submitted();
            trace!(
                "Submitted recording of {:?}, {} in flight",
                self.name,
                self.records.in_flight()
            );
        }
    }

    pub fn set_framebuffer(&mut self, framebuffer: &Arc<Framebuffer<B>>) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            self.render_pass
                .set_framebuffer(&mut recording.command_buffer, framebuffer);
        }
        let scissor_count = framebuffer.color_target_count().max(1) as usize;
        if self.scissors.len() < scissor_count {
            self.scissors.resize(scissor_count, None);
        }
        recording.record.capture(framebuffer);
        Ok(())
    }

    pub fn clear_color_target(&mut self, index: u32, color: ClearColor) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            self.render_pass
                .clear_color_target(&mut recording.command_buffer, index, color)
        }
    }

    pub fn clear_depth_stencil(&mut self, depth: f32, stencil: u8) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            self.render_pass.clear_depth_stencil(
                &mut recording.command_buffer,
                DepthStencilValue { depth, stencil },
            )
        }
    }

    pub fn set_pipeline(&mut self, pipeline: &Arc<Pipeline<B>>) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        let (current, slots) = match pipeline.bind_point() {
            BindPoint::Graphics => (&mut self.graphics_pipeline, &mut self.graphics_slots),
            BindPoint::Compute => (&mut self.compute_pipeline, &mut self.compute_slots),
        };
        if current.as_ref().is_some_and(|current| Arc::ptr_eq(current, pipeline)) {
            return Ok(());
        }

        unsafe {
            recording.command_buffer.bind_pipeline(pipeline.handle());
        }
        slots.reset(pipeline.resource_set_count());
        *current = Some(pipeline.clone());
        recording.record.capture(pipeline);
        Ok(())
    }

    pub fn set_graphics_resource_set(&mut self, slot: u32, set: &Arc<ResourceSet<B>>) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        if self.graphics_slots.set(slot, set)? {
            recording.record.capture(set);
        }
        Ok(())
    }

    pub fn set_compute_resource_set(&mut self, slot: u32, set: &Arc<ResourceSet<B>>) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        if self.compute_slots.set(slot, set)? {
            recording.record.capture(set);
        }
        Ok(())
    }

    pub fn set_vertex_buffer(&mut self, index: u32, buffer: &Arc<Buffer<B>>, offset: u64) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording
                .command_buffer
                .set_vertex_buffer(index, buffer.handle(), offset);
        }
        recording.record.capture(buffer);
        Ok(())
    }

    pub fn set_index_buffer(
        &mut self,
        buffer: &Arc<Buffer<B>>,
        offset: u64,
        format: IndexFormat,
    ) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording
                .command_buffer
                .set_index_buffer(buffer.handle(), offset, format);
        }
        recording.record.capture(buffer);
        Ok(())
    }

    pub fn set_viewport(&mut self, index: u32, viewport: &Viewport) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording.command_buffer.set_viewport(index, viewport);
        }
        Ok(())
    }

    pub fn set_scissor_rect(&mut self, index: u32, x: i32, y: i32, width: u32, height: u32) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        Self::set_scissor_cached(
            &mut self.scissors,
            &mut recording.command_buffer,
            index,
            Scissor { x, y, width, height },
        );
        Ok(())
    }

    fn set_scissor_cached(
        scissors: &mut SmallVec<[Option<Scissor>; 4]>,
        command_buffer: &mut B::CommandBuffer,
        index: u32,
        scissor: Scissor,
    ) {
        let index_usize = index as usize;
        if scissors.len() <= index_usize {
            scissors.resize(index_usize + 1, None);
        }
        if scissors[index_usize] != Some(scissor) {
            scissors[index_usize] = Some(scissor);
            unsafe {
                command_buffer.set_scissor(index, &scissor);
            }
        }
    }

    fn prepare_draw(&mut self) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        let pipeline = self
            .graphics_pipeline
            .as_ref()
            .ok_or(CommandError::NoPipeline(BindPoint::Graphics))?;

        unsafe {
            self.render_pass
                .ensure_active(&mut recording.command_buffer)?;
            self.graphics_slots
                .flush(&mut recording.command_buffer, pipeline.handle());
        }

        if !pipeline.scissor_test_enabled() {
            if let Some(framebuffer) = self.render_pass.framebuffer() {
                let full = Scissor {
                    x: 0,
                    y: 0,
                    width: framebuffer.width(),
                    height: framebuffer.height(),
                };
                for index in 0..self.scissors.len() as u32 {
                    Self::set_scissor_cached(&mut self.scissors, &mut recording.command_buffer, index, full);
                }
            }
        }
        Ok(())
    }

    fn prepare_dispatch(&mut self) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        let pipeline = self
            .compute_pipeline
            .as_ref()
            .ok_or(CommandError::NoPipeline(BindPoint::Compute))?;

        unsafe {
            self.render_pass
                .ensure_inactive(&mut recording.command_buffer);
            self.compute_slots
                .flush(&mut recording.command_buffer, pipeline.handle());
        }
        Ok(())
    }

    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<(), CommandError> {
        self.prepare_draw()?;
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording
                .command_buffer
                .draw(vertex_count, instance_count, first_vertex, first_instance);
        }
        Ok(())
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<(), CommandError> {
        self.prepare_draw()?;
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording.command_buffer.draw_indexed(
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
        Ok(())
    }

    pub fn draw_indirect(
        &mut self,
        buffer: &Arc<Buffer<B>>,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), CommandError> {
        self.prepare_draw()?;
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording
                .command_buffer
                .draw_indirect(buffer.handle(), offset, draw_count, stride);
        }
        recording.record.capture(buffer);
        Ok(())
    }

    pub fn draw_indexed_indirect(
        &mut self,
        buffer: &Arc<Buffer<B>>,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), CommandError> {
        self.prepare_draw()?;
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording
                .command_buffer
                .draw_indexed_indirect(buffer.handle(), offset, draw_count, stride);
        }
        recording.record.capture(buffer);
        Ok(())
    }

    pub fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<(), CommandError> {
        self.prepare_dispatch()?;
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording
                .command_buffer
                .dispatch(group_count_x, group_count_y, group_count_z);
        }
        Ok(())
    }

    pub fn dispatch_indirect(&mut self, buffer: &Arc<Buffer<B>>, offset: u64) -> Result<(), CommandError> {
        self.prepare_dispatch()?;
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            recording
                .command_buffer
                .dispatch_indirect(buffer.handle(), offset);
        }
        recording.record.capture(buffer);
        Ok(())
    }

    pub fn copy_buffer(
        &mut self,
        src: &Arc<Buffer<B>>,
        src_offset: u64,
        dst: &Arc<Buffer<B>>,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        if size == 0 {
            return Ok(());
        }
        unsafe {
            self.render_pass
                .ensure_inactive(&mut recording.command_buffer);
            recording.command_buffer.copy_buffer(
                src.handle(),
                dst.handle(),
                &BufferCopyRegion {
                    src_offset,
                    dst_offset,
                    size,
                },
            );
        }
        recording.record.capture(src);
        recording.record.capture(dst);
        Ok(())
    }

    pub fn copy_texture(
        &mut self,
        src: &Arc<Texture<B>>,
        dst: &Arc<Texture<B>>,
        copy: &TextureCopy,
    ) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        let src_info = src.info();
        let dst_info = dst.info();
        let src_is_staging = src_info.is_staging();
        let dst_is_staging = dst_info.is_staging();
        if (src_is_staging || dst_is_staging) && copy.layer_count > 1 {
            // Staging textures keep one image per subresource, this would take one copy per layer.
            return Err(CommandError::UnsupportedStagingLayerCopy {
                layer_count: copy.layer_count,
            });
        }

        let location = |is_staging: bool, subresource_index: u32, mip_level: u32, array_layer: u32, offset: Offset3D| {
            if is_staging {
                TextureCopyLocation {
                    staging_image: Some(subresource_index),
                    subresource: TextureSubresource {
                        mip_level: 0,
                        array_layer: 0,
                    },
                    offset,
                }
            } else {
                TextureCopyLocation {
                    staging_image: None,
                    subresource: TextureSubresource { mip_level, array_layer },
                    offset,
                }
            }
        };
        let region = TextureCopyRegion {
            src: location(
                src_is_staging,
                src_info.subresource_index(copy.src_mip_level, copy.src_base_array_layer),
                copy.src_mip_level,
                copy.src_base_array_layer,
                copy.src_offset,
            ),
            dst: location(
                dst_is_staging,
                dst_info.subresource_index(copy.dst_mip_level, copy.dst_base_array_layer),
                copy.dst_mip_level,
                copy.dst_base_array_layer,
                copy.dst_offset,
            ),
            extent: copy.extent,
            layer_count: copy.layer_count,
        };

        unsafe {
            self.render_pass
                .ensure_inactive(&mut recording.command_buffer);
            recording.command_buffer.transition_texture(
                src.handle(),
                &BarrierTextureRange {
                    base_mip_level: copy.src_mip_level,
                    mip_level_length: 1,
                    base_array_layer: copy.src_base_array_layer,
                    array_layer_length: copy.layer_count,
                },
                TextureLayout::CopySrc,
            );
            recording.command_buffer.transition_texture(
                dst.handle(),
                &BarrierTextureRange {
                    base_mip_level: copy.dst_mip_level,
                    mip_level_length: 1,
                    base_array_layer: copy.dst_base_array_layer,
                    array_layer_length: copy.layer_count,
                },
                TextureLayout::CopyDst,
            );
            recording
                .command_buffer
                .copy_texture(src.handle(), dst.handle(), &region);
        }
        recording.record.capture(src);
        recording.record.capture(dst);
        Ok(())
    }

    pub fn resolve_texture(&mut self, src: &Arc<Texture<B>>, dst: &Arc<Texture<B>>) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        unsafe {
            self.render_pass
                .ensure_inactive(&mut recording.command_buffer);
            recording.command_buffer.transition_texture(
                src.handle(),
                &BarrierTextureRange::default(),
                TextureLayout::ResolveSrc,
            );
            recording.command_buffer.transition_texture(
                dst.handle(),
                &BarrierTextureRange::default(),
                TextureLayout::ResolveDst,
            );
            recording
                .command_buffer
                .resolve_texture(src.handle(), dst.handle());
        }
        recording.record.capture(src);
        recording.record.capture(dst);
        Ok(())
    }

    /// Writes `data` to `buffer` at `offset` through a pooled staging buffer.
    pub fn update_buffer(&mut self, buffer: &Arc<Buffer<B>>, offset: u64, data: &[u8]) -> Result<(), CommandError> {
        let recording = Self::recording_mut(&mut self.state)?;
        if data.is_empty() {
            return Ok(());
        }
        let size = data.len() as u64;
        let buffer_size = buffer.info().size;
        if offset.checked_add(size).map_or(true, |end| end > buffer_size) {
            return Err(CommandError::BufferRangeOutOfBounds {
                offset,
                length: size,
                size: buffer_size,
            });
        }

        let token = self.staging.acquire(self.device.handle(), size)?;
        unsafe {
            let ptr = token
                .buffer()
                .map(0, size, false)
                .ok_or(GPUError::Unsupported("staging buffer is not host visible"))?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr as *mut u8, data.len());
            token.buffer().unmap(0, size, true);

            self.render_pass
                .ensure_inactive(&mut recording.command_buffer);
            recording.command_buffer.copy_buffer(
                token.buffer(),
                buffer.handle(),
                &BufferCopyRegion {
                    src_offset: 0,
                    dst_offset: offset,
                    size,
                },
            );
            recording
                .command_buffer
                .set_event(token.available_event(), BarrierSync::COPY);
        }
        recording.record.capture(buffer);
        Ok(())
    }
}

impl<B: GPUBackend> Drop for CommandRecorder<B> {
    fn drop(&mut self) {
        self.release_bindings();
        let device = self.device.handle();
        if let RecorderState::Recording(recording) | RecorderState::Ended(recording) =
            std::mem::replace(&mut self.state, RecorderState::Initial)
        {
            drop(recording.command_buffer);
            self.records.discard(recording.record);
            self.staging.discard_recording();
        }

        self.records.sweep(device);
        if self.records.in_flight() != 0 {
            warn!(
                "Command recorder {:?} dropped with {} submissions in flight, waiting for the device",
                self.name,
                self.records.in_flight()
            );
            self.device.wait_for_idle();
            self.records.sweep(device);
        }
        debug_assert_eq!(self.records.in_flight(), 0);
        self.staging.reclaim(device);
        debug_assert_eq!(self.staging.in_use_count(), 0);
        trace!(
            "Destroying command recorder {:?} with {} records and {} staging buffers",
            self.name,
            self.records.available(),
            self.staging.available_count()
        );
        self.device.flush_deferred_destruction();
    }
}
