use std::sync::Arc;

use log::trace;

use super::gpu::Buffer as _;
use super::gpu::Device as _;
use super::gpu::Queue as _;
use super::gpu::Texture as _;
use super::gpu::{
    BufferInfo,
    GPUError,
    ResourceLayoutInfo,
    SamplerInfo,
    TextureInfo,
    TextureViewInfo,
};
use super::*;

/// Owns the native device and the deferred destruction of everything
/// created from it.
pub struct Device<B: GPUBackend> {
    destroyer: Arc<DeferredDestroyer<B>>,
    device: B::Device,
}

impl<B: GPUBackend> Device<B> {
    pub fn new(device: B::Device) -> Arc<Self> {
        trace!("Creating {} device", B::name());
        Arc::new(Self {
            destroyer: Arc::new(DeferredDestroyer::new()),
            device,
        })
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::Device {
        &self.device
    }

    pub fn create_buffer(&self, info: &BufferInfo, name: Option<&str>) -> Result<Arc<Buffer<B>>, GPUError> {
        Buffer::new(&self.device, &self.destroyer, info, name).map(Arc::new)
    }

    pub fn create_texture(&self, info: &TextureInfo, name: Option<&str>) -> Result<Arc<Texture<B>>, GPUError> {
        Texture::new(&self.device, &self.destroyer, info, name).map(Arc::new)
    }

    pub fn create_texture_view(
        &self,
        texture: &Arc<Texture<B>>,
        info: &TextureViewInfo,
        name: Option<&str>,
    ) -> Result<Arc<TextureView<B>>, GPUError> {
        TextureView::new(&self.device, &self.destroyer, texture, info, name).map(Arc::new)
    }

    pub fn create_sampler(&self, info: &SamplerInfo) -> Result<Arc<Sampler<B>>, GPUError> {
        Sampler::new(&self.device, &self.destroyer, info).map(Arc::new)
    }

    pub fn create_resource_layout(&self, info: &ResourceLayoutInfo) -> Result<Arc<ResourceLayout<B>>, GPUError> {
        ResourceLayout::new(&self.device, &self.destroyer, info).map(Arc::new)
    }

    pub fn create_resource_set(
        &self,
        layout: &Arc<ResourceLayout<B>>,
        bindings: &[ResourceBinding<B>],
    ) -> Result<Arc<ResourceSet<B>>, GPUError> {
        ResourceSet::new(&self.device, &self.destroyer, layout, bindings).map(Arc::new)
    }

    pub fn create_framebuffer(
        &self,
        color_targets: &[FramebufferAttachment<B>],
        depth_target: Option<&FramebufferAttachment<B>>,
    ) -> Result<Arc<Framebuffer<B>>, GPUError> {
        Framebuffer::new(&self.device, &self.destroyer, color_targets, depth_target).map(Arc::new)
    }

    /// Takes ownership of a pipeline that was compiled by the application.
    pub fn import_pipeline(&self, pipeline: B::Pipeline, name: Option<&str>) -> Arc<Pipeline<B>> {
        Arc::new(Pipeline::new(&self.destroyer, pipeline, name))
    }

    pub fn create_command_recorder(self: &Arc<Self>, info: CommandRecorderInfo) -> CommandRecorder<B> {
        CommandRecorder::new(self, info)
    }

    /// Submits an ended recording to the graphics queue.
    pub fn submit_commands(&self, recorder: &mut CommandRecorder<B>) -> Result<(), CommandError> {
        let command_buffer = recorder.ended_command_buffer()?;
        unsafe {
            self.device.graphics_queue().submit(command_buffer)?;
        }
        recorder.on_submitted();
        self.flush_deferred_destruction();
        Ok(())
    }

    /// Blocks until the device has executed everything submitted so far.
    pub fn wait_for_idle(&self) {
        unsafe {
            self.device.wait_for_idle();
        }
        self.flush_deferred_destruction();
    }

    /// Destroys retired resources that are no longer referenced by any
    /// submission. Returns how many were destroyed.
    pub fn flush_deferred_destruction(&self) -> usize {
        self.destroyer.destroy_unused()
    }

    /// Resources that were dropped by the application but still wait for
    /// submissions to complete.
    pub fn retired_resource_count(&self) -> usize {
        self.destroyer.retired_count()
    }

    pub fn write_buffer(&self, buffer: &Buffer<B>, offset: u64, data: &[u8]) -> Result<(), GPUError> {
        check_buffer_range(buffer, offset, data.len() as u64)?;
        if data.is_empty() {
            return Ok(());
        }
        unsafe {
            let ptr = buffer
                .handle()
                .map(offset, data.len() as u64, false)
                .ok_or(GPUError::Unsupported("buffer is not host visible"))?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr as *mut u8, data.len());
            buffer.handle().unmap(offset, data.len() as u64, true);
        }
        Ok(())
    }

    pub fn read_buffer(&self, buffer: &Buffer<B>, offset: u64, length: u64) -> Result<Vec<u8>, GPUError> {
        check_buffer_range(buffer, offset, length)?;
        let mut data = vec![0u8; length as usize];
        if length == 0 {
            return Ok(data);
        }
        unsafe {
            let ptr = buffer
                .handle()
                .map(offset, length, true)
                .ok_or(GPUError::Unsupported("buffer is not host visible"))?;
            std::ptr::copy_nonoverlapping(ptr as *const u8, data.as_mut_ptr(), data.len());
            buffer.handle().unmap(offset, length, false);
        }
        Ok(data)
    }

    /// Reads one subresource of a staging texture, rows tightly packed.
    pub fn read_texture(&self, texture: &Texture<B>, mip_level: u32, array_layer: u32) -> Result<Vec<u8>, GPUError> {
        let info = texture.info();
        let row_length = info.mip_extent(mip_level).width as usize * info.format.element_size() as usize;
        let extent = info.mip_extent(mip_level);
        let mut data = vec![0u8; row_length * extent.height as usize * extent.depth as usize];
        self.access_subresource(texture, mip_level, array_layer, |mapped, row, offset| unsafe {
            std::ptr::copy_nonoverlapping(
                mapped.add(offset),
                data.as_mut_ptr().add(row * row_length),
                row_length,
            );
        })?;
        Ok(data)
    }

    /// Writes one subresource of a staging texture from tightly packed rows.
    pub fn write_texture(
        &self,
        texture: &Texture<B>,
        mip_level: u32,
        array_layer: u32,
        data: &[u8],
    ) -> Result<(), GPUError> {
        let info = texture.info();
        let extent = info.mip_extent(mip_level);
        let row_length = extent.width as usize * info.format.element_size() as usize;
        if data.len() != row_length * extent.height as usize * extent.depth as usize {
            return Err(GPUError::Unsupported("texture data does not match the subresource size"));
        }
        self.access_subresource(texture, mip_level, array_layer, |mapped, row, offset| unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr().add(row * row_length), mapped.add(offset), row_length);
        })
    }

    /// Calls `row_fn` with the mapped pointer, the packed row index and the
    /// byte offset of that row in the mapping.
    fn access_subresource(
        &self,
        texture: &Texture<B>,
        mip_level: u32,
        array_layer: u32,
        mut row_fn: impl FnMut(*mut u8, usize, usize),
    ) -> Result<(), GPUError> {
        let info = texture.info();
        if !info.is_staging() {
            return Err(GPUError::Unsupported("only staging textures can be accessed by the host"));
        }
        if mip_level >= info.mip_levels || array_layer >= info.array_length {
            return Err(GPUError::Unsupported("subresource out of range"));
        }
        let extent = info.mip_extent(mip_level);
        let subresource = info.subresource_index(mip_level, array_layer);
        unsafe {
            let mapped = texture
                .handle()
                .map_subresource(subresource)
                .ok_or(GPUError::Unsupported("texture can not be mapped"))?;
            let mut row = 0usize;
            for z in 0..extent.depth as usize {
                for y in 0..extent.height as usize {
                    row_fn(
                        mapped.data,
                        row,
                        z * mapped.depth_pitch as usize + y * mapped.row_pitch as usize,
                    );
                    row += 1;
                }
            }
            texture.handle().unmap_subresource(subresource);
        }
        Ok(())
    }
}

fn check_buffer_range<B: GPUBackend>(buffer: &Buffer<B>, offset: u64, length: u64) -> Result<(), GPUError> {
    if offset.checked_add(length).map_or(true, |end| end > buffer.info().size) {
        return Err(GPUError::Unsupported("access outside of the buffer"));
    }
    Ok(())
}

impl<B: GPUBackend> Drop for Device<B> {
    fn drop(&mut self) {
        unsafe {
            self.device.wait_for_idle();
        }
        self.destroyer.destroy_unused();
    }
}
