use std::sync::Arc;

use ash::vk;
use log::{
    error,
    info,
};

use emberline_core::gpu::*;

use crate::*;

pub struct VkDevice {
    queue: VkQueue,
    device: Arc<RawVkDevice>,
}

impl VkDevice {
    /// Wraps a logical device that was created with a queue of
    /// `queue_family_index` supporting graphics, compute and transfer work.
    /// The device is destroyed once this and every resource created from it
    /// are dropped, `instance` has to outlive all of them.
    pub unsafe fn new(
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        queue_family_index: u32,
    ) -> Self {
        let raw = Arc::new(RawVkDevice::new(instance, physical_device, device, queue_family_index));
        let properties = raw.instance.get_physical_device_properties(physical_device);
        let name = std::ffi::CStr::from_ptr(properties.device_name.as_ptr());
        info!("Using Vulkan device {:?}", name);
        Self {
            queue: VkQueue::new(&raw),
            device: raw,
        }
    }

    pub fn raw(&self) -> &Arc<RawVkDevice> {
        &self.device
    }
}

impl Device<VkBackend> for VkDevice {
    unsafe fn create_command_buffer(&self) -> Result<VkCommandBuffer, GPUError> {
        VkCommandBuffer::new(&self.device)
    }

    unsafe fn create_buffer(&self, info: &BufferInfo, _name: Option<&str>) -> Result<VkBuffer, GPUError> {
        VkBuffer::new(&self.device, info)
    }

    unsafe fn create_texture(&self, info: &TextureInfo, _name: Option<&str>) -> Result<VkTexture, GPUError> {
        VkTexture::new(&self.device, info)
    }

    unsafe fn create_texture_view(&self, texture: &VkTexture, info: &TextureViewInfo, _name: Option<&str>) -> Result<VkTextureView, GPUError> {
        VkTextureView::new(&self.device, texture, info)
    }

    unsafe fn create_sampler(&self, info: &SamplerInfo) -> Result<VkSampler, GPUError> {
        VkSampler::new(&self.device, info)
    }

    unsafe fn create_resource_layout(&self, info: &ResourceLayoutInfo) -> Result<VkResourceLayout, GPUError> {
        VkResourceLayout::new(&self.device, info)
    }

    unsafe fn create_resource_set(&self, layout: &VkResourceLayout, resources: &[BindingResource<VkBackend>]) -> Result<VkResourceSet, GPUError> {
        VkResourceSet::new(&self.device, layout, resources)
    }

    unsafe fn create_framebuffer(&self, info: &FramebufferInfo<VkBackend>) -> Result<VkFramebuffer, GPUError> {
        VkFramebuffer::new(&self.device, info)
    }

    unsafe fn create_event(&self) -> Result<VkEvent, GPUError> {
        VkEvent::new(&self.device)
    }

    unsafe fn is_event_set(&self, event: &VkEvent) -> bool {
        event.is_set()
    }

    unsafe fn reset_event(&self, event: &VkEvent) {
        if let Err(error) = event.reset() {
            error!("Resetting event failed: {}", error);
        }
    }

    fn graphics_queue(&self) -> &VkQueue {
        &self.queue
    }

    unsafe fn wait_for_idle(&self) {
        self.queue.wait_for_idle();
    }
}
