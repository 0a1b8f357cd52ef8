use super::*;

pub trait Device<B: GPUBackend> {
  unsafe fn create_command_buffer(&self) -> Result<B::CommandBuffer, GPUError>;
  unsafe fn create_buffer(&self, info: &BufferInfo, name: Option<&str>) -> Result<B::Buffer, GPUError>;
  unsafe fn create_texture(&self, info: &TextureInfo, name: Option<&str>) -> Result<B::Texture, GPUError>;
  unsafe fn create_texture_view(&self, texture: &B::Texture, info: &TextureViewInfo, name: Option<&str>) -> Result<B::TextureView, GPUError>;
  unsafe fn create_sampler(&self, info: &SamplerInfo) -> Result<B::Sampler, GPUError>;
  unsafe fn create_resource_layout(&self, info: &ResourceLayoutInfo) -> Result<B::ResourceLayout, GPUError>;
  unsafe fn create_resource_set(&self, layout: &B::ResourceLayout, resources: &[BindingResource<B>]) -> Result<B::ResourceSet, GPUError>;
  unsafe fn create_framebuffer(&self, info: &FramebufferInfo<B>) -> Result<B::Framebuffer, GPUError>;

  unsafe fn create_event(&self) -> Result<B::Event, GPUError>;
  /// Non-blocking query of an event set from a command buffer.
  unsafe fn is_event_set(&self, event: &B::Event) -> bool;
  unsafe fn reset_event(&self, event: &B::Event);

  fn graphics_queue(&self) -> &B::Queue;
  unsafe fn wait_for_idle(&self);
}
