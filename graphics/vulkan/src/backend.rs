use emberline_core::gpu::GPUBackend;

use super::*;

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum VkBackend {}

impl GPUBackend for VkBackend {
    type Device = VkDevice;
    type Queue = VkQueue;
    type CommandBuffer = VkCommandBuffer;
    type Buffer = VkBuffer;
    type Texture = VkTexture;
    type TextureView = VkTextureView;
    type Sampler = VkSampler;
    type ResourceLayout = VkResourceLayout;
    type ResourceSet = VkResourceSet;
    type Framebuffer = VkFramebuffer;
    type Pipeline = VkPipeline;
    type Event = VkEvent;

    fn name() -> &'static str {
        "Vulkan"
    }
}
