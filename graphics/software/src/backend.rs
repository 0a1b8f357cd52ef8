use emberline_core::gpu::GPUBackend;

use super::*;

pub enum SoftwareBackend {}

impl GPUBackend for SoftwareBackend {
    type Device = SoftwareDevice;
    type Queue = SoftwareQueue;
    type CommandBuffer = SoftwareCommandBuffer;
    type Buffer = SoftwareBuffer;
    type Texture = SoftwareTexture;
    type TextureView = SoftwareTextureView;
    type Sampler = SoftwareSampler;
    type ResourceLayout = SoftwareResourceLayout;
    type ResourceSet = SoftwareResourceSet;
    type Framebuffer = SoftwareFramebuffer;
    type Pipeline = SoftwarePipeline;
    type Event = SoftwareEvent;

    fn name() -> &'static str {
        "Software"
    }
}
