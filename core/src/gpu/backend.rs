use super::*;

pub trait GPUBackend: 'static + Sized {
  type Device: Device<Self> + GPUMaybeSend + GPUMaybeSync;
  type Queue: Queue<Self> + GPUMaybeSend + GPUMaybeSync;
  type CommandBuffer: CommandBuffer<Self> + GPUMaybeSend;
  type Buffer: Buffer;
  type Texture: Texture;
  type TextureView: GPUMaybeSend + GPUMaybeSync;
  type Sampler: GPUMaybeSend + GPUMaybeSync;
  type ResourceLayout: GPUMaybeSend + GPUMaybeSync;
  type ResourceSet: GPUMaybeSend + GPUMaybeSync;
  type Framebuffer: Framebuffer;
  type Pipeline: Pipeline;
  type Event: GPUMaybeSend + GPUMaybeSync;

  fn name() -> &'static str;
}
