use super::*;

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct ShaderStages: u32 {
    const VERTEX   = 0b1;
    const FRAGMENT = 0b10;
    const COMPUTE  = 0b100;
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
  UniformBuffer,
  StorageBuffer,
  SampledTexture,
  StorageTexture,
  Sampler,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceLayoutElement {
  pub kind: ResourceKind,
  pub stages: ShaderStages,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceLayoutInfo<'a> {
  pub elements: &'a [ResourceLayoutElement],
}

/// A single resource written into a resource set, binding `i` of the set
/// takes element `i` of the slice passed to `Device::create_resource_set`.
pub enum BindingResource<'a, B: GPUBackend> {
  UniformBuffer { buffer: &'a B::Buffer, offset: u64, length: u64 },
  StorageBuffer { buffer: &'a B::Buffer, offset: u64, length: u64 },
  SampledTexture(&'a B::TextureView),
  StorageTexture(&'a B::TextureView),
  Sampler(&'a B::Sampler),
}

impl<'a, B: GPUBackend> BindingResource<'a, B> {
  pub fn kind(&self) -> ResourceKind {
    match self {
      BindingResource::UniformBuffer { .. } => ResourceKind::UniformBuffer,
      BindingResource::StorageBuffer { .. } => ResourceKind::StorageBuffer,
      BindingResource::SampledTexture(_) => ResourceKind::SampledTexture,
      BindingResource::StorageTexture(_) => ResourceKind::StorageTexture,
      BindingResource::Sampler(_) => ResourceKind::Sampler,
    }
  }
}
