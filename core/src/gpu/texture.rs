use super::*;

bitflags! {
  #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
  pub struct TextureUsage: u32 {
    const SAMPLED       = 0b1;
    const RENDER_TARGET = 0b10;
    const STORAGE       = 0b100;
    const COPY_SRC      = 0b1000;
    const COPY_DST      = 0b10000;
    const RESOLVE_SRC   = 0b100000;
    const RESOLVE_DST   = 0b1000000;
    const DEPTH_STENCIL = 0b1000000000;
    /// Host accessible texture with one linear image per subresource.
    const STAGING       = 0b10000000000;
  }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TextureLayout {
  #[default]
  Undefined,
  General,
  Sampled,
  RenderTarget,
  DepthStencilReadWrite,
  Storage,
  CopySrc,
  CopyDst,
  ResolveSrc,
  ResolveDst,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureDimension {
  Dim1D,
  Dim2D,
  Dim3D,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SampleCount {
  Samples1,
  Samples2,
  Samples4,
  Samples8,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureInfo {
  pub dimension: TextureDimension,
  pub format: Format,
  pub width: u32,
  pub height: u32,
  pub depth: u32,
  pub mip_levels: u32,
  pub array_length: u32,
  pub samples: SampleCount,
  pub usage: TextureUsage,
}

impl TextureInfo {
  pub fn is_staging(&self) -> bool {
    self.usage.contains(TextureUsage::STAGING)
  }

  pub fn subresource_count(&self) -> u32 {
    self.mip_levels * self.array_length
  }

  /// Flat index of a subresource, mips of the same layer are adjacent.
  pub fn subresource_index(&self, mip_level: u32, array_layer: u32) -> u32 {
    mip_level + array_layer * self.mip_levels
  }

  pub fn mip_extent(&self, mip_level: u32) -> Extent3D {
    Extent3D {
      width: (self.width >> mip_level).max(1),
      height: (self.height >> mip_level).max(1),
      depth: (self.depth >> mip_level).max(1),
    }
  }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureSubresource {
  pub mip_level: u32,
  pub array_layer: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureViewInfo {
  pub base_mip_level: u32,
  pub mip_level_length: u32,
  pub base_array_layer: u32,
  pub array_layer_length: u32,
  pub format: Option<Format>,
}

impl Default for TextureViewInfo {
  fn default() -> Self {
    Self {
      base_mip_level: 0,
      mip_level_length: 1,
      base_array_layer: 0,
      array_layer_length: 1,
      format: None,
    }
  }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Filter {
  Linear,
  Nearest,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AddressMode {
  Repeat,
  MirroredRepeat,
  ClampToEdge,
  ClampToBorder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerInfo {
  pub mag_filter: Filter,
  pub min_filter: Filter,
  pub mip_filter: Filter,
  pub address_mode_u: AddressMode,
  pub address_mode_v: AddressMode,
  pub address_mode_w: AddressMode,
  pub mip_bias: f32,
  pub min_lod: f32,
  pub max_lod: Option<f32>,
}

impl Default for SamplerInfo {
  fn default() -> Self {
    Self {
      mag_filter: Filter::Linear,
      min_filter: Filter::Linear,
      mip_filter: Filter::Linear,
      address_mode_u: AddressMode::Repeat,
      address_mode_v: AddressMode::Repeat,
      address_mode_w: AddressMode::Repeat,
      mip_bias: 0.0,
      min_lod: 0.0,
      max_lod: None,
    }
  }
}

/// Host view of one subresource of a staging texture.
#[derive(Debug, Clone, Copy)]
pub struct MappedSubresource {
  pub data: *mut u8,
  pub size: u64,
  pub row_pitch: u64,
  pub depth_pitch: u64,
}

pub trait Texture: GPUMaybeSend + GPUMaybeSync {
  fn info(&self) -> &TextureInfo;

  /// Only staging textures can be mapped, everything else returns `None`.
  unsafe fn map_subresource(&self, subresource: u32) -> Option<MappedSubresource>;
  unsafe fn unmap_subresource(&self, subresource: u32);
}
