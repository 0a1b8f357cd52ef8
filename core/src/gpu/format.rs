#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
  Unknown,
  R8UNorm,
  RG8UNorm,
  RGBA8UNorm,
  RGBA8Srgb,
  BGRA8UNorm,
  R16Float,
  R16UInt,
  RG16Float,
  RGBA16Float,
  R32Float,
  R32UInt,
  RG32Float,
  RGBA32Float,

  D16,
  D32,
  D24S8,
  D32S8,
}

impl Format {
  pub fn is_depth(&self) -> bool {
    matches!(self,
      Format::D16
      | Format::D32
      | Format::D24S8
      | Format::D32S8)
  }

  pub fn is_stencil(&self) -> bool {
    matches!(self,
      Format::D24S8
      | Format::D32S8)
  }

  /// Size of a single texel in bytes.
  pub fn element_size(&self) -> u32 {
    match self {
      Format::Unknown => 0,
      Format::R8UNorm => 1,
      Format::RG8UNorm => 2,
      Format::RGBA8UNorm | Format::RGBA8Srgb | Format::BGRA8UNorm => 4,
      Format::R16Float | Format::R16UInt => 2,
      Format::RG16Float => 4,
      Format::RGBA16Float => 8,
      Format::R32Float | Format::R32UInt => 4,
      Format::RG32Float => 8,
      Format::RGBA32Float => 16,
      Format::D16 => 2,
      Format::D32 => 4,
      Format::D24S8 => 4,
      Format::D32S8 => 8,
    }
  }
}
