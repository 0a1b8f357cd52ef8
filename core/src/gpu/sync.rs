bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct BarrierSync: u32 {
    const VERTEX_INPUT    = 0b1;
    const VERTEX_SHADER   = 0b10;
    const FRAGMENT_SHADER = 0b100;
    const COMPUTE_SHADER  = 0b1000;
    const EARLY_DEPTH     = 0b10000;
    const LATE_DEPTH      = 0b100000;
    const RENDER_TARGET   = 0b1000000;
    const COPY            = 0b10000000;
    const RESOLVE         = 0b100000000;
    const INDIRECT        = 0b1000000000;
    const INDEX_INPUT     = 0b10000000000;
    const HOST            = 0b100000000000;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BarrierTextureRange {
  pub base_mip_level: u32,
  pub mip_level_length: u32,
  pub base_array_layer: u32,
  pub array_layer_length: u32,
}

impl Default for BarrierTextureRange {
  fn default() -> Self {
    Self {
      base_mip_level: 0,
      mip_level_length: 1,
      base_array_layer: 0,
      array_layer_length: 1,
    }
  }
}
