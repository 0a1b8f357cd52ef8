use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindPoint {
  Graphics,
  Compute,
}

/// Pipelines are compiled outside of the recording layer, backends only
/// expose what command recording needs to know about them.
pub trait Pipeline: GPUMaybeSend + GPUMaybeSync {
  fn bind_point(&self) -> BindPoint;
  fn resource_set_count(&self) -> u32;
  fn scissor_test_enabled(&self) -> bool;
}
