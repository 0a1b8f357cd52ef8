use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
  Load,
  Clear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
  pub r: f32,
  pub g: f32,
  pub b: f32,
  pub a: f32,
}

impl ClearColor {
  pub const BLACK: ClearColor = ClearColor::new(0f32, 0f32, 0f32, 1f32);
  pub const RED: ClearColor = ClearColor::new(1f32, 0f32, 0f32, 1f32);
  pub const GREEN: ClearColor = ClearColor::new(0f32, 1f32, 0f32, 1f32);
  pub const BLUE: ClearColor = ClearColor::new(0f32, 0f32, 1f32, 1f32);
  pub const TRANSPARENT: ClearColor = ClearColor::new(0f32, 0f32, 0f32, 0f32);

  pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
    Self { r, g, b, a }
  }

  pub fn as_array(&self) -> [f32; 4] {
    [self.r, self.g, self.b, self.a]
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilValue {
  pub depth: f32,
  pub stencil: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
  Color(ClearColor),
  DepthStencil(DepthStencilValue),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearAttachment {
  Color { index: u32, color: ClearColor },
  DepthStencil(DepthStencilValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearRect {
  pub x: i32,
  pub y: i32,
  pub width: u32,
  pub height: u32,
  pub base_array_layer: u32,
  pub layer_count: u32,
}

pub struct FramebufferAttachmentInfo<'a, B: GPUBackend> {
  pub texture: &'a B::Texture,
  pub mip_level: u32,
  pub array_layer: u32,
}

pub struct FramebufferInfo<'a, B: GPUBackend> {
  pub color_targets: &'a [FramebufferAttachmentInfo<'a, B>],
  pub depth_target: Option<FramebufferAttachmentInfo<'a, B>>,
}

/// Framebuffers carry two pass variants that only differ in their load
/// operation, `LoadOp::Clear` consumes one clear value per attachment
/// (color targets first, depth last), `LoadOp::Load` keeps the contents.
pub trait Framebuffer: GPUMaybeSend + GPUMaybeSync {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
  fn color_target_count(&self) -> u32;
  fn has_depth_target(&self) -> bool;
}
