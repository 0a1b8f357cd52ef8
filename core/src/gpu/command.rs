use super::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
  pub min_depth: f32,
  pub max_depth: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Scissor {
  pub x: i32,
  pub y: i32,
  pub width: u32,
  pub height: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IndexFormat {
  U16,
  U32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Offset3D {
  pub x: u32,
  pub y: u32,
  pub z: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Extent3D {
  pub width: u32,
  pub height: u32,
  pub depth: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferCopyRegion {
  pub src_offset: u64,
  pub dst_offset: u64,
  pub size: u64,
}

/// One side of an image copy.
/// Staging textures keep every subresource in its own image, `staging_image`
/// selects that image and `subresource` is then always mip 0 / layer 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureCopyLocation {
  pub staging_image: Option<u32>,
  pub subresource: TextureSubresource,
  pub offset: Offset3D,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureCopyRegion {
  pub src: TextureCopyLocation,
  pub dst: TextureCopyLocation,
  pub extent: Extent3D,
  pub layer_count: u32,
}

pub trait CommandBuffer<B: GPUBackend> {
  unsafe fn reset(&mut self);
  unsafe fn begin(&mut self);
  unsafe fn finish(&mut self);

  unsafe fn begin_render_pass(&mut self, framebuffer: &B::Framebuffer, load_op: LoadOp, clear_values: &[ClearValue]);
  unsafe fn end_render_pass(&mut self);
  unsafe fn clear_attachment(&mut self, attachment: &ClearAttachment, rect: &ClearRect);
  /// Makes render target writes of the previous pass visible to the next one.
  unsafe fn render_pass_barrier(&mut self);

  unsafe fn set_event(&mut self, event: &B::Event, sync: BarrierSync);

  unsafe fn bind_pipeline(&mut self, pipeline: &B::Pipeline);
  unsafe fn bind_resource_sets(&mut self, bind_point: BindPoint, pipeline: &B::Pipeline, first_set: u32, sets: &[&B::ResourceSet]);
  unsafe fn set_vertex_buffer(&mut self, index: u32, buffer: &B::Buffer, offset: u64);
  unsafe fn set_index_buffer(&mut self, buffer: &B::Buffer, offset: u64, format: IndexFormat);
  unsafe fn set_viewport(&mut self, index: u32, viewport: &Viewport);
  unsafe fn set_scissor(&mut self, index: u32, scissor: &Scissor);

  unsafe fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
  unsafe fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32);
  unsafe fn draw_indirect(&mut self, buffer: &B::Buffer, offset: u64, draw_count: u32, stride: u32);
  unsafe fn draw_indexed_indirect(&mut self, buffer: &B::Buffer, offset: u64, draw_count: u32, stride: u32);
  unsafe fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32);
  unsafe fn dispatch_indirect(&mut self, buffer: &B::Buffer, offset: u64);

  unsafe fn copy_buffer(&mut self, src: &B::Buffer, dst: &B::Buffer, region: &BufferCopyRegion);
  unsafe fn copy_texture(&mut self, src: &B::Texture, dst: &B::Texture, region: &TextureCopyRegion);
  unsafe fn transition_texture(&mut self, texture: &B::Texture, range: &BarrierTextureRange, layout: TextureLayout);
  unsafe fn resolve_texture(&mut self, src: &B::Texture, dst: &B::Texture);
}
