pub use buffer::*;
pub use command::*;
pub use device::*;
pub use error::*;
pub use framebuffer::*;
pub use pipeline::*;
pub use reference::*;
pub use resource_set::*;
pub use sampler::*;
pub use texture::*;
use binding::*;
use destroyer::*;
use render_pass::*;
use staging::*;
use submission::*;

mod binding;
mod buffer;
mod command;
mod destroyer;
mod device;
mod error;
mod framebuffer;
mod pipeline;
mod reference;
mod render_pass;
mod resource_set;
mod sampler;
mod staging;
mod submission;
#[cfg(test)]
mod testing;
mod texture;

pub use emberline_core::gpu;
use emberline_core::gpu::GPUBackend;
