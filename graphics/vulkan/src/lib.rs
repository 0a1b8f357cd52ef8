//! Vulkan implementation of the emberline GPU interface on top of `ash`.
//!
//! Instance and device creation stay with the application, [`VkDevice::new`]
//! takes over an existing logical device.

extern crate ash;
extern crate emberline_core;

pub use self::backend::VkBackend;
pub use self::buffer::VkBuffer;
pub use self::command::VkCommandBuffer;
pub use self::descriptor::{
    VkResourceLayout,
    VkResourceSet,
};
pub use self::device::VkDevice;
pub use self::pipeline::{
    VkPipeline,
    VkPipelineInfo,
};
pub use self::queue::VkQueue;
pub use self::renderpass::VkFramebuffer;
pub use self::sync::VkEvent;
pub use self::texture::{
    VkSampler,
    VkTexture,
    VkTextureView,
};

pub(crate) use self::error::*;
pub(crate) use self::format::*;
pub(crate) use self::image::*;
pub(crate) use self::raw::*;

mod backend;
mod buffer;
mod command;
mod descriptor;
mod device;
mod error;
mod format;
mod image;
mod memory;
mod pipeline;
mod queue;
mod raw;
mod renderpass;
mod sync;
mod texture;
