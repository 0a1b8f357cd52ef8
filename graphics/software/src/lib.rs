//! A CPU implementation of the emberline GPU interface.
//!
//! Submitted command buffers are queued and only executed when
//! [`SoftwareDevice::wait_for_idle`](emberline_core::gpu::Device::wait_for_idle)
//! or [`SoftwareDevice::execute_next`] is called, so completion is observed
//! the same way it is on real hardware: by polling events.
//! Execution validates what it can (destroyed resources, commands outside of
//! their pass, texture layouts) and records every violation instead of
//! crashing.

extern crate emberline_core;

pub use self::backend::SoftwareBackend;
pub use self::buffer::SoftwareBuffer;
pub use self::command::{
    ExecutedCommand,
    SoftwareCommandBuffer,
};
pub use self::descriptor::{
    SoftwareResourceLayout,
    SoftwareResourceSet,
};
pub use self::device::SoftwareDevice;
pub use self::framebuffer::SoftwareFramebuffer;
pub use self::liveness::ResourceProbe;
pub use self::pipeline::{
    SoftwarePipeline,
    SoftwarePipelineInfo,
};
pub use self::queue::SoftwareQueue;
pub use self::sync::SoftwareEvent;
pub use self::texture::{
    SoftwareSampler,
    SoftwareTexture,
    SoftwareTextureView,
};

mod backend;
mod buffer;
mod command;
mod descriptor;
mod device;
mod execute;
mod framebuffer;
mod liveness;
mod pipeline;
mod queue;
mod sync;
mod texel;
mod texture;
