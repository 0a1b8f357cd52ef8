use thiserror::Error;

use super::gpu::{
    BindPoint,
    GPUError,
};

/// Errors reported by command recording. A failing call leaves the recorder
/// as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("the command recorder is already recording")]
    AlreadyRecording,
    #[error("the command recorder is not recording")]
    NotRecording,
    #[error("the command recorder has to be ended before it can be submitted")]
    NotEnded,
    #[error("no framebuffer is bound")]
    NoFramebuffer,
    #[error("color target {index} is out of range, the framebuffer has {count} color targets")]
    ColorTargetOutOfRange { index: u32, count: u32 },
    #[error("the framebuffer has no color targets")]
    NoColorTarget,
    #[error("the framebuffer has no depth target")]
    NoDepthTarget,
    #[error("no {0:?} pipeline is bound")]
    NoPipeline(BindPoint),
    #[error("resource set slot {slot} is out of range, the pipeline uses {count} resource sets")]
    ResourceSetSlotOutOfRange { slot: u32, count: u32 },
    #[error("copying {layer_count} array layers to or from a staging texture is not supported")]
    UnsupportedStagingLayerCopy { layer_count: u32 },
    #[error("writing {length} bytes at offset {offset} exceeds the buffer size of {size} bytes")]
    BufferRangeOutOfBounds { offset: u64, length: u64, size: u64 },
    #[error(transparent)]
    Device(#[from] GPUError),
}
