use crossbeam_channel::Sender;
use emberline_core::gpu::*;

use crate::command::{
    Command,
    SoftwareCommandBufferState,
};
use crate::{
    SoftwareBackend,
    SoftwareCommandBuffer,
};

pub(crate) struct Submission {
    pub(crate) commands: Vec<Command>,
}

pub struct SoftwareQueue {
    sender: Sender<Submission>,
}

impl SoftwareQueue {
    pub(crate) fn new(sender: Sender<Submission>) -> Self {
        Self { sender }
    }
}

impl Queue<SoftwareBackend> for SoftwareQueue {
    unsafe fn submit(&self, command_buffer: &SoftwareCommandBuffer) -> Result<(), GPUError> {
        if command_buffer.state() != SoftwareCommandBufferState::Finished {
            return Err(GPUError::Backend("submitted a command buffer that was not finished".to_string()));
        }
        self.sender
            .send(Submission {
                commands: command_buffer.commands().to_vec(),
            })
            .map_err(|_| GPUError::DeviceLost)
    }
}
