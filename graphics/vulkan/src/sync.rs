use std::sync::Arc;

use ash::vk;

use emberline_core::gpu::GPUError;

use crate::{
    vk_error,
    RawVkDevice,
};

/// A `vk::Event` that command buffers set once they have executed up to
/// that point, polled from the host to find completed submissions.
pub struct VkEvent {
    event: vk::Event,
    device: Arc<RawVkDevice>,
}

impl VkEvent {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>) -> Result<Self, GPUError> {
        let event = device
            .create_event(&vk::EventCreateInfo::default(), None)
            .map_err(vk_error)?;
        Ok(Self {
            event,
            device: device.clone(),
        })
    }

    pub fn handle(&self) -> vk::Event {
        self.event
    }

    pub(crate) unsafe fn is_set(&self) -> bool {
        self.device.get_event_status(self.event).unwrap_or(false)
    }

    pub(crate) unsafe fn reset(&self) -> Result<(), GPUError> {
        self.device.reset_event(self.event).map_err(vk_error)
    }
}

impl Drop for VkEvent {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_event(self.event, None);
        }
    }
}
