use std::sync::Arc;

use ash::vk;
use parking_lot::Mutex;

use emberline_core::gpu::{
    GPUError,
    Queue,
};

use crate::{
    vk_error,
    RawVkDevice,
    VkBackend,
    VkCommandBuffer,
};

/// Submission to a `vk::Queue` has to be externally synchronized.
pub struct VkQueue {
    queue: Mutex<vk::Queue>,
    device: Arc<RawVkDevice>,
}

impl VkQueue {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>) -> Self {
        let queue = device.get_device_queue(device.queue_family_index, 0);
        Self {
            queue: Mutex::new(queue),
            device: device.clone(),
        }
    }

    pub(crate) unsafe fn wait_for_idle(&self) {
        let queue = self.queue.lock();
        if let Err(result) = self.device.queue_wait_idle(*queue) {
            log::error!("Waiting for the queue failed: {:?}", result);
        }
    }
}

impl Queue<VkBackend> for VkQueue {
    unsafe fn submit(&self, command_buffer: &VkCommandBuffer) -> Result<(), GPUError> {
        let command_buffers = [command_buffer.handle()];
        let submit = vk::SubmitInfo {
            command_buffer_count: 1,
            p_command_buffers: command_buffers.as_ptr(),
            ..Default::default()
        };
        let queue = self.queue.lock();
        self.device
            .queue_submit(*queue, &[submit], vk::Fence::null())
            .map_err(vk_error)
    }
}
