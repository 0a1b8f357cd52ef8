use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use std::sync::Arc;

use crossbeam_channel::{
    unbounded,
    Receiver,
};
use emberline_core::gpu::*;
use log::error;
use parking_lot::Mutex;

use crate::command::ExecutedCommand;
use crate::execute::Executor;
use crate::queue::Submission;
use crate::*;

pub(crate) struct SoftwareShared {
    next_id: AtomicU64,
    executed: Mutex<Vec<ExecutedCommand>>,
    violations: Mutex<Vec<String>>,
}

impl SoftwareShared {
    pub(crate) fn log(&self, command: ExecutedCommand) {
        self.executed.lock().push(command);
    }

    pub(crate) fn violation(&self, message: String) {
        error!("Software device: {}", message);
        self.violations.lock().push(message);
    }
}

pub struct SoftwareDevice {
    queue: SoftwareQueue,
    receiver: Receiver<Submission>,
    shared: Arc<SoftwareShared>,
    execution_lock: Mutex<()>,
}

impl SoftwareDevice {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            queue: SoftwareQueue::new(sender),
            receiver,
            shared: Arc::new(SoftwareShared {
                next_id: AtomicU64::new(1),
                executed: Mutex::new(Vec::new()),
                violations: Mutex::new(Vec::new()),
            }),
            execution_lock: Mutex::new(()),
        }
    }

    fn next_id(&self) -> u64 {
        self.shared.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Executes the oldest pending submission, returns false if there was none.
    pub fn execute_next(&self) -> bool {
        let _guard = self.execution_lock.lock();
        match self.receiver.try_recv() {
            Ok(submission) => {
                Executor::new(&self.shared).execute(&submission.commands);
                true
            }
            Err(_) => false,
        }
    }

    pub fn pending_submissions(&self) -> usize {
        self.receiver.len()
    }

    /// Drains the log of executed commands.
    pub fn take_executed_commands(&self) -> Vec<ExecutedCommand> {
        std::mem::take(&mut *self.shared.executed.lock())
    }

    /// Everything the device caught while executing, empty for correct usage.
    pub fn violations(&self) -> Vec<String> {
        self.shared.violations.lock().clone()
    }
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device<SoftwareBackend> for SoftwareDevice {
    unsafe fn create_command_buffer(&self) -> Result<SoftwareCommandBuffer, GPUError> {
        Ok(SoftwareCommandBuffer::new())
    }

    unsafe fn create_buffer(&self, info: &BufferInfo, _name: Option<&str>) -> Result<SoftwareBuffer, GPUError> {
        Ok(SoftwareBuffer::new(self.next_id(), info))
    }

    unsafe fn create_texture(&self, info: &TextureInfo, _name: Option<&str>) -> Result<SoftwareTexture, GPUError> {
        if info.mip_levels == 0 || info.array_length == 0 {
            return Err(GPUError::Unsupported("textures need at least one mip level and array layer"));
        }
        if info.is_staging() && info.samples != SampleCount::Samples1 {
            return Err(GPUError::Unsupported("multisampled staging textures"));
        }
        Ok(SoftwareTexture::new(self.next_id(), info))
    }

    unsafe fn create_texture_view(
        &self,
        texture: &SoftwareTexture,
        info: &TextureViewInfo,
        _name: Option<&str>,
    ) -> Result<SoftwareTextureView, GPUError> {
        Ok(SoftwareTextureView::new(self.next_id(), texture, info))
    }

    unsafe fn create_sampler(&self, info: &SamplerInfo) -> Result<SoftwareSampler, GPUError> {
        Ok(SoftwareSampler::new(self.next_id(), info))
    }

    unsafe fn create_resource_layout(&self, info: &ResourceLayoutInfo) -> Result<SoftwareResourceLayout, GPUError> {
        Ok(SoftwareResourceLayout::new(self.next_id(), info))
    }

    unsafe fn create_resource_set(
        &self,
        layout: &SoftwareResourceLayout,
        resources: &[BindingResource<SoftwareBackend>],
    ) -> Result<SoftwareResourceSet, GPUError> {
        SoftwareResourceSet::new(self.next_id(), layout, resources)
    }

    unsafe fn create_framebuffer(
        &self,
        info: &FramebufferInfo<SoftwareBackend>,
    ) -> Result<SoftwareFramebuffer, GPUError> {
        SoftwareFramebuffer::new(self.next_id(), info)
    }

    unsafe fn create_event(&self) -> Result<SoftwareEvent, GPUError> {
        Ok(SoftwareEvent::new(self.next_id()))
    }

    unsafe fn is_event_set(&self, event: &SoftwareEvent) -> bool {
        event.is_set()
    }

    unsafe fn reset_event(&self, event: &SoftwareEvent) {
        event.reset();
    }

    fn graphics_queue(&self) -> &SoftwareQueue {
        &self.queue
    }

    unsafe fn wait_for_idle(&self) {
        while self.execute_next() {}
    }
}
