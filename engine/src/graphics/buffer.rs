use std::mem::ManuallyDrop;
use std::sync::Arc;

use super::gpu::Buffer as _;
use super::gpu::Device as _;
use super::gpu::{
    BufferInfo,
    GPUError,
};
use super::*;

pub struct Buffer<B: GPUBackend> {
    buffer: ManuallyDrop<B::Buffer>,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
    name: Option<String>,
}

impl<B: GPUBackend> Drop for Buffer<B> {
    fn drop(&mut self) {
        let buffer = unsafe { ManuallyDrop::take(&mut self.buffer) };
        self.destroyer
            .retire(self.tracker.clone(), RetiredResource::Buffer(buffer));
    }
}

impl<B: GPUBackend> Buffer<B> {
    pub(super) fn new(
        device: &B::Device,
        destroyer: &Arc<DeferredDestroyer<B>>,
        info: &BufferInfo,
        name: Option<&str>,
    ) -> Result<Self, GPUError> {
        let buffer = unsafe { device.create_buffer(info, name)? };
        Ok(Self {
            buffer: ManuallyDrop::new(buffer),
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
            name: name.map(str::to_string),
        })
    }

    #[inline(always)]
    pub fn info(&self) -> &BufferInfo {
        self.buffer.info()
    }

    #[inline(always)]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::Buffer {
        &self.buffer
    }
}

impl<B: GPUBackend> TrackedResource for Buffer<B> {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        &self.tracker
    }
}
