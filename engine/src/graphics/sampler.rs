use std::mem::ManuallyDrop;
use std::sync::Arc;

use super::gpu::Device as _;
use super::gpu::{
    GPUError,
    SamplerInfo,
};
use super::*;

pub struct Sampler<B: GPUBackend> {
    sampler: ManuallyDrop<B::Sampler>,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
}

impl<B: GPUBackend> Drop for Sampler<B> {
    fn drop(&mut self) {
        let sampler = unsafe { ManuallyDrop::take(&mut self.sampler) };
        self.destroyer
            .retire(self.tracker.clone(), RetiredResource::Sampler(sampler));
    }
}

impl<B: GPUBackend> Sampler<B> {
    pub(super) fn new(
        device: &B::Device,
        destroyer: &Arc<DeferredDestroyer<B>>,
        info: &SamplerInfo,
    ) -> Result<Self, GPUError> {
        let sampler = unsafe { device.create_sampler(info)? };
        Ok(Self {
            sampler: ManuallyDrop::new(sampler),
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
        })
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::Sampler {
        &self.sampler
    }
}

impl<B: GPUBackend> TrackedResource for Sampler<B> {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        &self.tracker
    }
}
