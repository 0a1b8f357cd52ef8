use std::mem::ManuallyDrop;
use std::sync::Arc;

use super::gpu::BindPoint;
use super::gpu::Pipeline as _;
use super::*;

/// A pipeline compiled outside of the engine, imported with
/// [`Device::import_pipeline`].
pub struct Pipeline<B: GPUBackend> {
    pipeline: ManuallyDrop<B::Pipeline>,
    name: Option<String>,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
}

impl<B: GPUBackend> Drop for Pipeline<B> {
    fn drop(&mut self) {
        let pipeline = unsafe { ManuallyDrop::take(&mut self.pipeline) };
        self.destroyer
            .retire(self.tracker.clone(), RetiredResource::Pipeline(pipeline));
    }
}

impl<B: GPUBackend> Pipeline<B> {
    pub(super) fn new(destroyer: &Arc<DeferredDestroyer<B>>, pipeline: B::Pipeline, name: Option<&str>) -> Self {
        Self {
            pipeline: ManuallyDrop::new(pipeline),
            name: name.map(str::to_string),
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
        }
    }

    #[inline(always)]
    pub fn bind_point(&self) -> BindPoint {
        self.pipeline.bind_point()
    }

    #[inline(always)]
    pub fn resource_set_count(&self) -> u32 {
        self.pipeline.resource_set_count()
    }

    #[inline(always)]
    pub fn scissor_test_enabled(&self) -> bool {
        self.pipeline.scissor_test_enabled()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::Pipeline {
        &self.pipeline
    }
}

impl<B: GPUBackend> TrackedResource for Pipeline<B> {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        &self.tracker
    }
}
