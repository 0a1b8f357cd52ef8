use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use std::sync::Arc;

use emberline_core::gpu::*;

use crate::liveness::{
    Liveness,
    ResourceProbe,
};

static NEXT_PIPELINE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwarePipelineInfo {
    pub bind_point: BindPoint,
    pub resource_set_count: u32,
    pub scissor_test_enabled: bool,
}

pub(crate) struct PipelineStorage {
    pub(crate) info: SoftwarePipelineInfo,
    pub(crate) liveness: Arc<Liveness>,
}

/// Software pipelines do not run shaders, they only carry the state that
/// command recording and validation depend on.
pub struct SoftwarePipeline {
    storage: Arc<PipelineStorage>,
}

impl SoftwarePipeline {
    pub fn new(info: SoftwarePipelineInfo) -> Self {
        Self {
            storage: Arc::new(PipelineStorage {
                info,
                liveness: Liveness::new(NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed), "pipeline"),
            }),
        }
    }

    pub(crate) fn storage(&self) -> &Arc<PipelineStorage> {
        &self.storage
    }

    pub fn probe(&self) -> ResourceProbe {
        ResourceProbe::new(&self.storage.liveness)
    }
}

impl Drop for SoftwarePipeline {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}

impl Pipeline for SoftwarePipeline {
    fn bind_point(&self) -> BindPoint {
        self.storage.info.bind_point
    }

    fn resource_set_count(&self) -> u32 {
        self.storage.info.resource_set_count
    }

    fn scissor_test_enabled(&self) -> bool {
        self.storage.info.scissor_test_enabled
    }
}
