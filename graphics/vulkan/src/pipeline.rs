use std::sync::Arc;

use ash::vk;

use emberline_core::gpu::{
    BindPoint,
    Pipeline,
};

use crate::RawVkDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VkPipelineInfo {
    pub bind_point: BindPoint,
    pub resource_set_count: u32,
    pub scissor_test_enabled: bool,
}

/// A pipeline compiled by the application. Shader compilation and pipeline
/// state live outside of this crate, the wrapper only owns the handles.
pub struct VkPipeline {
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
    info: VkPipelineInfo,
    device: Arc<RawVkDevice>,
}

impl VkPipeline {
    /// Takes ownership of `pipeline` and `layout`, both are destroyed with
    /// the returned object. `info.resource_set_count` has to match the
    /// number of set layouts in `layout`.
    pub unsafe fn from_raw(
        device: &crate::VkDevice,
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
        info: VkPipelineInfo,
    ) -> Self {
        Self {
            pipeline,
            layout,
            info,
            device: device.raw().clone(),
        }
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    pub(crate) fn vk_bind_point(&self) -> vk::PipelineBindPoint {
        bind_point_to_vk(self.info.bind_point)
    }
}

pub(crate) fn bind_point_to_vk(bind_point: BindPoint) -> vk::PipelineBindPoint {
    match bind_point {
        BindPoint::Graphics => vk::PipelineBindPoint::GRAPHICS,
        BindPoint::Compute => vk::PipelineBindPoint::COMPUTE,
    }
}

impl Drop for VkPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

impl Pipeline for VkPipeline {
    fn bind_point(&self) -> BindPoint {
        self.info.bind_point
    }

    fn resource_set_count(&self) -> u32 {
        self.info.resource_set_count
    }

    fn scissor_test_enabled(&self) -> bool {
        self.info.scissor_test_enabled
    }
}
