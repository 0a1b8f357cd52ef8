use std::sync::Arc;

use ash::vk;
use parking_lot::Mutex;
use smallvec::SmallVec;

use emberline_core::gpu::{
    BarrierSync,
    Format,
    TextureLayout,
};

use crate::memory::VkMemory;
use crate::raw::RawVkDevice;
use crate::aspect_mask;

/// A single `vk::Image` with the layout of each of its subresources as of
/// the last recorded command.
///
/// Layouts are tracked at record time, command buffers have to be submitted
/// in the order they were recorded in.
pub(crate) struct VkImage {
    pub(crate) image: vk::Image,
    memory: Option<VkMemory>,
    pub(crate) format: Format,
    pub(crate) mip_levels: u32,
    layouts: Mutex<SmallVec<[vk::ImageLayout; 8]>>,
    device: Arc<RawVkDevice>,
}

impl VkImage {
    pub(crate) fn new(
        device: &Arc<RawVkDevice>,
        image: vk::Image,
        memory: VkMemory,
        format: Format,
        mip_levels: u32,
        array_layers: u32,
        initial_layout: vk::ImageLayout,
    ) -> Self {
        Self {
            image,
            memory: Some(memory),
            format,
            mip_levels,
            layouts: Mutex::new(SmallVec::from_elem(initial_layout, (mip_levels * array_layers) as usize)),
            device: device.clone(),
        }
    }

    pub(crate) fn memory(&self) -> Option<&VkMemory> {
        self.memory.as_ref()
    }

    /// Records barriers moving every subresource in the range to `layout`.
    pub(crate) unsafe fn transition(
        &self,
        command_buffer: vk::CommandBuffer,
        mip_levels: std::ops::Range<u32>,
        array_layers: std::ops::Range<u32>,
        layout: TextureLayout,
    ) {
        let new_layout = texture_layout_to_vk(layout);
        if new_layout == vk::ImageLayout::UNDEFINED {
            return;
        }
        let (dst_stage, dst_access) = layout_sync(layout);

        let mut barriers = SmallVec::<[vk::ImageMemoryBarrier; 8]>::new();
        let mut src_stages = vk::PipelineStageFlags::empty();
        let mut layouts = self.layouts.lock();
        for array_layer in array_layers {
            for mip_level in mip_levels.clone() {
                let index = (mip_level + array_layer * self.mip_levels) as usize;
                let Some(old_layout) = layouts.get_mut(index) else {
                    continue;
                };
                let (src_stage, src_access) = vk_layout_sync(*old_layout);
                src_stages |= src_stage;
                barriers.push(vk::ImageMemoryBarrier {
                    src_access_mask: src_access,
                    dst_access_mask: dst_access,
                    old_layout: *old_layout,
                    new_layout,
                    src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    image: self.image,
                    subresource_range: vk::ImageSubresourceRange {
                        aspect_mask: aspect_mask(self.format),
                        base_mip_level: mip_level,
                        level_count: 1,
                        base_array_layer: array_layer,
                        layer_count: 1,
                    },
                    ..Default::default()
                });
                *old_layout = new_layout;
            }
        }
        drop(layouts);

        if barriers.is_empty() {
            return;
        }
        if src_stages.is_empty() {
            src_stages = vk::PipelineStageFlags::TOP_OF_PIPE;
        }
        self.device.cmd_pipeline_barrier(
            command_buffer,
            src_stages,
            dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &barriers,
        );
    }
}

impl Drop for VkImage {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image(self.image, None);
            if let Some(memory) = self.memory.take() {
                memory.free(&self.device);
            }
        }
    }
}

pub(crate) fn texture_layout_to_vk(layout: TextureLayout) -> vk::ImageLayout {
    match layout {
        TextureLayout::Undefined => vk::ImageLayout::UNDEFINED,
        TextureLayout::General | TextureLayout::Storage => vk::ImageLayout::GENERAL,
        TextureLayout::Sampled => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        TextureLayout::RenderTarget => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        TextureLayout::DepthStencilReadWrite => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        TextureLayout::CopySrc | TextureLayout::ResolveSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        TextureLayout::CopyDst | TextureLayout::ResolveDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
    }
}

/// Stages and accesses that use a subresource in the given layout.
fn layout_sync(layout: TextureLayout) -> (vk::PipelineStageFlags, vk::AccessFlags) {
    match layout {
        TextureLayout::Undefined => (vk::PipelineStageFlags::TOP_OF_PIPE, vk::AccessFlags::empty()),
        TextureLayout::General | TextureLayout::Storage => (
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
        ),
        TextureLayout::Sampled => (
            vk::PipelineStageFlags::VERTEX_SHADER
                | vk::PipelineStageFlags::FRAGMENT_SHADER
                | vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::AccessFlags::SHADER_READ,
        ),
        TextureLayout::RenderTarget => (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        ),
        TextureLayout::DepthStencilReadWrite => (
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        TextureLayout::CopySrc | TextureLayout::ResolveSrc => {
            (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_READ)
        }
        TextureLayout::CopyDst | TextureLayout::ResolveDst => {
            (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE)
        }
    }
}

/// Same as `layout_sync` for a tracked layout. Host writes to preinitialized
/// staging images become visible with the submission itself.
fn vk_layout_sync(layout: vk::ImageLayout) -> (vk::PipelineStageFlags, vk::AccessFlags) {
    match layout {
        vk::ImageLayout::UNDEFINED | vk::ImageLayout::PREINITIALIZED => {
            (vk::PipelineStageFlags::empty(), vk::AccessFlags::empty())
        }
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => layout_sync(TextureLayout::Sampled),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => layout_sync(TextureLayout::RenderTarget),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => layout_sync(TextureLayout::DepthStencilReadWrite),
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => layout_sync(TextureLayout::CopySrc),
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => layout_sync(TextureLayout::CopyDst),
        _ => layout_sync(TextureLayout::General),
    }
}

pub(crate) fn barrier_sync_to_vk(sync: BarrierSync) -> vk::PipelineStageFlags {
    let mut stages = vk::PipelineStageFlags::empty();
    if sync.contains(BarrierSync::VERTEX_INPUT) || sync.contains(BarrierSync::INDEX_INPUT) {
        stages |= vk::PipelineStageFlags::VERTEX_INPUT;
    }
    if sync.contains(BarrierSync::VERTEX_SHADER) {
        stages |= vk::PipelineStageFlags::VERTEX_SHADER;
    }
    if sync.contains(BarrierSync::FRAGMENT_SHADER) {
        stages |= vk::PipelineStageFlags::FRAGMENT_SHADER;
    }
    if sync.contains(BarrierSync::COMPUTE_SHADER) {
        stages |= vk::PipelineStageFlags::COMPUTE_SHADER;
    }
    if sync.contains(BarrierSync::EARLY_DEPTH) {
        stages |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
    }
    if sync.contains(BarrierSync::LATE_DEPTH) {
        stages |= vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
    }
    if sync.contains(BarrierSync::RENDER_TARGET) {
        stages |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
    }
    if sync.intersects(BarrierSync::COPY | BarrierSync::RESOLVE) {
        stages |= vk::PipelineStageFlags::TRANSFER;
    }
    if sync.contains(BarrierSync::INDIRECT) {
        stages |= vk::PipelineStageFlags::DRAW_INDIRECT;
    }
    if sync.contains(BarrierSync::HOST) {
        stages |= vk::PipelineStageFlags::HOST;
    }
    if stages.is_empty() {
        stages = vk::PipelineStageFlags::BOTTOM_OF_PIPE;
    }
    stages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_and_resolve_share_transfer_layouts() {
        assert_eq!(texture_layout_to_vk(TextureLayout::CopySrc), texture_layout_to_vk(TextureLayout::ResolveSrc));
        assert_eq!(texture_layout_to_vk(TextureLayout::CopyDst), vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert_eq!(texture_layout_to_vk(TextureLayout::Storage), vk::ImageLayout::GENERAL);
    }

    #[test]
    fn sync_scopes() {
        assert_eq!(barrier_sync_to_vk(BarrierSync::COPY), vk::PipelineStageFlags::TRANSFER);
        assert_eq!(barrier_sync_to_vk(BarrierSync::empty()), vk::PipelineStageFlags::BOTTOM_OF_PIPE);
        assert!(barrier_sync_to_vk(BarrierSync::all()).contains(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::HOST
        ));
    }
}
