use std::sync::Arc;

use ash::vk;
use log::error;
use smallvec::SmallVec;

use emberline_core::gpu::*;

use crate::pipeline::bind_point_to_vk;
use crate::*;

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum VkCommandBufferState {
    Ready,
    Recording,
    Finished,
}

/// A primary command buffer with a pool of its own, resetting it resets the
/// whole pool.
pub struct VkCommandBuffer {
    buffer: vk::CommandBuffer,
    pool: RawVkCommandPool,
    state: VkCommandBufferState,
    in_render_pass: bool,
    depth_aspect: vk::ImageAspectFlags,
}

impl VkCommandBuffer {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>) -> Result<Self, GPUError> {
        let pool = RawVkCommandPool::new(
            device,
            &vk::CommandPoolCreateInfo {
                queue_family_index: device.queue_family_index,
                flags: vk::CommandPoolCreateFlags::TRANSIENT,
                ..Default::default()
            },
        )
        .map_err(vk_error)?;
        let mut buffers = device
            .allocate_command_buffers(&vk::CommandBufferAllocateInfo {
                command_pool: *pool,
                level: vk::CommandBufferLevel::PRIMARY,
                command_buffer_count: 1,
                ..Default::default()
            })
            .map_err(vk_error)?;
        let buffer = buffers
            .pop()
            .ok_or_else(|| GPUError::Backend("command buffer allocation returned nothing".to_string()))?;
        Ok(Self {
            buffer,
            pool,
            state: VkCommandBufferState::Ready,
            in_render_pass: false,
            depth_aspect: vk::ImageAspectFlags::empty(),
        })
    }

    pub fn handle(&self) -> vk::CommandBuffer {
        self.buffer
    }

    pub fn state(&self) -> VkCommandBufferState {
        self.state
    }

    fn device(&self) -> &RawVkDevice {
        &self.pool.device
    }
}

fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue {
                float32: color.as_array(),
            },
        },
        ClearValue::DepthStencil(value) => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: value.depth,
                stencil: value.stencil as u32,
            },
        },
    }
}

fn offset_to_vk(offset: &Offset3D) -> vk::Offset3D {
    vk::Offset3D {
        x: offset.x as i32,
        y: offset.y as i32,
        z: offset.z as i32,
    }
}

/// Resolves one side of a copy to the image and the subresource inside of it.
fn copy_location<'a>(texture: &'a VkTexture, location: &TextureCopyLocation) -> Option<(&'a Arc<VkImage>, u32, u32)> {
    match location.staging_image {
        Some(index) => texture.staging_image(index).map(|image| (image, 0, 0)),
        None => texture.image_for(location.subresource.mip_level, location.subresource.array_layer),
    }
}

impl CommandBuffer<VkBackend> for VkCommandBuffer {
    unsafe fn reset(&mut self) {
        if let Err(result) = self
            .device()
            .reset_command_pool(*self.pool, vk::CommandPoolResetFlags::empty())
        {
            error!("Resetting command pool failed: {:?}", result);
        }
        self.state = VkCommandBufferState::Ready;
        self.in_render_pass = false;
    }

    unsafe fn begin(&mut self) {
        debug_assert_eq!(self.state, VkCommandBufferState::Ready);
        let begin_info = vk::CommandBufferBeginInfo {
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };
        if let Err(result) = self.device().begin_command_buffer(self.buffer, &begin_info) {
            error!("Beginning command buffer failed: {:?}", result);
        }
        self.state = VkCommandBufferState::Recording;
    }

    unsafe fn finish(&mut self) {
        debug_assert_eq!(self.state, VkCommandBufferState::Recording);
        debug_assert!(!self.in_render_pass);
        if let Err(result) = self.device().end_command_buffer(self.buffer) {
            error!("Ending command buffer failed: {:?}", result);
        }
        self.state = VkCommandBufferState::Finished;
    }

    unsafe fn begin_render_pass(&mut self, framebuffer: &VkFramebuffer, load_op: LoadOp, clear_values: &[ClearValue]) {
        debug_assert_eq!(self.state, VkCommandBufferState::Recording);
        debug_assert!(!self.in_render_pass);
        self.depth_aspect = vk::ImageAspectFlags::empty();
        for attachment in framebuffer.attachments() {
            let layout = attachment.layout();
            if layout == TextureLayout::DepthStencilReadWrite {
                self.depth_aspect = aspect_mask(attachment.image.format);
            }
            attachment.image.transition(
                self.buffer,
                attachment.mip_level..attachment.mip_level + 1,
                attachment.array_layer..attachment.array_layer + 1,
                layout,
            );
        }

        let vk_clear_values: SmallVec<[vk::ClearValue; 5]> = if load_op == LoadOp::Clear {
            clear_values.iter().map(clear_value_to_vk).collect()
        } else {
            SmallVec::new()
        };
        let begin_info = vk::RenderPassBeginInfo {
            render_pass: framebuffer.render_pass(load_op),
            framebuffer: framebuffer.handle(),
            render_area: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: framebuffer.width(),
                    height: framebuffer.height(),
                },
            },
            clear_value_count: vk_clear_values.len() as u32,
            p_clear_values: vk_clear_values.as_ptr(),
            ..Default::default()
        };
        self.device()
            .cmd_begin_render_pass(self.buffer, &begin_info, vk::SubpassContents::INLINE);
        self.in_render_pass = true;
    }

    unsafe fn end_render_pass(&mut self) {
        debug_assert!(self.in_render_pass);
        self.device().cmd_end_render_pass(self.buffer);
        self.in_render_pass = false;
    }

    unsafe fn clear_attachment(&mut self, attachment: &ClearAttachment, rect: &ClearRect) {
        debug_assert!(self.in_render_pass);
        let vk_attachment = match attachment {
            ClearAttachment::Color { index, color } => vk::ClearAttachment {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                color_attachment: *index,
                clear_value: clear_value_to_vk(&ClearValue::Color(*color)),
            },
            ClearAttachment::DepthStencil(value) => vk::ClearAttachment {
                aspect_mask: self.depth_aspect,
                color_attachment: 0,
                clear_value: clear_value_to_vk(&ClearValue::DepthStencil(*value)),
            },
        };
        let vk_rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: rect.x, y: rect.y },
                extent: vk::Extent2D {
                    width: rect.width,
                    height: rect.height,
                },
            },
            base_array_layer: rect.base_array_layer,
            layer_count: rect.layer_count,
        };
        self.device()
            .cmd_clear_attachments(self.buffer, &[vk_attachment], &[vk_rect]);
    }

    unsafe fn render_pass_barrier(&mut self) {
        debug_assert!(!self.in_render_pass);
        let barrier = vk::MemoryBarrier {
            src_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_READ
                | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
                | vk::AccessFlags::SHADER_READ,
            ..Default::default()
        };
        self.device().cmd_pipeline_barrier(
            self.buffer,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::FRAGMENT_SHADER
                | vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::DependencyFlags::empty(),
            &[barrier],
            &[],
            &[],
        );
    }

    unsafe fn set_event(&mut self, event: &VkEvent, sync: BarrierSync) {
        debug_assert!(!self.in_render_pass);
        if sync.contains(BarrierSync::HOST) {
            // Signaling the event alone does not make writes visible to the host.
            let barrier = vk::MemoryBarrier {
                src_access_mask: vk::AccessFlags::MEMORY_WRITE,
                dst_access_mask: vk::AccessFlags::HOST_READ,
                ..Default::default()
            };
            self.device().cmd_pipeline_barrier(
                self.buffer,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::HOST,
                vk::DependencyFlags::empty(),
                &[barrier],
                &[],
                &[],
            );
        }
        let mut stages = barrier_sync_to_vk(sync) & !vk::PipelineStageFlags::HOST;
        if stages.is_empty() {
            stages = vk::PipelineStageFlags::BOTTOM_OF_PIPE;
        }
        self.device().cmd_set_event(self.buffer, event.handle(), stages);
    }

    unsafe fn bind_pipeline(&mut self, pipeline: &VkPipeline) {
        self.device()
            .cmd_bind_pipeline(self.buffer, pipeline.vk_bind_point(), pipeline.handle());
    }

    unsafe fn bind_resource_sets(&mut self, bind_point: BindPoint, pipeline: &VkPipeline, first_set: u32, sets: &[&VkResourceSet]) {
        let handles: SmallVec<[vk::DescriptorSet; 8]> = sets.iter().map(|set| set.handle()).collect();
        self.device().cmd_bind_descriptor_sets(
            self.buffer,
            bind_point_to_vk(bind_point),
            pipeline.layout(),
            first_set,
            &handles,
            &[],
        );
    }

    unsafe fn set_vertex_buffer(&mut self, index: u32, buffer: &VkBuffer, offset: u64) {
        self.device()
            .cmd_bind_vertex_buffers(self.buffer, index, &[buffer.handle()], &[offset]);
    }

    unsafe fn set_index_buffer(&mut self, buffer: &VkBuffer, offset: u64, format: IndexFormat) {
        let index_type = match format {
            IndexFormat::U16 => vk::IndexType::UINT16,
            IndexFormat::U32 => vk::IndexType::UINT32,
        };
        self.device()
            .cmd_bind_index_buffer(self.buffer, buffer.handle(), offset, index_type);
    }

    unsafe fn set_viewport(&mut self, index: u32, viewport: &Viewport) {
        self.device().cmd_set_viewport(
            self.buffer,
            index,
            &[vk::Viewport {
                x: viewport.x,
                y: viewport.y,
                width: viewport.width,
                height: viewport.height,
                min_depth: viewport.min_depth,
                max_depth: viewport.max_depth,
            }],
        );
    }

    unsafe fn set_scissor(&mut self, index: u32, scissor: &Scissor) {
        self.device().cmd_set_scissor(
            self.buffer,
            index,
            &[vk::Rect2D {
                offset: vk::Offset2D {
                    x: scissor.x,
                    y: scissor.y,
                },
                extent: vk::Extent2D {
                    width: scissor.width,
                    height: scissor.height,
                },
            }],
        );
    }

    unsafe fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        debug_assert!(self.in_render_pass);
        self.device()
            .cmd_draw(self.buffer, vertex_count, instance_count, first_vertex, first_instance);
    }

    unsafe fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32) {
        debug_assert!(self.in_render_pass);
        self.device().cmd_draw_indexed(
            self.buffer,
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        );
    }

    unsafe fn draw_indirect(&mut self, buffer: &VkBuffer, offset: u64, draw_count: u32, stride: u32) {
        debug_assert!(self.in_render_pass);
        self.device()
            .cmd_draw_indirect(self.buffer, buffer.handle(), offset, draw_count, stride);
    }

    unsafe fn draw_indexed_indirect(&mut self, buffer: &VkBuffer, offset: u64, draw_count: u32, stride: u32) {
        debug_assert!(self.in_render_pass);
        self.device()
            .cmd_draw_indexed_indirect(self.buffer, buffer.handle(), offset, draw_count, stride);
    }

    unsafe fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        debug_assert!(!self.in_render_pass);
        self.device()
            .cmd_dispatch(self.buffer, group_count_x, group_count_y, group_count_z);
    }

    unsafe fn dispatch_indirect(&mut self, buffer: &VkBuffer, offset: u64) {
        debug_assert!(!self.in_render_pass);
        self.device()
            .cmd_dispatch_indirect(self.buffer, buffer.handle(), offset);
    }

    unsafe fn copy_buffer(&mut self, src: &VkBuffer, dst: &VkBuffer, region: &BufferCopyRegion) {
        debug_assert!(!self.in_render_pass);
        self.device().cmd_copy_buffer(
            self.buffer,
            src.handle(),
            dst.handle(),
            &[vk::BufferCopy {
                src_offset: region.src_offset,
                dst_offset: region.dst_offset,
                size: region.size,
            }],
        );
        // Buffer state is not tracked, the copy is made visible to everything after it.
        let barrier = vk::MemoryBarrier {
            src_access_mask: vk::AccessFlags::TRANSFER_WRITE,
            dst_access_mask: vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
            ..Default::default()
        };
        self.device().cmd_pipeline_barrier(
            self.buffer,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::DependencyFlags::empty(),
            &[barrier],
            &[],
            &[],
        );
    }

    unsafe fn copy_texture(&mut self, src: &VkTexture, dst: &VkTexture, region: &TextureCopyRegion) {
        debug_assert!(!self.in_render_pass);
        let (Some((src_image, src_mip, src_layer)), Some((dst_image, dst_mip, dst_layer))) =
            (copy_location(src, &region.src), copy_location(dst, &region.dst))
        else {
            error!("Texture copy addresses a subresource that does not exist");
            return;
        };
        let copy = vk::ImageCopy {
            src_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect_mask(src_image.format),
                mip_level: src_mip,
                base_array_layer: src_layer,
                layer_count: region.layer_count,
            },
            src_offset: offset_to_vk(&region.src.offset),
            dst_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect_mask(dst_image.format),
                mip_level: dst_mip,
                base_array_layer: dst_layer,
                layer_count: region.layer_count,
            },
            dst_offset: offset_to_vk(&region.dst.offset),
            extent: vk::Extent3D {
                width: region.extent.width,
                height: region.extent.height,
                depth: region.extent.depth,
            },
        };
        self.device().cmd_copy_image(
            self.buffer,
            src_image.image,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            dst_image.image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[copy],
        );
    }

    unsafe fn transition_texture(&mut self, texture: &VkTexture, range: &BarrierTextureRange, layout: TextureLayout) {
        debug_assert!(!self.in_render_pass);
        let mip_levels = range.base_mip_level..range.base_mip_level + range.mip_level_length;
        let array_layers = range.base_array_layer..range.base_array_layer + range.array_layer_length;
        if texture.info().is_staging() {
            for array_layer in array_layers {
                for mip_level in mip_levels.clone() {
                    if let Some((image, _, _)) = texture.image_for(mip_level, array_layer) {
                        image.transition(self.buffer, 0..1, 0..1, layout);
                    }
                }
            }
        } else if let Some((image, _, _)) = texture.image_for(0, 0) {
            image.transition(self.buffer, mip_levels, array_layers, layout);
        }
    }

    unsafe fn resolve_texture(&mut self, src: &VkTexture, dst: &VkTexture) {
        debug_assert!(!self.in_render_pass);
        let info = src.info();
        let subresource = vk::ImageSubresourceLayers {
            aspect_mask: aspect_mask(info.format),
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        self.device().cmd_resolve_image(
            self.buffer,
            src.handle(),
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            dst.handle(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[vk::ImageResolve {
                src_subresource: subresource,
                src_offset: vk::Offset3D::default(),
                dst_subresource: subresource,
                dst_offset: vk::Offset3D::default(),
                extent: vk::Extent3D {
                    width: info.width,
                    height: info.height,
                    depth: info.depth,
                },
            }],
        );
    }
}
