use std::sync::Arc;

use ash::vk;
use smallvec::SmallVec;

use emberline_core::gpu::{
    BindingResource,
    GPUError,
    ResourceKind,
    ResourceLayoutElement,
    ResourceLayoutInfo,
    ShaderStages,
};

use crate::{
    vk_error,
    RawVkDevice,
    VkBackend,
};

pub struct VkResourceLayout {
    layout: vk::DescriptorSetLayout,
    elements: SmallVec<[ResourceLayoutElement; 8]>,
    device: Arc<RawVkDevice>,
}

impl VkResourceLayout {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>, info: &ResourceLayoutInfo) -> Result<Self, GPUError> {
        let bindings: SmallVec<[vk::DescriptorSetLayoutBinding; 8]> = info
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| vk::DescriptorSetLayoutBinding {
                binding: index as u32,
                descriptor_type: descriptor_type(element.kind),
                descriptor_count: 1,
                stage_flags: shader_stages_to_vk(element.stages),
                p_immutable_samplers: std::ptr::null(),
            })
            .collect();
        let create_info = vk::DescriptorSetLayoutCreateInfo {
            p_bindings: bindings.as_ptr(),
            binding_count: bindings.len() as u32,
            ..Default::default()
        };
        let layout = device
            .create_descriptor_set_layout(&create_info, None)
            .map_err(vk_error)?;
        Ok(Self {
            layout,
            elements: info.elements.iter().copied().collect(),
            device: device.clone(),
        })
    }

    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    pub fn elements(&self) -> &[ResourceLayoutElement] {
        &self.elements
    }
}

impl Drop for VkResourceLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// A descriptor set allocated from a pool sized for exactly this set.
pub struct VkResourceSet {
    pool: vk::DescriptorPool,
    set: vk::DescriptorSet,
    device: Arc<RawVkDevice>,
}

impl VkResourceSet {
    pub(crate) unsafe fn new(
        device: &Arc<RawVkDevice>,
        layout: &VkResourceLayout,
        resources: &[BindingResource<VkBackend>],
    ) -> Result<Self, GPUError> {
        if resources.len() != layout.elements().len()
            || resources
                .iter()
                .zip(layout.elements())
                .any(|(resource, element)| resource.kind() != element.kind)
        {
            return Err(GPUError::Unsupported("resources do not match the resource layout"));
        }

        let mut pool_sizes = SmallVec::<[vk::DescriptorPoolSize; 5]>::new();
        for element in layout.elements() {
            let ty = descriptor_type(element.kind);
            match pool_sizes.iter_mut().find(|size| size.ty == ty) {
                Some(size) => size.descriptor_count += 1,
                None => pool_sizes.push(vk::DescriptorPoolSize { ty, descriptor_count: 1 }),
            }
        }
        let pool = device
            .create_descriptor_pool(
                &vk::DescriptorPoolCreateInfo {
                    max_sets: 1,
                    pool_size_count: pool_sizes.len() as u32,
                    p_pool_sizes: pool_sizes.as_ptr(),
                    ..Default::default()
                },
                None,
            )
            .map_err(vk_error)?;
        let layouts = [layout.handle()];
        let set = match device.allocate_descriptor_sets(&vk::DescriptorSetAllocateInfo {
            descriptor_pool: pool,
            descriptor_set_count: 1,
            p_set_layouts: layouts.as_ptr(),
            ..Default::default()
        }) {
            Ok(mut sets) => sets.pop(),
            Err(result) => {
                device.destroy_descriptor_pool(pool, None);
                return Err(vk_error(result));
            }
        };
        let Some(set) = set else {
            device.destroy_descriptor_pool(pool, None);
            return Err(GPUError::Backend("descriptor set allocation returned nothing".to_string()));
        };

        // The infos have to stay at a fixed address until the update call.
        let mut buffer_infos = SmallVec::<[vk::DescriptorBufferInfo; 8]>::with_capacity(resources.len());
        let mut image_infos = SmallVec::<[vk::DescriptorImageInfo; 8]>::with_capacity(resources.len());
        for resource in resources {
            match resource {
                BindingResource::UniformBuffer { buffer, offset, length }
                | BindingResource::StorageBuffer { buffer, offset, length } => {
                    buffer_infos.push(vk::DescriptorBufferInfo {
                        buffer: buffer.handle(),
                        offset: *offset,
                        range: *length,
                    });
                }
                BindingResource::SampledTexture(view) => image_infos.push(vk::DescriptorImageInfo {
                    sampler: vk::Sampler::null(),
                    image_view: view.handle(),
                    image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                }),
                BindingResource::StorageTexture(view) => image_infos.push(vk::DescriptorImageInfo {
                    sampler: vk::Sampler::null(),
                    image_view: view.handle(),
                    image_layout: vk::ImageLayout::GENERAL,
                }),
                BindingResource::Sampler(sampler) => image_infos.push(vk::DescriptorImageInfo {
                    sampler: sampler.handle(),
                    image_view: vk::ImageView::null(),
                    image_layout: vk::ImageLayout::UNDEFINED,
                }),
            }
        }

        let mut writes = SmallVec::<[vk::WriteDescriptorSet; 8]>::with_capacity(resources.len());
        let (mut buffer_index, mut image_index) = (0usize, 0usize);
        for (binding, resource) in resources.iter().enumerate() {
            let mut write = vk::WriteDescriptorSet {
                dst_set: set,
                dst_binding: binding as u32,
                dst_array_element: 0,
                descriptor_count: 1,
                descriptor_type: descriptor_type(resource.kind()),
                ..Default::default()
            };
            match resource {
                BindingResource::UniformBuffer { .. } | BindingResource::StorageBuffer { .. } => {
                    write.p_buffer_info = &buffer_infos[buffer_index];
                    buffer_index += 1;
                }
                _ => {
                    write.p_image_info = &image_infos[image_index];
                    image_index += 1;
                }
            }
            writes.push(write);
        }
        device.update_descriptor_sets(&writes, &[]);

        Ok(Self {
            pool,
            set,
            device: device.clone(),
        })
    }

    pub fn handle(&self) -> vk::DescriptorSet {
        self.set
    }
}

impl Drop for VkResourceSet {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

fn descriptor_type(kind: ResourceKind) -> vk::DescriptorType {
    match kind {
        ResourceKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        ResourceKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        ResourceKind::SampledTexture => vk::DescriptorType::SAMPLED_IMAGE,
        ResourceKind::StorageTexture => vk::DescriptorType::STORAGE_IMAGE,
        ResourceKind::Sampler => vk::DescriptorType::SAMPLER,
    }
}

fn shader_stages_to_vk(stages: ShaderStages) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStages::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(ShaderStages::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    if stages.contains(ShaderStages::COMPUTE) {
        flags |= vk::ShaderStageFlags::COMPUTE;
    }
    flags
}
