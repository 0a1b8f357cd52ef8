use std::hash::{
    Hash,
    Hasher,
};
use std::sync::Arc;

use ash::vk;
use log::warn;
use smallvec::SmallVec;

use emberline_core::gpu::{
    AddressMode,
    Filter,
    GPUError,
    MappedSubresource,
    MemoryUsage,
    SamplerInfo,
    Texture,
    TextureDimension,
    TextureInfo,
    TextureUsage,
    TextureViewInfo,
};

use crate::memory::VkMemory;
use crate::{
    aspect_mask,
    format_to_vk,
    samples_to_vk,
    vk_error,
    RawVkDevice,
    VkImage,
};

/// Regular textures are backed by a single optimally tiled image. Staging
/// textures get one linear, host visible image per subresource so every
/// subresource can be mapped on its own.
pub struct VkTexture {
    images: SmallVec<[Arc<VkImage>; 1]>,
    device: Arc<RawVkDevice>,
    info: TextureInfo,
}

impl VkTexture {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>, info: &TextureInfo) -> Result<Self, GPUError> {
        let mut images = SmallVec::<[Arc<VkImage>; 1]>::new();
        if info.is_staging() {
            for _ in 0..info.array_length {
                for mip_level in 0..info.mip_levels {
                    let extent = info.mip_extent(mip_level);
                    let create_info = vk::ImageCreateInfo {
                        image_type: image_type(info.dimension),
                        format: format_to_vk(info.format),
                        extent: vk::Extent3D {
                            width: extent.width,
                            height: extent.height,
                            depth: extent.depth,
                        },
                        mip_levels: 1,
                        array_layers: 1,
                        samples: vk::SampleCountFlags::TYPE_1,
                        tiling: vk::ImageTiling::LINEAR,
                        usage: vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST,
                        sharing_mode: vk::SharingMode::EXCLUSIVE,
                        initial_layout: vk::ImageLayout::PREINITIALIZED,
                        ..Default::default()
                    };
                    images.push(Arc::new(create_image(
                        device,
                        info,
                        &create_info,
                        MemoryUsage::GPUToCPU,
                        1,
                        1,
                    )?));
                }
            }
        } else {
            let create_info = vk::ImageCreateInfo {
                image_type: image_type(info.dimension),
                format: format_to_vk(info.format),
                extent: vk::Extent3D {
                    width: info.width.max(1),
                    height: info.height.max(1),
                    depth: info.depth.max(1),
                },
                mip_levels: info.mip_levels,
                array_layers: info.array_length,
                samples: samples_to_vk(info.samples),
                tiling: vk::ImageTiling::OPTIMAL,
                usage: texture_usage_to_vk(info.usage),
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                ..Default::default()
            };
            images.push(Arc::new(create_image(
                device,
                info,
                &create_info,
                MemoryUsage::GPUOnly,
                info.mip_levels,
                info.array_length,
            )?));
        }

        Ok(Self {
            images,
            device: device.clone(),
            info: *info,
        })
    }

    /// The image that holds the given subresource together with the
    /// subresource's mip level and array layer inside of that image.
    pub(crate) fn image_for(&self, mip_level: u32, array_layer: u32) -> Option<(&Arc<VkImage>, u32, u32)> {
        if self.info.is_staging() {
            self.images
                .get(self.info.subresource_index(mip_level, array_layer) as usize)
                .map(|image| (image, 0, 0))
        } else {
            self.images.first().map(|image| (image, mip_level, array_layer))
        }
    }

    /// Image of a staging subresource by flat index.
    pub(crate) fn staging_image(&self, index: u32) -> Option<&Arc<VkImage>> {
        if self.info.is_staging() {
            self.images.get(index as usize)
        } else {
            None
        }
    }

    pub fn handle(&self) -> vk::Image {
        self.images.first().map_or(vk::Image::null(), |image| image.image)
    }
}

unsafe fn create_image(
    device: &Arc<RawVkDevice>,
    info: &TextureInfo,
    create_info: &vk::ImageCreateInfo,
    memory_usage: MemoryUsage,
    mip_levels: u32,
    array_layers: u32,
) -> Result<VkImage, GPUError> {
    let image = device.create_image(create_info, None).map_err(vk_error)?;
    let requirements = device.get_image_memory_requirements(image);
    let memory = match VkMemory::allocate(device, &requirements, memory_usage) {
        Ok(memory) => memory,
        Err(error) => {
            device.destroy_image(image, None);
            return Err(error);
        }
    };
    if let Err(result) = device.bind_image_memory(image, memory.memory, 0) {
        device.destroy_image(image, None);
        memory.free(device);
        return Err(vk_error(result));
    }
    Ok(VkImage::new(
        device,
        image,
        memory,
        info.format,
        mip_levels,
        array_layers,
        create_info.initial_layout,
    ))
}

fn image_type(dimension: TextureDimension) -> vk::ImageType {
    match dimension {
        TextureDimension::Dim1D => vk::ImageType::TYPE_1D,
        TextureDimension::Dim2D => vk::ImageType::TYPE_2D,
        TextureDimension::Dim3D => vk::ImageType::TYPE_3D,
    }
}

fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();

    if usage.contains(TextureUsage::STORAGE) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }

    if usage.contains(TextureUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }

    if usage.intersects(TextureUsage::COPY_SRC | TextureUsage::RESOLVE_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }

    if usage.intersects(TextureUsage::COPY_DST | TextureUsage::RESOLVE_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }

    if usage.contains(TextureUsage::DEPTH_STENCIL) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }

    if usage.contains(TextureUsage::RENDER_TARGET) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }

    flags
}

impl Texture for VkTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    unsafe fn map_subresource(&self, subresource: u32) -> Option<MappedSubresource> {
        let image = self.staging_image(subresource)?;
        let memory = image.memory()?;
        let layout = self.device.get_image_subresource_layout(
            image.image,
            vk::ImageSubresource {
                aspect_mask: aspect_mask(self.info.format),
                mip_level: 0,
                array_layer: 0,
            },
        );
        let data = match self
            .device
            .map_memory(memory.memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
        {
            Ok(data) => data,
            Err(result) => {
                warn!("Mapping staging texture memory failed: {:?}", result);
                return None;
            }
        };
        if !memory.is_coherent() {
            let range = vk::MappedMemoryRange {
                memory: memory.memory,
                offset: 0,
                size: vk::WHOLE_SIZE,
                ..Default::default()
            };
            if let Err(result) = self.device.invalidate_mapped_memory_ranges(&[range]) {
                warn!("Invalidating staging texture memory failed: {:?}", result);
            }
        }
        Some(MappedSubresource {
            data: data.cast::<u8>().add(layout.offset as usize),
            size: layout.size,
            row_pitch: layout.row_pitch,
            depth_pitch: layout.depth_pitch,
        })
    }

    unsafe fn unmap_subresource(&self, subresource: u32) {
        let Some(memory) = self.staging_image(subresource).and_then(|image| image.memory()) else {
            return;
        };
        if !memory.is_coherent() {
            let range = vk::MappedMemoryRange {
                memory: memory.memory,
                offset: 0,
                size: vk::WHOLE_SIZE,
                ..Default::default()
            };
            if let Err(result) = self.device.flush_mapped_memory_ranges(&[range]) {
                warn!("Flushing staging texture memory failed: {:?}", result);
            }
        }
        self.device.unmap_memory(memory.memory);
    }
}

impl Hash for VkTexture {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle().hash(state);
    }
}

impl PartialEq for VkTexture {
    fn eq(&self, other: &Self) -> bool {
        self.handle() == other.handle()
    }
}

impl Eq for VkTexture {}

pub struct VkTextureView {
    view: vk::ImageView,
    _image: Arc<VkImage>,
    device: Arc<RawVkDevice>,
    info: TextureViewInfo,
}

impl VkTextureView {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>, texture: &VkTexture, info: &TextureViewInfo) -> Result<Self, GPUError> {
        let Some((image, _, _)) = texture.image_for(0, 0) else {
            return Err(GPUError::Unsupported("texture has no image"));
        };
        if texture.info().is_staging() {
            return Err(GPUError::Unsupported("views of staging textures"));
        }
        let format = info.format.unwrap_or(texture.info().format);
        let view_type = match (texture.info().dimension, info.array_layer_length > 1) {
            (TextureDimension::Dim1D, false) => vk::ImageViewType::TYPE_1D,
            (TextureDimension::Dim1D, true) => vk::ImageViewType::TYPE_1D_ARRAY,
            (TextureDimension::Dim2D, false) => vk::ImageViewType::TYPE_2D,
            (TextureDimension::Dim2D, true) => vk::ImageViewType::TYPE_2D_ARRAY,
            (TextureDimension::Dim3D, _) => vk::ImageViewType::TYPE_3D,
        };
        let view_create_info = vk::ImageViewCreateInfo {
            image: image.image,
            view_type,
            format: format_to_vk(format),
            components: vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            },
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: aspect_mask(format),
                base_mip_level: info.base_mip_level,
                level_count: info.mip_level_length,
                base_array_layer: info.base_array_layer,
                layer_count: info.array_layer_length,
            },
            ..Default::default()
        };
        let view = device.create_image_view(&view_create_info, None).map_err(vk_error)?;
        Ok(Self {
            view,
            _image: image.clone(),
            device: device.clone(),
            info: *info,
        })
    }

    pub fn handle(&self) -> vk::ImageView {
        self.view
    }

    pub fn info(&self) -> &TextureViewInfo {
        &self.info
    }
}

impl Drop for VkTextureView {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
        }
    }
}

pub struct VkSampler {
    sampler: vk::Sampler,
    device: Arc<RawVkDevice>,
}

impl VkSampler {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>, info: &SamplerInfo) -> Result<Self, GPUError> {
        let sampler_create_info = vk::SamplerCreateInfo {
            mag_filter: filter_to_vk(info.mag_filter),
            min_filter: filter_to_vk(info.min_filter),
            mipmap_mode: filter_to_vk_mip(info.mip_filter),
            address_mode_u: address_mode_to_vk(info.address_mode_u),
            address_mode_v: address_mode_to_vk(info.address_mode_v),
            address_mode_w: address_mode_to_vk(info.address_mode_w),
            mip_lod_bias: info.mip_bias,
            min_lod: info.min_lod,
            max_lod: info.max_lod.unwrap_or(vk::LOD_CLAMP_NONE),
            border_color: vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
            ..Default::default()
        };
        let sampler = device.create_sampler(&sampler_create_info, None).map_err(vk_error)?;
        Ok(Self {
            sampler,
            device: device.clone(),
        })
    }

    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for VkSampler {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
    }
}

fn filter_to_vk(filter: Filter) -> vk::Filter {
    match filter {
        Filter::Linear => vk::Filter::LINEAR,
        Filter::Nearest => vk::Filter::NEAREST,
    }
}

fn filter_to_vk_mip(filter: Filter) -> vk::SamplerMipmapMode {
    match filter {
        Filter::Linear => vk::SamplerMipmapMode::LINEAR,
        Filter::Nearest => vk::SamplerMipmapMode::NEAREST,
    }
}

fn address_mode_to_vk(address_mode: AddressMode) -> vk::SamplerAddressMode {
    match address_mode {
        AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        AddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        AddressMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
    }
}
