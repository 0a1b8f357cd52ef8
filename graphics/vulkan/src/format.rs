use ash::vk;

use emberline_core::gpu::{
    Format,
    SampleCount,
};

pub fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::Unknown => vk::Format::UNDEFINED,
        Format::R8UNorm => vk::Format::R8_UNORM,
        Format::RG8UNorm => vk::Format::R8G8_UNORM,
        Format::RGBA8UNorm => vk::Format::R8G8B8A8_UNORM,
        Format::RGBA8Srgb => vk::Format::R8G8B8A8_SRGB,
        Format::BGRA8UNorm => vk::Format::B8G8R8A8_UNORM,
        Format::R16Float => vk::Format::R16_SFLOAT,
        Format::R16UInt => vk::Format::R16_UINT,
        Format::RG16Float => vk::Format::R16G16_SFLOAT,
        Format::RGBA16Float => vk::Format::R16G16B16A16_SFLOAT,
        Format::R32Float => vk::Format::R32_SFLOAT,
        Format::R32UInt => vk::Format::R32_UINT,
        Format::RG32Float => vk::Format::R32G32_SFLOAT,
        Format::RGBA32Float => vk::Format::R32G32B32A32_SFLOAT,
        Format::D16 => vk::Format::D16_UNORM,
        Format::D32 => vk::Format::D32_SFLOAT,
        Format::D24S8 => vk::Format::D24_UNORM_S8_UINT,
        Format::D32S8 => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

pub fn samples_to_vk(samples: SampleCount) -> vk::SampleCountFlags {
    match samples {
        SampleCount::Samples1 => vk::SampleCountFlags::TYPE_1,
        SampleCount::Samples2 => vk::SampleCountFlags::TYPE_2,
        SampleCount::Samples4 => vk::SampleCountFlags::TYPE_4,
        SampleCount::Samples8 => vk::SampleCountFlags::TYPE_8,
    }
}

pub fn aspect_mask(format: Format) -> vk::ImageAspectFlags {
    if format.is_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_formats_use_depth_aspects() {
        assert_eq!(aspect_mask(Format::D32), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            aspect_mask(Format::D24S8),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(aspect_mask(Format::RGBA32Float), vk::ImageAspectFlags::COLOR);
    }
}
