use emberline_core::gpu::{
    ClearColor,
    DepthStencilValue,
    Format,
};
use half::f16;
use smallvec::SmallVec;

pub(crate) type Texel = SmallVec<[u8; 16]>;

fn unorm8(value: f32) -> u8 {
    (value.clamp(0f32, 1f32) * 255f32).round() as u8
}

pub(crate) fn encode_color(format: Format, color: &ClearColor) -> Texel {
    let mut texel = Texel::new();
    let channels = color.as_array();
    match format {
        Format::R8UNorm => texel.push(unorm8(color.r)),
        Format::RG8UNorm => texel.extend([unorm8(color.r), unorm8(color.g)]),
        Format::RGBA8UNorm | Format::RGBA8Srgb => texel.extend(channels.iter().map(|c| unorm8(*c))),
        Format::BGRA8UNorm => texel.extend([unorm8(color.b), unorm8(color.g), unorm8(color.r), unorm8(color.a)]),
        Format::R16Float => texel.extend_from_slice(&f16::from_f32(color.r).to_le_bytes()),
        Format::R16UInt => texel.extend_from_slice(&(color.r as u16).to_le_bytes()),
        Format::RG16Float => {
            for channel in &channels[..2] {
                texel.extend_from_slice(&f16::from_f32(*channel).to_le_bytes());
            }
        }
        Format::RGBA16Float => {
            for channel in &channels {
                texel.extend_from_slice(&f16::from_f32(*channel).to_le_bytes());
            }
        }
        Format::R32Float => texel.extend_from_slice(&color.r.to_le_bytes()),
        Format::R32UInt => texel.extend_from_slice(&(color.r as u32).to_le_bytes()),
        Format::RG32Float => {
            for channel in &channels[..2] {
                texel.extend_from_slice(&channel.to_le_bytes());
            }
        }
        Format::RGBA32Float => {
            for channel in &channels {
                texel.extend_from_slice(&channel.to_le_bytes());
            }
        }
        Format::Unknown | Format::D16 | Format::D32 | Format::D24S8 | Format::D32S8 => {}
    }
    texel
}

pub(crate) fn encode_depth_stencil(format: Format, value: &DepthStencilValue) -> Texel {
    let mut texel = Texel::new();
    let depth = value.depth.clamp(0f32, 1f32);
    match format {
        Format::D16 => texel.extend_from_slice(&((depth * u16::MAX as f32).round() as u16).to_le_bytes()),
        Format::D32 => texel.extend_from_slice(&depth.to_le_bytes()),
        Format::D24S8 => {
            let packed = ((depth * 0xFFFFFF as f32).round() as u32) | ((value.stencil as u32) << 24);
            texel.extend_from_slice(&packed.to_le_bytes());
        }
        Format::D32S8 => {
            texel.extend_from_slice(&depth.to_le_bytes());
            texel.extend([value.stencil, 0, 0, 0]);
        }
        _ => {}
    }
    texel
}
