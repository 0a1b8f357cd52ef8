#![allow(dead_code)]

use std::sync::Arc;

use emberline_engine::graphics::gpu::*;
use emberline_engine::graphics::{
    Buffer,
    CommandRecorder,
    CommandRecorderInfo,
    Device,
    Framebuffer,
    FramebufferAttachment,
    Pipeline,
    ResourceBinding,
    ResourceLayout,
    ResourceSet,
    Texture,
    TextureCopy,
};
use emberline_software::{
    SoftwareBackend,
    SoftwareDevice,
    SoftwarePipeline,
    SoftwarePipelineInfo,
};

pub type B = SoftwareBackend;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn device() -> Arc<Device<B>> {
    init_logging();
    Device::new(SoftwareDevice::new())
}

pub fn recorder(device: &Arc<Device<B>>) -> CommandRecorder<B> {
    device.create_command_recorder(CommandRecorderInfo {
        name: Some("test".to_string()),
    })
}

pub fn texture_info(dimension: TextureDimension, format: Format, width: u32, height: u32, usage: TextureUsage) -> TextureInfo {
    TextureInfo {
        dimension,
        format,
        width,
        height,
        depth: 1,
        mip_levels: 1,
        array_length: 1,
        samples: SampleCount::Samples1,
        usage,
    }
}

pub fn render_target(device: &Arc<Device<B>>, format: Format, width: u32, height: u32) -> Arc<Texture<B>> {
    let usage = if format.is_depth() {
        TextureUsage::DEPTH_STENCIL | TextureUsage::COPY_SRC
    } else {
        TextureUsage::RENDER_TARGET | TextureUsage::COPY_SRC | TextureUsage::SAMPLED
    };
    device
        .create_texture(&texture_info(TextureDimension::Dim2D, format, width, height, usage), Some("RenderTarget"))
        .unwrap()
}

pub fn staging_texture(device: &Arc<Device<B>>, info: &TextureInfo) -> Arc<Texture<B>> {
    let mut info = *info;
    info.usage = TextureUsage::STAGING | TextureUsage::COPY_SRC | TextureUsage::COPY_DST;
    info.samples = SampleCount::Samples1;
    device.create_texture(&info, Some("Staging")).unwrap()
}

pub fn framebuffer(
    device: &Arc<Device<B>>,
    color_targets: &[&Arc<Texture<B>>],
    depth_target: Option<&Arc<Texture<B>>>,
) -> Arc<Framebuffer<B>> {
    let colors: Vec<FramebufferAttachment<B>> = color_targets
        .iter()
        .map(|texture| FramebufferAttachment::new(texture))
        .collect();
    let depth = depth_target.map(FramebufferAttachment::new);
    device.create_framebuffer(&colors, depth.as_ref()).unwrap()
}

pub fn pipeline(
    device: &Arc<Device<B>>,
    bind_point: BindPoint,
    resource_set_count: u32,
    scissor_test_enabled: bool,
) -> Arc<Pipeline<B>> {
    device.import_pipeline(
        SoftwarePipeline::new(SoftwarePipelineInfo {
            bind_point,
            resource_set_count,
            scissor_test_enabled,
        }),
        Some("TestPipeline"),
    )
}

pub fn uniform_buffer(device: &Arc<Device<B>>, size: u64) -> Arc<Buffer<B>> {
    device
        .create_buffer(
            &BufferInfo {
                size,
                usage: BufferUsage::CONSTANT | BufferUsage::COPY_DST,
                memory_usage: MemoryUsage::GPUOnly,
            },
            Some("Uniforms"),
        )
        .unwrap()
}

pub fn readback_buffer(device: &Arc<Device<B>>, size: u64) -> Arc<Buffer<B>> {
    device
        .create_buffer(
            &BufferInfo {
                size,
                usage: BufferUsage::COPY_DST | BufferUsage::COPY_SRC,
                memory_usage: MemoryUsage::GPUToCPU,
            },
            Some("Readback"),
        )
        .unwrap()
}

pub fn uniform_layout(device: &Arc<Device<B>>) -> Arc<ResourceLayout<B>> {
    device
        .create_resource_layout(&ResourceLayoutInfo {
            elements: &[ResourceLayoutElement {
                kind: ResourceKind::UniformBuffer,
                stages: ShaderStages::VERTEX | ShaderStages::FRAGMENT | ShaderStages::COMPUTE,
            }],
        })
        .unwrap()
}

pub fn uniform_set(device: &Arc<Device<B>>, layout: &Arc<ResourceLayout<B>>, buffer: &Arc<Buffer<B>>) -> Arc<ResourceSet<B>> {
    device
        .create_resource_set(
            layout,
            &[ResourceBinding::UniformBuffer {
                buffer: buffer.clone(),
                offset: 0,
                length: buffer.info().size,
            }],
        )
        .unwrap()
}

pub fn submit_and_wait(device: &Arc<Device<B>>, recorder: &mut CommandRecorder<B>) {
    recorder.end().unwrap();
    device.submit_commands(recorder).unwrap();
    device.wait_for_idle();
}

/// Copies mip 0 of `texture` into a new staging texture and reads it back.
pub fn read_back(device: &Arc<Device<B>>, recorder: &mut CommandRecorder<B>, texture: &Arc<Texture<B>>) -> Vec<u8> {
    let info = *texture.info();
    let staging = staging_texture(device, &info);
    recorder.begin().unwrap();
    recorder
        .copy_texture(
            texture,
            &staging,
            &TextureCopy::whole_texture(Extent3D {
                width: info.width,
                height: info.height,
                depth: info.depth,
            }),
        )
        .unwrap();
    submit_and_wait(device, recorder);
    device.read_texture(&staging, 0, 0).unwrap()
}

/// Creates a texture and fills mip 0 of it through a staging upload.
pub fn uploaded_texture(
    device: &Arc<Device<B>>,
    recorder: &mut CommandRecorder<B>,
    info: &TextureInfo,
    data: &[u8],
) -> Arc<Texture<B>> {
    let texture = device.create_texture(info, Some("Uploaded")).unwrap();
    let staging = staging_texture(device, info);
    device.write_texture(&staging, 0, 0, data).unwrap();
    recorder.begin().unwrap();
    recorder
        .copy_texture(
            &staging,
            &texture,
            &TextureCopy::whole_texture(Extent3D {
                width: info.width,
                height: info.height,
                depth: info.depth,
            }),
        )
        .unwrap();
    submit_and_wait(device, recorder);
    texture
}

pub fn rgba32_texels(bytes: &[u8]) -> Vec<[f32; 4]> {
    bytes
        .chunks_exact(16)
        .map(|texel| {
            let mut value = [0f32; 4];
            for (channel, bytes) in value.iter_mut().zip(texel.chunks_exact(4)) {
                *channel = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            value
        })
        .collect()
}

pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|index| (index as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

pub fn assert_no_violations(device: &Arc<Device<B>>) {
    let violations = device.handle().violations();
    assert!(violations.is_empty(), "{:?}", violations);
}
