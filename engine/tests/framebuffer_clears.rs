mod common;

use common::*;
use emberline_engine::graphics::gpu::*;
use emberline_engine::graphics::CommandError;
use emberline_software::ExecutedCommand;

#[test]
fn clear_color_target_to_red() {
    let device = device();
    let mut recorder = recorder(&device);
    let target = render_target(&device, Format::RGBA32Float, 1024, 1024);
    let framebuffer = framebuffer(&device, &[&target], None);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.clear_color_target(0, ClearColor::RED).unwrap();
    submit_and_wait(&device, &mut recorder);

    let texels = rgba32_texels(&read_back(&device, &mut recorder, &target));
    assert_eq!(texels.len(), 1024 * 1024);
    assert!(texels.iter().all(|texel| *texel == [1.0, 0.0, 0.0, 1.0]));
    assert_no_violations(&device);
}

#[test]
fn clear_depth_target() {
    let device = device();
    let mut recorder = recorder(&device);
    let depth = render_target(&device, Format::D32, 64, 64);
    let framebuffer = framebuffer(&device, &[], Some(&depth));

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.clear_depth_stencil(0.25, 0).unwrap();
    submit_and_wait(&device, &mut recorder);

    let data = read_back(&device, &mut recorder, &depth);
    assert!(data
        .chunks_exact(4)
        .all(|texel| f32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]) == 0.25));
    assert_no_violations(&device);
}

#[test]
fn invalid_clears_fail_without_side_effects() {
    let device = device();
    let mut recorder = recorder(&device);
    let first = render_target(&device, Format::RGBA32Float, 16, 16);
    let second = render_target(&device, Format::RGBA32Float, 16, 16);
    let color_only = framebuffer(&device, &[&first, &second], None);
    let depth = render_target(&device, Format::D32, 16, 16);
    let depth_only = framebuffer(&device, &[], Some(&depth));

    recorder.begin().unwrap();
    assert_eq!(recorder.clear_color_target(0, ClearColor::RED), Err(CommandError::NoFramebuffer));
    assert_eq!(recorder.clear_depth_stencil(1.0, 0), Err(CommandError::NoFramebuffer));

    recorder.set_framebuffer(&depth_only).unwrap();
    assert_eq!(recorder.clear_color_target(0, ClearColor::RED), Err(CommandError::NoColorTarget));

    recorder.set_framebuffer(&color_only).unwrap();
    assert_eq!(recorder.clear_depth_stencil(1.0, 0), Err(CommandError::NoDepthTarget));
    for index in [2, 3] {
        assert_eq!(
            recorder.clear_color_target(index, ClearColor::BLUE),
            Err(CommandError::ColorTargetOutOfRange { index, count: 2 })
        );
    }

    recorder.clear_color_target(0, ClearColor::GREEN).unwrap();
    recorder.clear_color_target(1, ClearColor::BLUE).unwrap();
    submit_and_wait(&device, &mut recorder);

    let first_texels = rgba32_texels(&read_back(&device, &mut recorder, &first));
    assert!(first_texels.iter().all(|texel| *texel == [0.0, 1.0, 0.0, 1.0]));
    let second_texels = rgba32_texels(&read_back(&device, &mut recorder, &second));
    assert!(second_texels.iter().all(|texel| *texel == [0.0, 0.0, 1.0, 1.0]));
    assert_no_violations(&device);
}

fn render_pass_commands(commands: Vec<ExecutedCommand>) -> Vec<ExecutedCommand> {
    commands
        .into_iter()
        .filter(|command| {
            matches!(
                command,
                ExecutedCommand::BeginRenderPass { .. }
                    | ExecutedCommand::EndRenderPass
                    | ExecutedCommand::ClearAttachment(_)
                    | ExecutedCommand::Draw
            )
        })
        .collect()
}

#[test]
fn clearing_every_attachment_uses_a_clearing_pass() {
    let device = device();
    let mut recorder = recorder(&device);
    let color = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let depth = render_target(&device, Format::D32, 8, 8);
    let framebuffer = framebuffer(&device, &[&color], Some(&depth));
    let pipeline = pipeline(&device, BindPoint::Graphics, 0, true);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.clear_color_target(0, ClearColor::BLACK).unwrap();
    recorder.clear_depth_stencil(1.0, 0).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    submit_and_wait(&device, &mut recorder);

    assert_eq!(
        render_pass_commands(device.handle().take_executed_commands()),
        vec![
            ExecutedCommand::BeginRenderPass {
                load_op: LoadOp::Clear,
                clear_value_count: 2,
            },
            ExecutedCommand::Draw,
            ExecutedCommand::EndRenderPass,
        ]
    );
    assert_no_violations(&device);
}

#[test]
fn partial_clears_only_touch_cleared_attachments() {
    let device = device();
    let mut recorder = recorder(&device);
    let color = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let depth = render_target(&device, Format::D32, 8, 8);
    let framebuffer = framebuffer(&device, &[&color], Some(&depth));
    let pipeline = pipeline(&device, BindPoint::Graphics, 0, true);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.clear_color_target(0, ClearColor::RED).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    submit_and_wait(&device, &mut recorder);

    assert_eq!(
        render_pass_commands(device.handle().take_executed_commands()),
        vec![
            ExecutedCommand::BeginRenderPass {
                load_op: LoadOp::Load,
                clear_value_count: 0,
            },
            ExecutedCommand::ClearAttachment(ClearAttachment::Color {
                index: 0,
                color: ClearColor::RED,
            }),
            ExecutedCommand::Draw,
            ExecutedCommand::EndRenderPass,
        ]
    );

    let texels = read_back(&device, &mut recorder, &color);
    assert!(texels.chunks_exact(4).all(|texel| texel == [255, 0, 0, 255]));
    assert_no_violations(&device);
}

#[test]
fn clears_inside_an_active_pass_are_immediate() {
    let device = device();
    let mut recorder = recorder(&device);
    let color = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let framebuffer = framebuffer(&device, &[&color], None);
    let pipeline = pipeline(&device, BindPoint::Graphics, 0, true);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.clear_color_target(0, ClearColor::GREEN).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    submit_and_wait(&device, &mut recorder);

    assert_eq!(
        render_pass_commands(device.handle().take_executed_commands()),
        vec![
            ExecutedCommand::BeginRenderPass {
                load_op: LoadOp::Load,
                clear_value_count: 0,
            },
            ExecutedCommand::Draw,
            ExecutedCommand::ClearAttachment(ClearAttachment::Color {
                index: 0,
                color: ClearColor::GREEN,
            }),
            ExecutedCommand::Draw,
            ExecutedCommand::EndRenderPass,
        ]
    );
    assert_no_violations(&device);
}

#[test]
fn switching_framebuffers_ends_the_pass_with_a_barrier() {
    let device = device();
    let mut recorder = recorder(&device);
    let first_target = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let second_target = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let first = framebuffer(&device, &[&first_target], None);
    let second = framebuffer(&device, &[&second_target], None);
    let pipeline = pipeline(&device, BindPoint::Graphics, 0, true);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&first).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.set_framebuffer(&second).unwrap();
    recorder.clear_color_target(0, ClearColor::BLUE).unwrap();
    submit_and_wait(&device, &mut recorder);

    let commands: Vec<ExecutedCommand> = device
        .handle()
        .take_executed_commands()
        .into_iter()
        .filter(|command| {
            matches!(
                command,
                ExecutedCommand::BeginRenderPass { .. } | ExecutedCommand::EndRenderPass | ExecutedCommand::RenderPassBarrier
            )
        })
        .collect();
    assert_eq!(
        commands,
        vec![
            ExecutedCommand::BeginRenderPass {
                load_op: LoadOp::Load,
                clear_value_count: 0,
            },
            ExecutedCommand::EndRenderPass,
            ExecutedCommand::RenderPassBarrier,
            ExecutedCommand::BeginRenderPass {
                load_op: LoadOp::Clear,
                clear_value_count: 1,
            },
            ExecutedCommand::EndRenderPass,
        ]
    );

    let texels = read_back(&device, &mut recorder, &second_target);
    assert!(texels.chunks_exact(4).all(|texel| texel == [0, 0, 255, 255]));
    assert_no_violations(&device);
}

#[test]
fn resolve_multisampled_target() {
    let device = device();
    let mut recorder = recorder(&device);
    let mut info = texture_info(
        TextureDimension::Dim2D,
        Format::RGBA8UNorm,
        32,
        32,
        TextureUsage::RENDER_TARGET | TextureUsage::RESOLVE_SRC,
    );
    info.samples = SampleCount::Samples4;
    let multisampled = device.create_texture(&info, Some("Multisampled")).unwrap();
    let resolved = device
        .create_texture(
            &texture_info(
                TextureDimension::Dim2D,
                Format::RGBA8UNorm,
                32,
                32,
                TextureUsage::RESOLVE_DST | TextureUsage::COPY_SRC,
            ),
            Some("Resolved"),
        )
        .unwrap();
    let framebuffer = framebuffer(&device, &[&multisampled], None);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.clear_color_target(0, ClearColor::GREEN).unwrap();
    recorder.end().unwrap();
    device.submit_commands(&mut recorder).unwrap();

    recorder.begin().unwrap();
    recorder.resolve_texture(&multisampled, &resolved).unwrap();
    submit_and_wait(&device, &mut recorder);

    let texels = read_back(&device, &mut recorder, &resolved);
    assert!(texels.chunks_exact(4).all(|texel| texel == [0, 255, 0, 255]));
    assert_no_violations(&device);
}

#[test]
fn clears_queued_after_a_copy_are_applied_at_end() {
    let device = device();
    let mut recorder = recorder(&device);
    let target = render_target(&device, Format::RGBA32Float, 8, 8);
    let framebuffer = framebuffer(&device, &[&target], None);
    let pipeline = pipeline(&device, BindPoint::Graphics, 0, true);
    let src = readback_buffer(&device, 16);
    let dst = readback_buffer(&device, 16);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.clear_color_target(0, ClearColor::RED).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.copy_buffer(&src, 0, &dst, 0, 16).unwrap();
    recorder.clear_color_target(0, ClearColor::BLUE).unwrap();
    submit_and_wait(&device, &mut recorder);

    let texels = rgba32_texels(&read_back(&device, &mut recorder, &target));
    assert!(texels.iter().all(|texel| *texel == [0.0, 0.0, 1.0, 1.0]));
    assert_no_violations(&device);
}

#[test]
fn framebuffer_without_attachments_is_rejected() {
    let device = device();
    assert!(matches!(
        device.create_framebuffer(&[], None),
        Err(GPUError::Unsupported(_))
    ));
}
