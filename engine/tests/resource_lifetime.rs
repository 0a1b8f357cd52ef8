mod common;

use common::*;
use emberline_engine::graphics::gpu::*;
use emberline_engine::graphics::{
    TextureCopy,
    TrackedResource,
};

#[test]
fn buffer_dropped_while_in_flight_outlives_the_submission() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = readback_buffer(&device, 256);
    let probe = buffer.handle().probe();

    recorder.begin().unwrap();
    recorder.update_buffer(&buffer, 0, &pattern(256, 1)).unwrap();
    recorder.end().unwrap();
    device.submit_commands(&mut recorder).unwrap();
    assert_eq!(buffer.reference_tracker().count(), 1);

    drop(buffer);
    device.flush_deferred_destruction();
    assert!(!probe.is_destroyed());
    assert_eq!(device.retired_resource_count(), 1);

    // Executed but not yet observed by the recorder.
    assert!(device.handle().execute_next());
    device.flush_deferred_destruction();
    assert!(!probe.is_destroyed());

    recorder.begin().unwrap();
    assert!(probe.is_destroyed());
    assert_eq!(device.retired_resource_count(), 0);
    assert_no_violations(&device);
}

#[test]
fn dispose_before_submission_is_deferred() {
    let device = device();
    let mut recorder = recorder(&device);
    let info = texture_info(
        TextureDimension::Dim2D,
        Format::RGBA8UNorm,
        16,
        16,
        TextureUsage::COPY_SRC | TextureUsage::COPY_DST,
    );
    let src = device.create_texture(&info, Some("Source")).unwrap();
    let dst = device.create_texture(&info, Some("Destination")).unwrap();
    let src_probe = src.handle().probe();
    let dst_probe = dst.handle().probe();

    recorder.begin().unwrap();
    recorder
        .copy_texture(
            &src,
            &dst,
            &TextureCopy::whole_texture(Extent3D {
                width: 16,
                height: 16,
                depth: 1,
            }),
        )
        .unwrap();
    drop(src);
    drop(dst);
    device.flush_deferred_destruction();
    assert!(!src_probe.is_destroyed());

    recorder.end().unwrap();
    device.submit_commands(&mut recorder).unwrap();
    assert!(!src_probe.is_destroyed());
    assert!(!dst_probe.is_destroyed());

    device.wait_for_idle();
    assert!(!src_probe.is_destroyed());

    recorder.begin().unwrap();
    assert!(src_probe.is_destroyed());
    assert!(dst_probe.is_destroyed());
    assert_no_violations(&device);
}

#[test]
fn resource_shared_by_two_submissions_waits_for_both() {
    let device = device();
    let mut first = recorder(&device);
    let mut second = recorder(&device);
    let buffer = readback_buffer(&device, 64);
    let probe = buffer.handle().probe();

    for recorder in [&mut first, &mut second] {
        recorder.begin().unwrap();
        recorder.update_buffer(&buffer, 0, &pattern(64, 7)).unwrap();
        recorder.end().unwrap();
        device.submit_commands(recorder).unwrap();
    }
    assert_eq!(buffer.reference_tracker().count(), 2);
    drop(buffer);

    assert!(device.handle().execute_next());
    first.begin().unwrap();
    assert!(!probe.is_destroyed());

    assert!(device.handle().execute_next());
    device.flush_deferred_destruction();
    assert!(!probe.is_destroyed());
    second.begin().unwrap();
    assert!(probe.is_destroyed());
    assert_no_violations(&device);
}

#[test]
fn resource_set_keeps_bound_buffers_alive() {
    let device = device();
    let mut recorder = recorder(&device);
    let target = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let framebuffer = framebuffer(&device, &[&target], None);
    let pipeline = pipeline(&device, BindPoint::Graphics, 1, true);
    let layout = uniform_layout(&device);
    let buffer = uniform_buffer(&device, 64);
    let set = uniform_set(&device, &layout, &buffer);
    let buffer_probe = buffer.handle().probe();
    let set_probe = set.handle().probe();
    assert_eq!(buffer.reference_tracker().count(), 1);

    drop(buffer);
    device.flush_deferred_destruction();
    assert!(!buffer_probe.is_destroyed());

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.set_graphics_resource_set(0, &set).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.end().unwrap();
    device.submit_commands(&mut recorder).unwrap();

    drop(set);
    device.flush_deferred_destruction();
    assert!(!set_probe.is_destroyed());
    assert!(!buffer_probe.is_destroyed());

    device.wait_for_idle();
    recorder.begin().unwrap();
    assert!(set_probe.is_destroyed());
    assert!(buffer_probe.is_destroyed());
    assert_no_violations(&device);
}

#[test]
fn recorder_does_not_keep_dropped_bindings_alive() {
    let device = device();
    let mut recorder = recorder(&device);
    let target = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let framebuffer = framebuffer(&device, &[&target], None);
    let pipeline = pipeline(&device, BindPoint::Graphics, 1, true);
    let layout = uniform_layout(&device);
    let buffer = uniform_buffer(&device, 64);
    let set = uniform_set(&device, &layout, &buffer);
    let set_probe = set.handle().probe();
    let pipeline_probe = pipeline.handle().probe();
    let framebuffer_probe = framebuffer.handle().probe();

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.set_graphics_resource_set(0, &set).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.end().unwrap();
    device.submit_commands(&mut recorder).unwrap();

    drop(set);
    drop(pipeline);
    drop(framebuffer);
    assert_eq!(device.retired_resource_count(), 3);

    device.wait_for_idle();
    assert!(!set_probe.is_destroyed());

    drop(recorder);
    assert!(set_probe.is_destroyed());
    assert!(pipeline_probe.is_destroyed());
    assert!(framebuffer_probe.is_destroyed());
    assert_eq!(device.retired_resource_count(), 0);
    assert_no_violations(&device);
}

#[test]
fn unreferenced_resources_are_destroyed_on_flush() {
    let device = device();
    let texture = render_target(&device, Format::RGBA8UNorm, 4, 4);
    let view = device
        .create_texture_view(&texture, &TextureViewInfo::default(), Some("View"))
        .unwrap();
    let texture_probe = texture.handle().probe();
    let view_probe = view.handle().probe();

    drop(texture);
    device.flush_deferred_destruction();
    assert!(!texture_probe.is_destroyed());

    drop(view);
    assert!(!view_probe.is_destroyed());
    assert_eq!(device.flush_deferred_destruction(), 2);
    assert!(view_probe.is_destroyed());
    assert!(texture_probe.is_destroyed());
}

#[test]
fn dropping_a_recorder_with_work_in_flight_drains_it() {
    let device = device();
    let buffer = readback_buffer(&device, 32);
    let probe = buffer.handle().probe();
    {
        let mut recorder = recorder(&device);
        recorder.begin().unwrap();
        recorder.update_buffer(&buffer, 0, &pattern(32, 3)).unwrap();
        recorder.end().unwrap();
        device.submit_commands(&mut recorder).unwrap();
        drop(buffer);
        assert_eq!(device.handle().pending_submissions(), 1);
    }
    assert_eq!(device.handle().pending_submissions(), 0);
    assert!(probe.is_destroyed());
    assert_no_violations(&device);
}
