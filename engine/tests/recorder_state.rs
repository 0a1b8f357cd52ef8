mod common;

use common::*;
use emberline_engine::graphics::gpu::*;
use emberline_engine::graphics::{
    CommandError,
    CommandRecorderState,
};

#[test]
fn recording_state_is_enforced() {
    let device = device();
    let mut recorder = recorder(&device);
    let target = render_target(&device, Format::RGBA8UNorm, 4, 4);
    let framebuffer = framebuffer(&device, &[&target], None);

    assert_eq!(recorder.state(), CommandRecorderState::Initial);
    assert_eq!(recorder.end(), Err(CommandError::NotRecording));
    assert_eq!(recorder.set_framebuffer(&framebuffer), Err(CommandError::NotRecording));
    assert_eq!(device.submit_commands(&mut recorder), Err(CommandError::NotEnded));

    recorder.begin().unwrap();
    assert!(recorder.is_recording());
    assert_eq!(recorder.begin(), Err(CommandError::AlreadyRecording));
    assert_eq!(device.submit_commands(&mut recorder), Err(CommandError::NotEnded));
    // The failed begin left the recording intact.
    recorder.set_framebuffer(&framebuffer).unwrap();

    recorder.end().unwrap();
    assert_eq!(recorder.state(), CommandRecorderState::Ended);
    assert_eq!(recorder.clear_color_target(0, ClearColor::BLACK), Err(CommandError::NotRecording));
    device.submit_commands(&mut recorder).unwrap();
    assert_eq!(recorder.state(), CommandRecorderState::Initial);
    assert_eq!(recorder.in_flight_submissions(), 1);

    device.wait_for_idle();
    assert_no_violations(&device);
}

#[test]
fn ended_recording_that_is_never_submitted_is_discarded() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = uniform_buffer(&device, 64);

    recorder.begin().unwrap();
    recorder.update_buffer(&buffer, 0, &[1u8; 64]).unwrap();
    recorder.end().unwrap();

    recorder.begin().unwrap();
    assert_eq!(recorder.in_flight_submissions(), 0);
    assert_eq!(recorder.submission_event_count(), 1);
    assert_eq!(recorder.captured_resource_count(), 0);
    // The staging buffer of the discarded recording is free again.
    assert_eq!(recorder.staging_buffers_in_use(), 0);
    assert_eq!(recorder.staging_buffer_sizes(), vec![64]);
    submit_and_wait(&device, &mut recorder);
    assert_eq!(device.handle().pending_submissions(), 0);
    assert_no_violations(&device);
}

#[test]
fn completed_submission_records_are_reused() {
    let device = device();
    let mut recorder = recorder(&device);

    for _ in 0..4 {
        recorder.begin().unwrap();
        submit_and_wait(&device, &mut recorder);
    }
    assert_eq!(recorder.submission_event_count(), 1);
    assert_eq!(recorder.in_flight_submissions(), 1);

    // Frames that overlap need a record each.
    for _ in 0..3 {
        recorder.begin().unwrap();
        recorder.end().unwrap();
        device.submit_commands(&mut recorder).unwrap();
    }
    assert_eq!(recorder.submission_event_count(), 3);
    assert_eq!(recorder.in_flight_submissions(), 3);

    device.wait_for_idle();
    recorder.begin().unwrap();
    assert_eq!(recorder.in_flight_submissions(), 0);
    submit_and_wait(&device, &mut recorder);
    assert_eq!(recorder.submission_event_count(), 3);
    assert_no_violations(&device);
}
