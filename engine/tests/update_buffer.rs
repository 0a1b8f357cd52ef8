mod common;

use common::*;
use emberline_engine::graphics::CommandError;

#[test]
fn small_update_reads_back_exactly() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = readback_buffer(&device, 128);
    let data = pattern(48, 11);

    recorder.begin().unwrap();
    recorder.update_buffer(&buffer, 16, &data).unwrap();
    submit_and_wait(&device, &mut recorder);

    assert_eq!(device.read_buffer(&buffer, 16, 48).unwrap(), data);
    assert_no_violations(&device);
}

#[test]
fn updates_larger_and_smaller_than_pooled_buffers() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = readback_buffer(&device, 8192);

    let first = pattern(256, 1);
    recorder.begin().unwrap();
    recorder.update_buffer(&buffer, 0, &first).unwrap();
    submit_and_wait(&device, &mut recorder);
    assert_eq!(device.read_buffer(&buffer, 0, 256).unwrap(), first);
    assert_eq!(recorder.staging_buffer_sizes(), vec![256]);

    // Fits into the pooled buffer once its copy has completed.
    let smaller = pattern(100, 2);
    recorder.begin().unwrap();
    assert_eq!(recorder.staging_buffers_in_use(), 0);
    recorder.update_buffer(&buffer, 1000, &smaller).unwrap();
    assert_eq!(recorder.staging_buffer_sizes(), vec![256]);
    submit_and_wait(&device, &mut recorder);
    assert_eq!(device.read_buffer(&buffer, 1000, 100).unwrap(), smaller);

    let larger = pattern(4096, 3);
    recorder.begin().unwrap();
    recorder.update_buffer(&buffer, 4096, &larger).unwrap();
    let mut sizes = recorder.staging_buffer_sizes();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![256, 4096]);
    submit_and_wait(&device, &mut recorder);
    assert_eq!(device.read_buffer(&buffer, 4096, 4096).unwrap(), larger);
    assert_eq!(device.read_buffer(&buffer, 1000, 100).unwrap(), smaller);
    assert_no_violations(&device);
}

#[test]
fn pooled_buffer_must_be_strictly_larger() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = readback_buffer(&device, 64);

    for seed in 0..2 {
        recorder.begin().unwrap();
        recorder.update_buffer(&buffer, 0, &pattern(64, seed)).unwrap();
        submit_and_wait(&device, &mut recorder);
    }
    assert_eq!(recorder.staging_buffer_sizes(), vec![64, 64]);
    assert_eq!(device.read_buffer(&buffer, 0, 64).unwrap(), pattern(64, 1));
}

#[test]
fn staging_buffers_in_flight_are_not_reused() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = readback_buffer(&device, 512);

    recorder.begin().unwrap();
    recorder.update_buffer(&buffer, 0, &pattern(16, 5)).unwrap();
    recorder.update_buffer(&buffer, 16, &pattern(16, 6)).unwrap();
    assert_eq!(recorder.staging_buffers_in_use(), 2);
    recorder.end().unwrap();
    device.submit_commands(&mut recorder).unwrap();

    // Nothing has executed yet, so the next recording needs a fresh buffer.
    recorder.begin().unwrap();
    assert_eq!(recorder.staging_buffers_in_use(), 2);
    recorder.update_buffer(&buffer, 32, &pattern(8, 7)).unwrap();
    assert_eq!(recorder.staging_buffer_sizes().len(), 3);
    submit_and_wait(&device, &mut recorder);

    let mut expected = pattern(16, 5);
    expected.extend(pattern(16, 6));
    expected.extend(pattern(8, 7));
    assert_eq!(device.read_buffer(&buffer, 0, 40).unwrap(), expected);
    assert_no_violations(&device);
}

#[test]
fn empty_update_records_nothing() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = readback_buffer(&device, 16);

    recorder.begin().unwrap();
    recorder.update_buffer(&buffer, 0, &[]).unwrap();
    assert!(recorder.staging_buffer_sizes().is_empty());
    assert_eq!(recorder.captured_resource_count(), 0);
}

#[test]
fn update_outside_the_buffer_is_rejected() {
    let device = device();
    let mut recorder = recorder(&device);
    let buffer = readback_buffer(&device, 16);

    recorder.begin().unwrap();
    assert_eq!(
        recorder.update_buffer(&buffer, 12, &[1; 8]),
        Err(CommandError::BufferRangeOutOfBounds {
            offset: 12,
            length: 8,
            size: 16,
        })
    );
    assert!(matches!(
        recorder.update_buffer(&buffer, u64::MAX, &[1; 4]),
        Err(CommandError::BufferRangeOutOfBounds { .. })
    ));
    assert!(recorder.staging_buffer_sizes().is_empty());
    assert_eq!(recorder.captured_resource_count(), 0);

    let data = pattern(4, 9);
    recorder.update_buffer(&buffer, 12, &data).unwrap();
    submit_and_wait(&device, &mut recorder);
    assert_eq!(device.read_buffer(&buffer, 12, 4).unwrap(), data);
    assert_no_violations(&device);
}
