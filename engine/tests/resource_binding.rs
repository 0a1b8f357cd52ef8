mod common;

use std::sync::Arc;

use common::*;
use emberline_engine::graphics::gpu::*;
use emberline_engine::graphics::{
    CommandError,
    ResourceSet,
};
use emberline_software::ExecutedCommand;

fn bind_calls(commands: &[ExecutedCommand]) -> Vec<(u32, u32)> {
    commands
        .iter()
        .filter_map(|command| match command {
            ExecutedCommand::BindResourceSets {
                bind_point: BindPoint::Graphics,
                first_set,
                count,
            } => Some((*first_set, *count)),
            _ => None,
        })
        .collect()
}

/// Splits the executed commands at every draw.
fn bind_calls_per_draw(commands: Vec<ExecutedCommand>) -> Vec<Vec<(u32, u32)>> {
    commands
        .split(|command| *command == ExecutedCommand::Draw)
        .map(bind_calls)
        .collect()
}

struct Scene {
    device: Arc<emberline_engine::graphics::Device<B>>,
    recorder: emberline_engine::graphics::CommandRecorder<B>,
    first_sets: Vec<Arc<ResourceSet<B>>>,
    second_sets: Vec<Arc<ResourceSet<B>>>,
}

fn scene(slot_count: u32) -> Scene {
    let device = device();
    let mut recorder = recorder(&device);
    let target = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let framebuffer = framebuffer(&device, &[&target], None);
    let pipeline = pipeline(&device, BindPoint::Graphics, slot_count, true);
    let layout = uniform_layout(&device);
    let buffer = uniform_buffer(&device, 256);
    let first_sets = (0..slot_count).map(|_| uniform_set(&device, &layout, &buffer)).collect();
    let second_sets = (0..slot_count).map(|_| uniform_set(&device, &layout, &buffer)).collect();

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    Scene {
        device,
        recorder,
        first_sets,
        second_sets,
    }
}

#[test]
fn slots_zero_and_two_bind_separately() {
    let Scene {
        device,
        mut recorder,
        first_sets,
        second_sets,
    } = scene(3);

    for (slot, set) in first_sets.iter().enumerate() {
        recorder.set_graphics_resource_set(slot as u32, set).unwrap();
    }
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.set_graphics_resource_set(0, &second_sets[0]).unwrap();
    recorder.set_graphics_resource_set(2, &second_sets[2]).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    submit_and_wait(&device, &mut recorder);

    let calls = bind_calls_per_draw(device.handle().take_executed_commands());
    assert_eq!(calls[0], vec![(0, 3)]);
    assert_eq!(calls[1], vec![(0, 1), (2, 1)]);
    assert_no_violations(&device);
}

#[test]
fn dirty_patterns_bind_minimal_ranges() {
    let Scene {
        device,
        mut recorder,
        first_sets,
        second_sets,
    } = scene(6);

    // Everything dirty.
    for (slot, set) in first_sets.iter().enumerate() {
        recorder.set_graphics_resource_set(slot as u32, set).unwrap();
    }
    recorder.draw(3, 1, 0, 0).unwrap();

    // Nothing dirty, rebinding the same sets does not count.
    for (slot, set) in first_sets.iter().enumerate() {
        recorder.set_graphics_resource_set(slot as u32, set).unwrap();
    }
    recorder.draw(3, 1, 0, 0).unwrap();

    // Alternating.
    for slot in [0usize, 2, 4] {
        recorder.set_graphics_resource_set(slot as u32, &second_sets[slot]).unwrap();
    }
    recorder.draw(3, 1, 0, 0).unwrap();

    // A single run, every slot in 1..5 swaps to the set it does not hold yet.
    for slot in 1usize..5 {
        let set = if slot % 2 == 0 { &first_sets[slot] } else { &second_sets[slot] };
        recorder.set_graphics_resource_set(slot as u32, set).unwrap();
    }
    recorder.draw(3, 1, 0, 0).unwrap();
    submit_and_wait(&device, &mut recorder);

    let calls = bind_calls_per_draw(device.handle().take_executed_commands());
    assert_eq!(calls[0], vec![(0, 6)]);
    assert!(calls[1].is_empty());
    assert_eq!(calls[2], vec![(0, 1), (2, 1), (4, 1)]);
    assert_eq!(calls[3], vec![(1, 4)]);
    assert_no_violations(&device);
}

#[test]
fn slot_outside_the_pipeline_layout_is_rejected() {
    let Scene {
        device: _device,
        mut recorder,
        first_sets,
        ..
    } = scene(2);

    assert_eq!(
        recorder.set_graphics_resource_set(2, &first_sets[0]),
        Err(CommandError::ResourceSetSlotOutOfRange { slot: 2, count: 2 })
    );
    assert_eq!(
        recorder.set_compute_resource_set(0, &first_sets[0]),
        Err(CommandError::ResourceSetSlotOutOfRange { slot: 0, count: 0 })
    );
}

#[test]
fn changing_the_pipeline_rebinds_every_set() {
    let Scene {
        device,
        mut recorder,
        first_sets,
        ..
    } = scene(2);
    let other = pipeline(&device, BindPoint::Graphics, 2, true);

    for (slot, set) in first_sets.iter().enumerate() {
        recorder.set_graphics_resource_set(slot as u32, set).unwrap();
    }
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.set_pipeline(&other).unwrap();
    // Binding the same pipeline again is free.
    recorder.set_pipeline(&other).unwrap();
    for (slot, set) in first_sets.iter().enumerate() {
        recorder.set_graphics_resource_set(slot as u32, set).unwrap();
    }
    recorder.draw(3, 1, 0, 0).unwrap();
    submit_and_wait(&device, &mut recorder);

    let commands = device.handle().take_executed_commands();
    let pipeline_binds = commands
        .iter()
        .filter(|command| matches!(command, ExecutedCommand::BindPipeline(BindPoint::Graphics)))
        .count();
    assert_eq!(pipeline_binds, 2);
    let calls = bind_calls_per_draw(commands);
    assert_eq!(calls[0], vec![(0, 2)]);
    assert_eq!(calls[1], vec![(0, 2)]);
    assert_no_violations(&device);
}

#[test]
fn draws_and_dispatches_require_a_pipeline() {
    let device = device();
    let mut recorder = recorder(&device);
    let target = render_target(&device, Format::RGBA8UNorm, 8, 8);
    let framebuffer = framebuffer(&device, &[&target], None);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    assert_eq!(recorder.draw(3, 1, 0, 0), Err(CommandError::NoPipeline(BindPoint::Graphics)));
    assert_eq!(recorder.dispatch(1, 1, 1), Err(CommandError::NoPipeline(BindPoint::Compute)));

    let graphics = pipeline(&device, BindPoint::Graphics, 0, true);
    recorder.set_pipeline(&graphics).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();

    let compute = pipeline(&device, BindPoint::Compute, 1, false);
    let layout = uniform_layout(&device);
    let buffer = uniform_buffer(&device, 16);
    let set = uniform_set(&device, &layout, &buffer);
    recorder.set_pipeline(&compute).unwrap();
    recorder.set_compute_resource_set(0, &set).unwrap();
    recorder.dispatch(4, 4, 1).unwrap();
    submit_and_wait(&device, &mut recorder);

    let commands = device.handle().take_executed_commands();
    let end_of_pass = commands
        .iter()
        .position(|command| *command == ExecutedCommand::EndRenderPass)
        .unwrap();
    let dispatch = commands
        .iter()
        .position(|command| *command == ExecutedCommand::Dispatch)
        .unwrap();
    assert!(end_of_pass < dispatch);
    assert!(commands.contains(&ExecutedCommand::BindResourceSets {
        bind_point: BindPoint::Compute,
        first_set: 0,
        count: 1,
    }));
    assert_no_violations(&device);
}

#[test]
fn full_scissors_are_only_set_once() {
    let device = device();
    let mut recorder = recorder(&device);
    let first = render_target(&device, Format::RGBA8UNorm, 32, 16);
    let second = render_target(&device, Format::RGBA8UNorm, 32, 16);
    let framebuffer = framebuffer(&device, &[&first, &second], None);
    let pipeline = pipeline(&device, BindPoint::Graphics, 0, false);

    recorder.begin().unwrap();
    recorder.set_framebuffer(&framebuffer).unwrap();
    recorder.set_pipeline(&pipeline).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.draw(3, 1, 0, 0).unwrap();
    recorder.set_scissor_rect(0, 4, 4, 8, 8).unwrap();
    recorder.set_scissor_rect(0, 4, 4, 8, 8).unwrap();
    submit_and_wait(&device, &mut recorder);

    let scissors: Vec<(u32, Scissor)> = device
        .handle()
        .take_executed_commands()
        .into_iter()
        .filter_map(|command| match command {
            ExecutedCommand::SetScissor { index, scissor } => Some((index, scissor)),
            _ => None,
        })
        .collect();
    let full = Scissor {
        x: 0,
        y: 0,
        width: 32,
        height: 16,
    };
    assert_eq!(
        scissors,
        vec![
            (0, full),
            (1, full),
            (
                0,
                Scissor {
                    x: 4,
                    y: 4,
                    width: 8,
                    height: 8,
                }
            ),
        ]
    );
    assert_no_violations(&device);
}
