use emberline_software::{
    SoftwareDevice,
    SoftwareEvent,
};

use super::gpu::CommandBuffer as _;
use super::gpu::Device as _;
use super::gpu::Queue as _;
use super::gpu::BarrierSync;

/// Sets `events` the way a finished submission does.
pub(super) fn signal(device: &SoftwareDevice, events: &[&SoftwareEvent]) {
    unsafe {
        let mut command_buffer = device.create_command_buffer().unwrap();
        command_buffer.begin();
        for event in events {
            command_buffer.set_event(event, BarrierSync::all());
        }
        command_buffer.finish();
        device.graphics_queue().submit(&command_buffer).unwrap();
        device.wait_for_idle();
    }
}
