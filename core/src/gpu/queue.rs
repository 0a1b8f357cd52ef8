use super::*;

pub trait Queue<B: GPUBackend> {
  /// The command buffer has to stay alive until the device has finished
  /// executing it.
  unsafe fn submit(&self, command_buffer: &B::CommandBuffer) -> Result<(), GPUError>;
}
