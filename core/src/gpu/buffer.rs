use std::ffi::c_void;

use super::*;

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
  pub struct BufferUsage: u32 {
    const VERTEX   = 0b1;
    const INDEX    = 0b10;
    const STORAGE  = 0b100;
    const CONSTANT = 0b1000;
    const COPY_SRC = 0b100000;
    const COPY_DST = 0b1000000;
    const INDIRECT = 0b10000000;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryUsage {
  GPUOnly,
  /// Host visible and coherent, written by the CPU and read by the GPU.
  CPUToGPU,
  /// Host visible, written by the GPU and read back by the CPU.
  GPUToCPU,
}

impl MemoryUsage {
  pub fn is_host_visible(&self) -> bool {
    !matches!(self, MemoryUsage::GPUOnly)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferInfo {
  pub size: u64,
  pub usage: BufferUsage,
  pub memory_usage: MemoryUsage,
}

pub trait Buffer: GPUMaybeSend + GPUMaybeSync {
  fn info(&self) -> &BufferInfo;

  /// Returns `None` if the buffer is not host visible.
  unsafe fn map(&self, offset: u64, length: u64, invalidate: bool) -> Option<*mut c_void>;
  unsafe fn unmap(&self, offset: u64, length: u64, flush: bool);
}
