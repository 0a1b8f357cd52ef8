use std::ffi::c_void;
use std::sync::Arc;

use emberline_core::gpu::*;
use parking_lot::Mutex;

use crate::liveness::{
    Liveness,
    ResourceProbe,
};

pub(crate) struct BufferStorage {
    pub(crate) info: BufferInfo,
    pub(crate) data: Mutex<Vec<u8>>,
    pub(crate) liveness: Arc<Liveness>,
}

pub struct SoftwareBuffer {
    storage: Arc<BufferStorage>,
}

impl SoftwareBuffer {
    pub(crate) fn new(id: u64, info: &BufferInfo) -> Self {
        Self {
            storage: Arc::new(BufferStorage {
                info: info.clone(),
                data: Mutex::new(vec![0u8; info.size as usize]),
                liveness: Liveness::new(id, "buffer"),
            }),
        }
    }

    pub(crate) fn storage(&self) -> &Arc<BufferStorage> {
        &self.storage
    }

    pub fn probe(&self) -> ResourceProbe {
        ResourceProbe::new(&self.storage.liveness)
    }
}

impl Drop for SoftwareBuffer {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}

impl Buffer for SoftwareBuffer {
    fn info(&self) -> &BufferInfo {
        &self.storage.info
    }

    unsafe fn map(&self, offset: u64, length: u64, _invalidate: bool) -> Option<*mut c_void> {
        if !self.storage.info.memory_usage.is_host_visible() || offset + length > self.storage.info.size {
            return None;
        }
        let mut data = self.storage.data.lock();
        // The allocation never moves, the pointer outlives the guard.
        Some(unsafe { data.as_mut_ptr().add(offset as usize) } as *mut c_void)
    }

    unsafe fn unmap(&self, _offset: u64, _length: u64, _flush: bool) {}
}
