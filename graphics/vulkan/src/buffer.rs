use std::ffi::c_void;
use std::hash::{
    Hash,
    Hasher,
};
use std::sync::Arc;

use ash::vk;
use log::warn;

use emberline_core::gpu::{
    Buffer,
    BufferInfo,
    BufferUsage,
    GPUError,
};

use crate::memory::VkMemory;
use crate::raw::RawVkDevice;
use crate::vk_error;

pub struct VkBuffer {
    buffer: vk::Buffer,
    memory: VkMemory,
    map_ptr: Option<*mut c_void>,
    device: Arc<RawVkDevice>,
    info: BufferInfo,
}

unsafe impl Send for VkBuffer {}
unsafe impl Sync for VkBuffer {}

impl VkBuffer {
    pub(crate) unsafe fn new(device: &Arc<RawVkDevice>, info: &BufferInfo) -> Result<Self, GPUError> {
        let buffer_info = vk::BufferCreateInfo {
            size: info.size.max(1),
            usage: buffer_usage_to_vk(info.usage),
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        let buffer = device.create_buffer(&buffer_info, None).map_err(vk_error)?;
        let requirements = device.get_buffer_memory_requirements(buffer);
        let memory = match VkMemory::allocate(device, &requirements, info.memory_usage) {
            Ok(memory) => memory,
            Err(error) => {
                device.destroy_buffer(buffer, None);
                return Err(error);
            }
        };
        let bound = device
            .bind_buffer_memory(buffer, memory.memory, 0)
            .and_then(|_| {
                if info.memory_usage.is_host_visible() {
                    device
                        .map_memory(memory.memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                        .map(Some)
                } else {
                    Ok(None)
                }
            });
        let map_ptr = match bound {
            Ok(map_ptr) => map_ptr,
            Err(result) => {
                device.destroy_buffer(buffer, None);
                memory.free(device);
                return Err(vk_error(result));
            }
        };

        Ok(Self {
            buffer,
            memory,
            map_ptr,
            device: device.clone(),
            info: info.clone(),
        })
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Non-coherent ranges have to be aligned to `nonCoherentAtomSize`, the
    /// allocation is dedicated so the whole of it is always a valid range.
    fn whole_range(&self) -> vk::MappedMemoryRange {
        vk::MappedMemoryRange {
            memory: self.memory.memory,
            offset: 0,
            size: vk::WHOLE_SIZE,
            ..Default::default()
        }
    }
}

impl Drop for VkBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.map_ptr.is_some() {
                self.device.unmap_memory(self.memory.memory);
            }
            self.device.destroy_buffer(self.buffer, None);
            self.memory.free(&self.device);
        }
    }
}

impl Hash for VkBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.buffer.hash(state);
    }
}

impl PartialEq for VkBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer
    }
}

impl Eq for VkBuffer {}

impl Buffer for VkBuffer {
    fn info(&self) -> &BufferInfo {
        &self.info
    }

    unsafe fn map(&self, offset: u64, _length: u64, invalidate: bool) -> Option<*mut c_void> {
        let map_ptr = self.map_ptr?;
        if invalidate && !self.memory.is_coherent() {
            if let Err(result) = self
                .device
                .invalidate_mapped_memory_ranges(&[self.whole_range()])
            {
                warn!("Invalidating mapped buffer memory failed: {:?}", result);
            }
        }
        Some(map_ptr.cast::<u8>().add(offset as usize).cast())
    }

    unsafe fn unmap(&self, _offset: u64, _length: u64, flush: bool) {
        if flush && self.map_ptr.is_some() && !self.memory.is_coherent() {
            if let Err(result) = self
                .device
                .flush_mapped_memory_ranges(&[self.whole_range()])
            {
                warn!("Flushing mapped buffer memory failed: {:?}", result);
            }
        }
    }
}

pub fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();

    if usage.contains(BufferUsage::STORAGE) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }

    if usage.contains(BufferUsage::CONSTANT) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }

    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }

    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }

    if usage.contains(BufferUsage::INDIRECT) {
        flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }

    if usage.contains(BufferUsage::COPY_SRC) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC;
    }

    if usage.contains(BufferUsage::COPY_DST) {
        flags |= vk::BufferUsageFlags::TRANSFER_DST;
    }

    flags
}
