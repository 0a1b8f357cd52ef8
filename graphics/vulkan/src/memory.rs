use ash::vk;

use emberline_core::gpu::{
    GPUError,
    MemoryUsage,
};

use crate::raw::RawVkDevice;
use crate::vk_error;

/// Property flags in order of preference.
fn memory_usage_to_vk(memory_usage: MemoryUsage) -> &'static [vk::MemoryPropertyFlags] {
    const GPU_ONLY: &[vk::MemoryPropertyFlags] = &[vk::MemoryPropertyFlags::DEVICE_LOCAL, vk::MemoryPropertyFlags::empty()];
    const CPU_TO_GPU: &[vk::MemoryPropertyFlags] = &[vk::MemoryPropertyFlags::from_raw(
        vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw() | vk::MemoryPropertyFlags::HOST_COHERENT.as_raw(),
    )];
    const GPU_TO_CPU: &[vk::MemoryPropertyFlags] = &[
        vk::MemoryPropertyFlags::from_raw(
            vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw() | vk::MemoryPropertyFlags::HOST_CACHED.as_raw(),
        ),
        vk::MemoryPropertyFlags::HOST_VISIBLE,
    ];
    match memory_usage {
        MemoryUsage::GPUOnly => GPU_ONLY,
        MemoryUsage::CPUToGPU => CPU_TO_GPU,
        MemoryUsage::GPUToCPU => GPU_TO_CPU,
    }
}

pub(crate) fn find_memory_type(
    properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    memory_usage: MemoryUsage,
) -> Option<(u32, vk::MemoryPropertyFlags)> {
    let types = &properties.memory_types[..properties.memory_type_count as usize];
    memory_usage_to_vk(memory_usage).iter().find_map(|required| {
        types.iter().enumerate().find_map(|(index, memory_type)| {
            (type_bits & (1 << index) != 0 && memory_type.property_flags.contains(*required))
                .then_some((index as u32, memory_type.property_flags))
        })
    })
}

/// A dedicated allocation, every buffer and image owns its memory.
pub(crate) struct VkMemory {
    pub(crate) memory: vk::DeviceMemory,
    pub(crate) properties: vk::MemoryPropertyFlags,
}

impl VkMemory {
    pub(crate) unsafe fn allocate(
        device: &RawVkDevice,
        requirements: &vk::MemoryRequirements,
        memory_usage: MemoryUsage,
    ) -> Result<Self, GPUError> {
        let (memory_type_index, properties) =
            find_memory_type(&device.memory_properties, requirements.memory_type_bits, memory_usage)
                .ok_or(GPUError::Unsupported("no memory type matches the requested usage"))?;
        let memory = device
            .allocate_memory(
                &vk::MemoryAllocateInfo {
                    allocation_size: requirements.size,
                    memory_type_index,
                    ..Default::default()
                },
                None,
            )
            .map_err(vk_error)?;
        Ok(Self {
            memory,
            properties,
        })
    }

    pub(crate) fn is_coherent(&self) -> bool {
        self.properties.contains(vk::MemoryPropertyFlags::HOST_COHERENT)
    }

    pub(crate) unsafe fn free(&self, device: &RawVkDevice) {
        device.free_memory(self.memory, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (memory_type, flags) in properties.memory_types.iter_mut().zip(flags) {
            memory_type.property_flags = *flags;
        }
        properties
    }

    #[test]
    fn readback_prefers_cached_memory() {
        let properties = properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED,
        ]);
        assert_eq!(find_memory_type(&properties, 0b111, MemoryUsage::GPUToCPU).map(|(index, _)| index), Some(2));
        assert_eq!(find_memory_type(&properties, 0b011, MemoryUsage::GPUToCPU).map(|(index, _)| index), Some(1));
        assert_eq!(find_memory_type(&properties, 0b111, MemoryUsage::CPUToGPU).map(|(index, _)| index), Some(1));
        assert_eq!(find_memory_type(&properties, 0b111, MemoryUsage::GPUOnly).map(|(index, _)| index), Some(0));
    }

    #[test]
    fn type_bits_are_respected() {
        let properties = properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL, vk::MemoryPropertyFlags::HOST_VISIBLE]);
        assert_eq!(find_memory_type(&properties, 0b10, MemoryUsage::GPUOnly).map(|(index, _)| index), Some(1));
        assert_eq!(find_memory_type(&properties, 0b01, MemoryUsage::CPUToGPU), None);
    }
}
