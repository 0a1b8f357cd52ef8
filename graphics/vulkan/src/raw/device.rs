use std::ops::Deref;

use ash::vk;

pub struct RawVkDevice {
    pub device: ash::Device,
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub queue_family_index: u32,
}

impl RawVkDevice {
    /// Takes ownership of `device`, it is destroyed once the last resource
    /// referencing it is gone. The instance has to outlive it.
    pub unsafe fn new(
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        queue_family_index: u32,
    ) -> Self {
        let memory_properties = instance.get_physical_device_memory_properties(physical_device);
        Self {
            device,
            instance,
            physical_device,
            memory_properties,
            queue_family_index,
        }
    }
}

impl Deref for RawVkDevice {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl Drop for RawVkDevice {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_device(None);
        }
    }
}
