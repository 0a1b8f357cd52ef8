use ash::vk;

use emberline_core::gpu::GPUError;

/// `GPUError` and `vk::Result` are both foreign here, so this is a function
/// rather than a `From` impl.
pub(crate) fn vk_error(result: vk::Result) -> GPUError {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => GPUError::OutOfMemory,
        vk::Result::ERROR_DEVICE_LOST => GPUError::DeviceLost,
        vk::Result::ERROR_FORMAT_NOT_SUPPORTED | vk::Result::ERROR_FEATURE_NOT_PRESENT => {
            GPUError::Unsupported("format or feature not supported by the device")
        }
        other => GPUError::Backend(format!("{:?}", other)),
    }
}
