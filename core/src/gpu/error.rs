use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GPUError {
  #[error("out of device or host memory")]
  OutOfMemory,
  #[error("the device was lost")]
  DeviceLost,
  #[error("unsupported: {0}")]
  Unsupported(&'static str),
  #[error("backend error: {0}")]
  Backend(String),
}
