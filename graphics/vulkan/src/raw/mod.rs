mod command;
mod device;

pub use self::command::RawVkCommandPool;
pub use self::device::RawVkDevice;
