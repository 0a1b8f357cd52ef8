pub use self::backend::*;
pub use self::buffer::*;
pub use self::command::*;
pub use self::device::*;
pub use self::error::*;
pub use self::format::*;
pub use self::pipeline::*;
pub use self::queue::*;
pub use self::renderpass::*;
pub use self::resource::*;
pub use self::sync::*;
pub use self::texture::*;

mod backend;
mod buffer;
mod command;
mod device;
mod error;
mod format;
mod pipeline;
mod queue;
mod renderpass;
mod resource;
mod sync;
mod texture;

#[cfg(feature = "non_send_gpu")]
mod send_sync_bounds {
  #[allow(unused)]
  pub trait GPUMaybeSend {}
  impl<T> GPUMaybeSend for T {}

  #[allow(unused)]
  pub trait GPUMaybeSync {}
  impl<T> GPUMaybeSync for T {}
}

#[cfg(not(feature = "non_send_gpu"))]
mod send_sync_bounds {
  #[allow(unused)]
  pub trait GPUMaybeSend: Send {}
  impl<T: Send> GPUMaybeSend for T {}

  #[allow(unused)]
  pub trait GPUMaybeSync: Sync {}
  impl<T: Sync> GPUMaybeSync for T {}
}

pub use send_sync_bounds::*;
