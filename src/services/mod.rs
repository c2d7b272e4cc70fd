pub mod authorize;
pub mod device;
pub mod store;
pub mod validate;

pub use device::DeviceService;
pub use store::{DeviceStore, SqliteDeviceStore};
