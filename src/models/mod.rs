pub mod device;
pub mod dtos;
pub mod update;

pub use device::{Device, DevicePatch, DeviceStatus, DeviceUpdate, NewDevice};
pub use update::{AttributeValue, UpdateExpression};
