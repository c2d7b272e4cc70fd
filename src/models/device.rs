use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
}

impl DeviceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        }
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered device, keyed by its MAC address.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Device {
    pub mac: String,
    pub name: String,
    /// email of the account the device was registered under, never updated
    pub owner: String,
    pub status: DeviceStatus,
}

/// A validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub mac: String,
    pub name: String,
    pub owner: String,
}

impl From<NewDevice> for Device {
    fn from(value: NewDevice) -> Self {
        // callers cannot pick the initial status
        Self {
            mac: value.mac,
            name: value.name,
            owner: value.owner,
            status: DeviceStatus::Offline,
        }
    }
}

/// The mutable attributes supplied on an update, absent ones stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub status: Option<DeviceStatus>,
}

impl DevicePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none()
    }
}

/// A validated update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub mac: String,
    pub patch: DevicePatch,
}
