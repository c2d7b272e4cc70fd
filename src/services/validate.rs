//! Field validation for device requests. Pure functions, no I/O.

use crate::models::dtos::device::{RegisterDeviceBodyDto, UpdateDeviceBodyDto};
use crate::models::{DevicePatch, DeviceStatus, DeviceUpdate, NewDevice};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Maximum length of a device name, counted in code points.
pub const NAME_MAX_CHARS: usize = 50;

static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$").expect("MAC pattern must compile")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} missing from request JSON")]
    MissingField(&'static str),
    #[error("Provided {0} too long")]
    FieldTooLong(&'static str),
    #[error("Invalid {field} provided: {value}")]
    InvalidFormat { field: &'static str, value: String },
    #[error("{0} can only have value 'offline' or 'online'")]
    InvalidEnum(&'static str),
    #[error("at least one of name or status must be provided")]
    NoUpdatableFields,
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField(field)),
    }
}

pub fn is_valid_mac(mac: &str) -> bool {
    MAC_PATTERN.is_match(mac)
}

pub fn mac(value: Option<String>) -> Result<String, ValidationError> {
    let mac = required("mac", value)?;
    if !is_valid_mac(&mac) {
        return Err(ValidationError::InvalidFormat {
            field: "mac",
            value: mac,
        });
    }
    Ok(mac)
}

pub fn name(value: Option<String>) -> Result<String, ValidationError> {
    let name = required("name", value)?;
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ValidationError::FieldTooLong("name"));
    }
    Ok(name)
}

pub fn status(value: &str) -> Result<DeviceStatus, ValidationError> {
    DeviceStatus::parse(value).ok_or(ValidationError::InvalidEnum("status"))
}

pub fn registration(body: RegisterDeviceBodyDto) -> Result<NewDevice, ValidationError> {
    let name = name(body.name)?;
    let mac = mac(body.mac)?;
    let owner = required("owner", body.owner)?;
    Ok(NewDevice { mac, name, owner })
}

pub fn update(body: UpdateDeviceBodyDto) -> Result<DeviceUpdate, ValidationError> {
    let mac = mac(body.mac)?;
    let patch = DevicePatch {
        name: body.name.map(|it| name(Some(it))).transpose()?,
        status: body.status.as_deref().map(status).transpose()?,
    };
    if patch.is_empty() {
        return Err(ValidationError::NoUpdatableFields);
    }
    Ok(DeviceUpdate { mac, patch })
}
