use serde::Deserialize;

/// Body of `POST /api/devices`.
///
/// Every field is optional at the wire level so that an absent field becomes a
/// validation error instead of a body parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterDeviceBodyDto {
    pub name: Option<String>,
    pub mac: Option<String>,
    /// email address of the owning account
    pub owner: Option<String>,
}

/// Body of `PATCH /api/devices`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDeviceBodyDto {
    pub mac: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}
