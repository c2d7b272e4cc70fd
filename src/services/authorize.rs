use crate::common::ApiError;
use crate::extractors::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authorized,
    Forbidden,
}

impl Access {
    pub fn ensure(self) -> Result<(), ApiError> {
        match self {
            Access::Authorized => Ok(()),
            Access::Forbidden => Err(ApiError::Forbidden),
        }
    }
}

/// Only the owner may act on a device: exact, case-sensitive email match.
pub fn authorize(identity: &Identity, owner: &str) -> Access {
    if identity.email == owner {
        Access::Authorized
    } else {
        Access::Forbidden
    }
}
