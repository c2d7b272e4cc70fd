mod identity;

pub use identity::{Identity, IdentityError, TokenVerifier};

#[cfg(test)]
pub(crate) use identity::issue;
