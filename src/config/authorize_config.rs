use serde::Deserialize;

/// Verification parameters for the bearer tokens of the identity provider.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuthorizeConfig {
    /// HS256 shared secret, required
    pub secret: String,
    pub issuer: String,
}

impl Default for AuthorizeConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "device-registry".to_string(),
        }
    }
}
