use anyhow::{Context, anyhow, bail};
use serde::Deserialize;
use std::path::PathBuf;

mod authorize_config;
mod database_config;
mod logs_config;
mod server_config;

pub use authorize_config::AuthorizeConfig;

const ENV_PREFIX: &str = "DEVICE_REGISTRY_";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: server_config::ServerConfig,
    pub database: database_config::DatabaseConfig,
    pub authorize: AuthorizeConfig,
    pub logs: logs_config::LogsConfig,
}

impl Config {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).with_context(|| {
            "Error: Failed to parse configuration file.\n\
            Please check the file syntax is valid TOML syntax"
        })
    }

    /// Overrides file values with `DEVICE_REGISTRY_*` variables.
    pub fn apply_env<F>(&mut self, var: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(&format!("{ENV_PREFIX}{key}")).filter(|it| !it.is_empty());
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid {ENV_PREFIX}PORT: '{port}'"))?;
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(secret) = var("JWT_SECRET") {
            self.authorize.secret = secret;
        }
        if let Some(issuer) = var("JWT_ISSUER") {
            self.authorize.issuer = issuer;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logs.level = logs_config::parse_level(&level)
                .ok_or_else(|| anyhow!("Unsupported log level: {level}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.authorize.secret.is_empty() {
            bail!(
                "Error: token secret not set.\n\
                Set `authorize.secret` in the configuration file or {ENV_PREFIX}JWT_SECRET"
            )
        }
        if self.authorize.issuer.is_empty() {
            bail!("Error: token issuer must not be empty")
        }
        if self.database.path.is_empty() {
            bail!("Error: database path must not be empty")
        }
        Ok(())
    }
}

fn parse_config_path<I>(mut args: I) -> anyhow::Result<Option<PathBuf>>
where
    I: Iterator<Item = String>,
{
    args.next();
    while let Some(arg) = args.next() {
        if arg == "-c" || arg == "--config" {
            return match args.next() {
                Some(path) => Ok(Some(PathBuf::from(path))),
                None => Err(anyhow!("Error: Please specify path string for -c argument.")),
            };
        }
    }
    Ok(None)
}

/// Reads the optional `-c <file>`, overlays the environment, and validates.
/// Any error here is fatal, the server never starts with a partial config.
pub fn load() -> anyhow::Result<Config> {
    let mut config = match parse_config_path(std::env::args())? {
        Some(path) => {
            if !path.is_file() {
                bail!(
                    "Error: Configuration file not found or invalid.\n\
                    Please make sure that the configuration file exists and is a valid TOML file.\n\
                    Expected file path: {:?}",
                    path
                );
            }
            let content = std::fs::read_to_string(&path).with_context(|| {
                "Error: Failed to read configuration file.\n\
                Please check the file path and file permissions, and make sure the file is valid accessible"
            })?;
            Config::from_toml(&content)?
        }
        None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tracing::Level;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000

            [authorize]
            secret = "s3cret"

            [logs]
            level = "DEBUG"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.authorize.secret, "s3cret");
        assert_eq!(config.authorize.issuer, "device-registry");
        assert_eq!(config.logs.level, Level::DEBUG);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_level() {
        assert!(Config::from_toml("[logs]\nlevel = \"loud\"").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml("[authorize]\nsecret = \"file\"").unwrap();
        config
            .apply_env(env(&[
                ("DEVICE_REGISTRY_JWT_SECRET", "env"),
                ("DEVICE_REGISTRY_PORT", "7000"),
                ("DEVICE_REGISTRY_LOG_LEVEL", "warn"),
                ("DEVICE_REGISTRY_HOST", ""),
            ]))
            .unwrap();
        assert_eq!(config.authorize.secret, "env");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logs.level, Level::WARN);
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("DEVICE_REGISTRY_PORT", "http")])).is_err());
        assert!(config.apply_env(env(&[("DEVICE_REGISTRY_LOG_LEVEL", "loud")])).is_err());
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_config_path() {
        let args = |list: &[&str]| list.iter().map(|it| it.to_string()).collect::<Vec<_>>();
        assert_eq!(
            parse_config_path(args(&["bin", "-c", "a.toml"]).into_iter()).unwrap(),
            Some(PathBuf::from("a.toml"))
        );
        assert_eq!(
            parse_config_path(args(&["bin", "--config", "b.toml"]).into_iter()).unwrap(),
            Some(PathBuf::from("b.toml"))
        );
        assert_eq!(parse_config_path(args(&["bin"]).into_iter()).unwrap(), None);
        assert!(parse_config_path(args(&["bin", "-c"]).into_iter()).is_err());
    }
}
