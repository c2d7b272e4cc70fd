use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data/devices.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn parse_path(&self) -> anyhow::Result<PathBuf> {
        let path = std::path::Path::new(&self.path).to_path_buf();
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(std::env::current_dir()?.join(path))
        }
    }
}
