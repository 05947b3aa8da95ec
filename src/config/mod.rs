mod basic;
mod database;

pub use basic::BasicConfig;
pub use database::DatabaseConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable carrying the cloud connection string.
pub const REMOTE_URL_ENV: &str = "SQLITECLOUD_CONNECTION_STRING";

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Local and remote database settings (see `database` table in config.toml).
    #[serde(default)]
    pub database: DatabaseConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads defaults, `config.toml` if present, then applies the remote URL env override.
    pub fn load() -> Result<Self, figment::Error> {
        let mut cfg: Self = Self::figment().extract()?;
        if let Ok(url) = std::env::var(REMOTE_URL_ENV) {
            cfg.database.apply_remote_override(&url);
        }
        Ok(cfg)
    }
}
