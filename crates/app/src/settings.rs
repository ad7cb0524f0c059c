//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and overridden by `FAMILY_BUDGET__*` environment
//! variables (e.g. `FAMILY_BUDGET__SERVER__PORT=8080`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub page_size: Option<u64>,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .set_default("app.level", "info")?
                .add_source(File::with_name("settings").required(false))
                .add_source(
                    Environment::with_prefix("FAMILY_BUDGET")
                        .prefix_separator("__")
                        .separator("__"),
                ),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
