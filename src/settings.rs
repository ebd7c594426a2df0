//! Settings for the service. Configuration is read from an optional
//! `settings.toml` in the working directory, then from `TRIPMATE__*`
//! environment variables (`TRIPMATE__SERVER__PORT=9000`).
//!
//! `MONGODB_URI` is still honoured as the default database URI.
use std::env;

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    /// Origin allowed by CORS. Any origin when unset.
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Mongodb {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub mongodb: Mongodb,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(
                    Environment::with_prefix("TRIPMATE")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    /// Fills in defaults underneath the given sources.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let mongodb_uri =
            env::var("MONGODB_URI").unwrap_or_else(|_| DEFAULT_MONGODB_URI.to_string());

        builder
            .set_default("app.level", "info")?
            .set_default("server.bind", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("mongodb.uri", mongodb_uri)?
            .set_default("mongodb.database", "TripMate")?
            .build()?
            .try_deserialize()
    }
}
