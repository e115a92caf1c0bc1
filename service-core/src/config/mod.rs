//! Listener configuration shared by the access-control services.
//!
//! Values come from an optional `configuration` file overlaid with
//! `APP__`-prefixed environment variables (`APP__PORT=9090`).
//! Service-specific settings (database, policies) live in each service's
//! own config module on top of this.

use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Port the HTTP listener binds to; 0 picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load the shared settings, reading `.env` first so local runs pick
    /// up the same variables the deployment sets.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
