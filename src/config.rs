use std::path::PathBuf;
use std::str::FromStr;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::Level;

use crate::effect::EffectParameter;

const CONFIG_FILE: &str = "effect-pipeline";
const ENV_PREFIX: &str = "EFFECT_PIPELINE";

#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub effects: Vec<EffectParameter>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: PathBuf::new(),
            effects: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl Configuration {
    /// Reads `effect-pipeline.{toml,json,yaml}` if present, then applies
    /// `EFFECT_PIPELINE__*` environment overrides.
    pub fn sources() -> Result<Config, config::ConfigError> {
        Config::builder()
            .set_default("log_level", default_log_level())?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
    }

    pub fn from_config(config: &Config) -> Result<Self, config::ConfigError> {
        config.clone().try_deserialize()
    }

    // Falls back to INFO when the configured level is not recognised.
    pub fn max_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}
