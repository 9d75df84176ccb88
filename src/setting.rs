use async_trait::async_trait;
use config::{Config, ConfigError, Value};
use serde::de::DeserializeOwned;

use crate::error::PipelineError;

/// Asynchronous key-value setting source.
#[async_trait]
pub trait SettingStore: Send + Sync {
    /// Returns `None` when the key is not present.
    async fn get_value(&self, key: &str) -> Result<Option<Value>, PipelineError>;
}

impl dyn SettingStore + '_ {
    /// Typed lookup on top of [`SettingStore::get_value`].
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PipelineError> {
        match self.get_value(key).await? {
            Some(value) => Ok(Some(value.try_deserialize()?)),
            None => Ok(None),
        }
    }
}

/// [`SettingStore`] backed by a layered `config::Config`.
#[derive(Debug, Clone)]
pub struct ConfigSettingStore {
    config: Config,
}

impl ConfigSettingStore {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SettingStore for ConfigSettingStore {
    async fn get_value(&self, key: &str) -> Result<Option<Value>, PipelineError> {
        match self.config.get::<Value>(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
