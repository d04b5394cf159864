use std::sync::Arc;

use crate::conf::{ConfigError, ServeConfig};
use crate::static_files::EtagCache;

/// Read-only serving configuration plus the shared ETag cache.
#[derive(Debug, Clone)]
pub struct ServeState {
    pub config: Arc<ServeConfig>,
    pub etags: Arc<EtagCache>,
}

impl ServeState {
    /// Validates `config` (canonicalizing `public`) and pairs it with a fresh
    /// cache.
    pub fn new(config: ServeConfig) -> Result<Self, ConfigError> {
        Self::with_cache(config, Arc::new(EtagCache::new()))
    }

    pub fn with_cache(mut config: ServeConfig, etags: Arc<EtagCache>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            etags,
        })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.config.public
    }
}
