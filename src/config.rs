//! Log configuration
//!
//! Configuration can be built in code or loaded from TOML:
//!
//! ```toml
//! prefix = "wal"
//! max_payload_size = 67108864
//! discover_tail = true
//! ```

use crate::addressing::Namespace;
use crate::envelope::MIN_ENVELOPE_LEN;
use crate::error::{Result, WalError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest single object accepted by common object stores (5 GiB)
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Largest payload that still fits in one object
pub const MAX_PAYLOAD_LIMIT: u64 = MAX_OBJECT_SIZE - MIN_ENVELOPE_LEN as u64;

/// Default payload bound (64 MiB)
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Configuration for a [`Wal`](crate::Wal)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalConfig {
    /// Key prefix identifying the log within its store
    pub prefix: String,

    /// Largest payload accepted by `append`
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,

    /// Probe the store for existing records when opening the log
    #[serde(default)]
    pub discover_tail: bool,
}

fn default_max_payload_size() -> usize {
    DEFAULT_MAX_PAYLOAD_SIZE
}

impl WalConfig {
    /// Create a configuration with default limits
    pub fn new(prefix: impl Into<String>) -> Self {
        WalConfig {
            prefix: prefix.into(),
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            discover_tail: false,
        }
    }

    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    pub fn with_tail_discovery(mut self, enabled: bool) -> Self {
        self.discover_tail = enabled;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: WalConfig =
            toml::from_str(s).map_err(|e| WalError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WalError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| WalError::Config(format!("serialize failed: {}", e)))
    }

    /// Validate all fields
    pub fn validate(&self) -> Result<()> {
        self.namespace()
            .map_err(|e| WalError::Config(e.to_string()))?;

        if self.max_payload_size == 0 {
            return Err(WalError::Config(
                "max_payload_size must be at least 1".to_string(),
            ));
        }

        if self.max_payload_size as u64 > MAX_PAYLOAD_LIMIT {
            return Err(WalError::Config(format!(
                "max_payload_size {} exceeds object size limit (max {})",
                self.max_payload_size, MAX_PAYLOAD_LIMIT
            )));
        }

        Ok(())
    }

    /// Validated namespace for the configured prefix
    pub fn namespace(&self) -> Result<Namespace> {
        Namespace::new(self.prefix.clone())
    }
}
