use std::path::{Path, PathBuf};

use super::types::{
    DEFAULT_PARTITIONS, DEFAULT_REPLY_BUFFER, KlogConfig, NodeConfig, RawKlogConfig,
    RawNodeConfig, RawStoreConfig, StoreConfig,
};
use crate::error::ConfigError;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user config, then an explicit file)
    pub fn load(explicit: Option<&Path>) -> Result<KlogConfig, ConfigError> {
        Self::load_from(Self::user_config_path().as_deref(), explicit)
    }

    /// Load merged configuration from the given layers.
    ///
    /// A missing user config is skipped; a missing explicit file is an error.
    pub fn load_from(
        user: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<KlogConfig, ConfigError> {
        let mut raw = RawKlogConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(user_path)?);
        }

        // Layer 2: Explicit config (--config or KLOG_CONFIG)
        if let Some(path) = explicit {
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }

        Self::finalize(raw)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("klog").join("config.toml"))
    }

    fn read_raw(path: &Path) -> Result<RawKlogConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawKlogConfig, overlay: RawKlogConfig) -> RawKlogConfig {
        RawKlogConfig {
            store: RawStoreConfig {
                partitions: overlay.store.partitions.or(base.store.partitions),
            },
            node: RawNodeConfig {
                reply_buffer: overlay.node.reply_buffer.or(base.node.reply_buffer),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawKlogConfig) -> Result<KlogConfig, ConfigError> {
        let config = KlogConfig {
            store: StoreConfig {
                partitions: raw.store.partitions.unwrap_or(DEFAULT_PARTITIONS),
            },
            node: NodeConfig {
                reply_buffer: raw.node.reply_buffer.unwrap_or(DEFAULT_REPLY_BUFFER),
            },
        };
        Self::validate(&config)?;
        Ok(config)
    }

    /// Reject values the node cannot run with
    pub fn validate(config: &KlogConfig) -> Result<(), ConfigError> {
        if config.store.partitions == 0 {
            return Err(ConfigError::Invalid {
                key: "store.partitions",
                reason: "must be at least 1".to_string(),
            });
        }
        if config.node.reply_buffer == 0 {
            return Err(ConfigError::Invalid {
                key: "node.reply_buffer",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
