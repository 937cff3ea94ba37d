//! Configuration types for jumpline.
//!
//! Settings load from a TOML file and fall back to the defaults in
//! [`crate::constants`]. All sections are optional; an empty file is a
//! valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::constants;
use crate::reliability::DebounceConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub debounce: DebounceSettings,
    #[serde(default)]
    pub executor: ExecutorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceSettings {
    #[serde(default = "default_debounce_wait_ms")]
    pub wait_ms: u64,
    #[serde(default = "default_debounce_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default)]
    pub leading: bool,
    #[serde(default = "default_true")]
    pub trailing: bool,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            wait_ms: default_debounce_wait_ms(),
            max_wait_ms: default_debounce_max_wait_ms(),
            leading: false,
            trailing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    #[serde(default = "default_windows_grace_ms")]
    pub windows_grace_ms: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            windows_grace_ms: default_windows_grace_ms(),
        }
    }
}

const fn default_cache_capacity() -> usize {
    constants::MAX_CACHE_ENTRIES
}

const fn default_sweep_interval_secs() -> u64 {
    constants::CACHE_SWEEP_INTERVAL.as_secs()
}

const fn default_debounce_wait_ms() -> u64 {
    constants::DEFAULT_DEBOUNCE_WAIT.as_millis() as u64
}

const fn default_debounce_max_wait_ms() -> u64 {
    constants::DEFAULT_DEBOUNCE_MAX_WAIT.as_millis() as u64
}

const fn default_windows_grace_ms() -> u64 {
    constants::WINDOWS_LAUNCH_GRACE.as_millis() as u64
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("malformed config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when no
    /// file exists.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/jumpline/config.toml`, when resolvable.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("jumpline").join("config.toml"))
    }

    /// Non-fatal issues worth logging: the configuration still loads, with
    /// unusable values replaced by defaults at the point of use.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.cache.capacity == 0 {
            warnings.push("cache capacity is 0; the default will be used".to_string());
        }
        if self.debounce.wait_ms == 0 {
            warnings.push("debounce wait is 0ms; the default will be used".to_string());
        }
        if self.debounce.max_wait_ms < self.debounce.wait_ms {
            warnings.push(format!(
                "debounce max_wait {}ms is below wait {}ms; it will be raised to the wait window",
                self.debounce.max_wait_ms, self.debounce.wait_ms
            ));
        }
        warnings
    }

    /// Cache store configuration with unusable values replaced.
    pub fn cache_config(&self) -> CacheConfig {
        let capacity = if self.cache.capacity == 0 {
            constants::MAX_CACHE_ENTRIES
        } else {
            self.cache.capacity
        };
        let sweep = if self.cache.sweep_interval_secs == 0 {
            constants::CACHE_SWEEP_INTERVAL
        } else {
            Duration::from_secs(self.cache.sweep_interval_secs)
        };
        CacheConfig {
            max_entries: capacity,
            sweep_interval: sweep,
            ..CacheConfig::default()
        }
    }

    /// Debounce configuration for the trigger path, with unusable values
    /// replaced.
    pub fn debounce_config(&self) -> DebounceConfig {
        let wait = if self.debounce.wait_ms == 0 {
            constants::DEFAULT_DEBOUNCE_WAIT
        } else {
            Duration::from_millis(self.debounce.wait_ms)
        };
        let max_wait = Duration::from_millis(self.debounce.max_wait_ms).max(wait);
        DebounceConfig {
            wait,
            leading: self.debounce.leading,
            trailing: self.debounce.trailing,
            max_wait: Some(max_wait),
        }
    }

    pub fn windows_grace(&self) -> Duration {
        Duration::from_millis(self.executor.windows_grace_ms)
    }
}
