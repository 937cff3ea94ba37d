//! Settings persistence for the editor registry.
//!
//! The registry talks to a [`SettingsStore`] trait so the host can supply
//! its own settings backend. This crate ships a TOML file implementation
//! (used by the CLI), an in-memory implementation (tests and embedding),
//! and a caching decorator that keeps repeated loads off the filesystem.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::EditorConfig;
use crate::cache::Namespace;
use crate::error::{Error, Result};

/// Persistence seam for the editor collection.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Vec<EditorConfig>>;
    fn save(&self, editors: &[EditorConfig]) -> Result<()>;
}

impl SettingsStore for Box<dyn SettingsStore> {
    fn load(&self) -> Result<Vec<EditorConfig>> {
        (**self).load()
    }

    fn save(&self, editors: &[EditorConfig]) -> Result<()> {
        (**self).save(editors)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    editors: Vec<EditorConfig>,
}

/// TOML file-backed settings.
#[derive(Debug, Clone)]
pub struct TomlSettings {
    path: PathBuf,
}

impl TomlSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location: `<config dir>/jumpline/editors.toml`.
    /// Returns `None` if the platform config directory cannot be resolved.
    pub fn default_location() -> Option<Self> {
        let base = dirs::config_dir()?;
        Some(Self::new(base.join("jumpline").join("editors.toml")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for TomlSettings {
    fn load(&self) -> Result<Vec<EditorConfig>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| Error::io(format!("reading {}", self.path.display()), e))?;
        let file: SettingsFile = toml::from_str(&raw).map_err(|e| {
            Error::Config(format!("malformed settings file {}: {e}", self.path.display()))
        })?;
        Ok(file.editors)
    }

    fn save(&self, editors: &[EditorConfig]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("creating {}", parent.display()), e))?;
        }
        let file = SettingsFile {
            editors: editors.to_vec(),
        };
        let raw = toml::to_string_pretty(&file)
            .map_err(|e| Error::Config(format!("serializing settings: {e}")))?;

        // Atomic write: temp file + rename, so a crash can't leave a
        // half-written settings file.
        let temp = self.path.with_extension("toml.tmp");
        fs::write(&temp, raw)
            .map_err(|e| Error::io(format!("writing {}", temp.display()), e))?;
        fs::rename(&temp, &self.path)
            .map_err(|e| Error::io(format!("replacing {}", self.path.display()), e))?;
        Ok(())
    }
}

/// In-memory settings for tests and embedded hosts.
#[derive(Default)]
pub struct MemorySettings {
    editors: Arc<Mutex<Vec<EditorConfig>>>,
}

impl MemorySettings {
    /// A handle sharing this store's data, for inspecting saves in tests.
    pub fn handle(&self) -> Arc<Mutex<Vec<EditorConfig>>> {
        Arc::clone(&self.editors)
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Result<Vec<EditorConfig>> {
        Ok(self.editors.lock().clone())
    }

    fn save(&self, editors: &[EditorConfig]) -> Result<()> {
        *self.editors.lock() = editors.to_vec();
        Ok(())
    }
}

/// Caching decorator over another settings store.
///
/// Loads are served from the `settings:` cache namespace while fresh, so a
/// burst of jump triggers reads the settings file at most once per TTL
/// window. Saves write through and refresh the cached value.
pub struct CachedSettings<S> {
    inner: S,
    cache: Namespace<Vec<EditorConfig>>,
}

impl<S: SettingsStore> CachedSettings<S> {
    const KEY: &'static str = "editors";

    pub fn new(inner: S, cache: Namespace<Vec<EditorConfig>>) -> Self {
        Self { inner, cache }
    }
}

impl<S: SettingsStore> SettingsStore for CachedSettings<S> {
    fn load(&self) -> Result<Vec<EditorConfig>> {
        if let Some(editors) = self.cache.get(Self::KEY) {
            return Ok(editors);
        }
        let editors = self.inner.load()?;
        self.cache.set(Self::KEY, editors.clone());
        Ok(editors)
    }

    fn save(&self, editors: &[EditorConfig]) -> Result<()> {
        self.inner.save(editors)?;
        if !self.cache.set(Self::KEY, editors.to_vec()) {
            // Degraded cache is fine; the next load falls through.
            warn!("settings cache refresh failed");
            self.cache.delete(Self::KEY);
        }
        Ok(())
    }
}
