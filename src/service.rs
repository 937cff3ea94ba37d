//! The jump service: one explicit context object wiring the cache stores,
//! the editor registry, the command executor, and the debounced trigger
//! path together.
//!
//! Hosts construct one [`JumpService`] per process and pass it to whatever
//! needs it; there is no hidden global state. [`JumpService::dispose`]
//! tears everything down: caches cleared, sweep timers cancelled, tracked
//! processes killed.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, CacheStats, CacheStore};
use crate::command::{
    CommandCache, CommandExecutor, ErrorHandler, ExecutionResult, ExecutionStats, ExecutorConfig,
    Platform, TrackedProcess,
};
use crate::config::Config;
use crate::context::ProjectContext;
use crate::editors::{
    CachedSettings, EditorConfig, EditorRegistry, EditorUpdate, NewEditor, SettingsStore,
};
use crate::error::{Error, Result};
use crate::reliability::Debouncer;
use crate::telemetry::TimerRegistry;

/// The typed cache stores this service owns. One logical cache per value
/// shape; namespace prefixes keep keys readable across them.
pub struct CacheContext {
    pub commands: CacheStore<String>,
    pub path_checks: CacheStore<bool>,
    pub settings: CacheStore<Vec<EditorConfig>>,
    pub editor_state: CacheStore<EditorConfig>,
}

impl CacheContext {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            commands: CacheStore::new(config.clone()),
            path_checks: CacheStore::new(config.clone()),
            settings: CacheStore::new(config.clone()),
            editor_state: CacheStore::new(config.clone()),
        }
    }

    pub fn start_sweepers(&self) {
        self.commands.start_sweeper();
        self.path_checks.start_sweeper();
        self.settings.start_sweeper();
        self.editor_state.start_sweeper();
    }

    pub fn dispose(&self) {
        self.commands.dispose();
        self.path_checks.dispose();
        self.settings.dispose();
        self.editor_state.dispose();
    }

    /// Counters merged across all stores.
    pub fn stats(&self) -> CacheStats {
        let snapshots = [
            self.commands.stats(),
            self.path_checks.stats(),
            self.settings.stats(),
            self.editor_state.stats(),
        ];
        let mut merged = CacheStats::default();
        for stats in snapshots {
            merged.entries += stats.entries;
            merged.hits += stats.hits;
            merged.misses += stats.misses;
            merged.evictions += stats.evictions;
            merged.expirations += stats.expirations;
        }
        let lookups = merged.hits + merged.misses;
        #[allow(clippy::cast_precision_loss)]
        if lookups > 0 {
            merged.hit_rate = merged.hits as f64 / lookups as f64 * 100.0;
        }
        merged
    }
}

/// JSON-serializable snapshot for the host-side display command. The
/// format is informational, not a compatibility contract.
#[derive(Serialize)]
pub struct Diagnostics {
    pub cache: CacheStats,
    pub executions: ExecutionStats,
    pub running: Vec<TrackedProcess>,
    pub editors: Vec<EditorConfig>,
    pub config: Config,
}

/// Process-wide jump orchestrator.
pub struct JumpService {
    config: Config,
    caches: CacheContext,
    registry: Mutex<EditorRegistry>,
    executor: CommandExecutor,
    timers: TimerRegistry,
    trigger: OnceLock<Debouncer<ProjectContext, ()>>,
}

impl JumpService {
    /// Build and wire the service. Requires a running tokio runtime (sweep
    /// and debounce timers are spawned on it).
    pub fn start(config: Config, settings: Box<dyn SettingsStore>) -> Result<Arc<Self>> {
        Self::start_on(config, settings, Platform::current()?)
    }

    /// [`start`](Self::start) with an explicit platform, for hosts and
    /// tests that build commands for a different target.
    pub fn start_on(
        config: Config,
        settings: Box<dyn SettingsStore>,
        platform: Platform,
    ) -> Result<Arc<Self>> {
        for warning in config.warnings() {
            warn!("{warning}");
        }

        let caches = CacheContext::new(&config.cache_config());
        caches.start_sweepers();

        let registry = EditorRegistry::open(Box::new(CachedSettings::new(
            settings,
            caches.settings.settings(),
        )))?;

        let executor_config = ExecutorConfig {
            platform,
            windows_grace: config.windows_grace(),
        };
        let executor = CommandExecutor::new(
            executor_config,
            CommandCache::new(caches.commands.clone()),
            caches.path_checks.project_path(),
        );

        let debounce_config = config.debounce_config();
        let service = Arc::new(Self {
            config,
            caches,
            registry: Mutex::new(registry),
            executor,
            timers: TimerRegistry::new(),
            trigger: OnceLock::new(),
        });

        let weak = Arc::downgrade(&service);
        let trigger = Debouncer::new(
            move |context: ProjectContext| {
                if let Some(service) = weak.upgrade() {
                    tokio::spawn(async move {
                        let _ = service.jump(&context).await;
                    });
                }
            },
            debounce_config,
        )?;
        let _ = service.trigger.set(trigger);
        Ok(service)
    }

    /// Jump using the default editor.
    pub async fn jump(&self, context: &ProjectContext) -> ExecutionResult {
        self.jump_with(None, context).await
    }

    /// Jump using a specific editor (id, id prefix, or name), or the
    /// default when `selector` is `None`.
    pub async fn jump_with(
        &self,
        selector: Option<&str>,
        context: &ProjectContext,
    ) -> ExecutionResult {
        self.timers.start("jump");
        let result = match self.resolve_editor(selector) {
            Ok(editor) => self.executor.execute_jump(&editor, context).await,
            Err(err) => self.executor.preflight_failure(&err),
        };
        if let Some(timer) = self.timers.end("jump") {
            debug!(
                duration_ms = timer.duration_ms,
                success = result.success,
                "jump finished"
            );
        }
        result
    }

    /// Debounced trigger entry point for bursty host gestures. Fire and
    /// forget: the eventual jump runs on the runtime and its result is
    /// observable through [`diagnostics`](Self::diagnostics).
    pub fn trigger(&self, context: ProjectContext) {
        if let Some(trigger) = self.trigger.get() {
            trigger.call(context);
        }
    }

    /// Install the failure callback invoked for every failed execution.
    pub fn set_error_handler(&self, handler: ErrorHandler) {
        self.executor.set_error_handler(handler);
    }

    // =========================================================================
    // Editor registry operations
    // =========================================================================

    pub fn add_editor(&self, new: NewEditor) -> Result<EditorConfig> {
        let added = self.registry.lock().add(new)?;
        self.caches.editor_state.clear();
        Ok(added)
    }

    pub fn update_editor(&self, id: &str, changes: EditorUpdate) -> Result<EditorConfig> {
        let updated = self.registry.lock().update(id, changes)?;
        self.caches.editor_state.clear();
        Ok(updated)
    }

    pub fn remove_editor(&self, id: &str) -> Result<EditorConfig> {
        let removed = self.registry.lock().remove(id)?;
        self.caches.editor_state.clear();
        Ok(removed)
    }

    pub fn set_default_editor(&self, id: &str) -> Result<()> {
        self.registry.lock().set_default(id)?;
        self.caches.editor_state.clear();
        Ok(())
    }

    pub fn editors(&self) -> Vec<EditorConfig> {
        self.registry.lock().list().to_vec()
    }

    // =========================================================================
    // Observability & lifecycle
    // =========================================================================

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            cache: self.caches.stats(),
            executions: self.executor.stats(),
            running: self.executor.running(),
            editors: self.editors(),
            config: self.config.clone(),
        }
    }

    pub fn execution_stats(&self) -> ExecutionStats {
        self.executor.stats()
    }

    /// Tear the service down: pending trigger discarded, caches cleared,
    /// sweepers cancelled, tracked processes killed.
    pub async fn dispose(&self) {
        if let Some(trigger) = self.trigger.get() {
            trigger.cancel();
        }
        self.caches.dispose();
        let killed = self.executor.kill_all().await;
        self.timers.clear();
        debug!(killed, "jump service disposed");
    }

    /// Resolve the editor for a jump, serving repeat lookups from the
    /// `editor_state:` cache while fresh.
    fn resolve_editor(&self, selector: Option<&str>) -> Result<EditorConfig> {
        let cache = self.caches.editor_state.editor_state();
        let key = selector.unwrap_or("default");
        if let Some(editor) = cache.get(key) {
            return Ok(editor);
        }

        let registry = self.registry.lock();
        let editor = match selector {
            Some(selector) => registry
                .resolve(selector)
                .ok_or_else(|| Error::UnknownEditor {
                    id: selector.to_string(),
                })?,
            None => registry.default_editor().ok_or_else(|| Error::NoEditor {
                hint: "add one with `jumpline editors add`".to_string(),
            })?,
        }
        .clone();
        cache.set(key, editor.clone());
        Ok(editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editors::MemorySettings;
    use std::time::Duration;

    fn sh_editor() -> NewEditor {
        NewEditor {
            name: "fake-ide".to_string(),
            path: "/bin/sh".to_string(),
            kind: None,
            make_default: true,
        }
    }

    fn context() -> ProjectContext {
        ProjectContext::new("/proj", "/proj/src/main.rs", 12, 1).unwrap()
    }

    #[tokio::test]
    async fn jump_without_editors_fails_with_structured_result() {
        let service =
            JumpService::start_on(
                Config::default(),
                Box::new(MemorySettings::default()),
                Platform::Linux,
            )
            .unwrap();

        let result = service.jump(&context()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("no editor configured"));
        assert_eq!(service.execution_stats().failures, 1);
        service.dispose().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn jump_with_default_editor_succeeds() {
        let service =
            JumpService::start_on(
                Config::default(),
                Box::new(MemorySettings::default()),
                Platform::Linux,
            )
            .unwrap();
        service.add_editor(sh_editor()).unwrap();

        let result = service.jump(&context()).await;
        assert!(result.success, "error: {:?}", result.error);
        assert!(result.command.contains("--line 12"));

        let stats = service.execution_stats();
        assert_eq!(stats.executions, 1);
        assert_eq!(stats.successes, 1);
        service.dispose().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn jump_with_selector_resolves_by_name() {
        let service =
            JumpService::start_on(
                Config::default(),
                Box::new(MemorySettings::default()),
                Platform::Linux,
            )
            .unwrap();
        service.add_editor(sh_editor()).unwrap();

        let result = service.jump_with(Some("fake-ide"), &context()).await;
        assert!(result.success);

        let result = service.jump_with(Some("unknown-ide"), &context()).await;
        assert!(!result.success);
        service.dispose().await;
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn trigger_burst_coalesces_into_one_jump() {
        let service =
            JumpService::start_on(
                Config::default(),
                Box::new(MemorySettings::default()),
                Platform::Linux,
            )
            .unwrap();
        service.add_editor(sh_editor()).unwrap();

        for _ in 0..5 {
            service.trigger(context());
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        // Wait out the debounce window, then let the spawned jump finish.
        tokio::time::sleep(Duration::from_secs(2)).await;
        for _ in 0..200 {
            if service.execution_stats().executions >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        assert_eq!(service.execution_stats().executions, 1);
        service.dispose().await;
    }

    #[tokio::test]
    async fn diagnostics_snapshot_serializes() {
        let service =
            JumpService::start_on(
                Config::default(),
                Box::new(MemorySettings::default()),
                Platform::Linux,
            )
            .unwrap();
        service.add_editor(sh_editor()).unwrap();
        let _ = service.jump(&context()).await;

        let diagnostics = service.diagnostics();
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert!(json["executions"]["executions"].as_u64().unwrap() >= 1);
        assert_eq!(json["editors"].as_array().unwrap().len(), 1);
        assert!(json["config"]["debounce"]["wait_ms"].as_u64().is_some());
        service.dispose().await;
    }
}
