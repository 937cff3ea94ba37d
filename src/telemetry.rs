//! Lightweight performance timers for jump-path observability.
//!
//! Timers are transient: created on `start`, completed on the matching
//! `end`. A start without a matching end stays in the registry until
//! [`TimerRegistry::clear`] is called — a documented limitation of this
//! model, not something the registry tries to repair on its own.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

struct ActiveTimer {
    started_at: Instant,
    metadata: Option<serde_json::Value>,
}

/// A finished measurement.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedTimer {
    pub name: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Named in-flight timers.
#[derive(Default)]
pub struct TimerRegistry {
    active: Mutex<HashMap<String, ActiveTimer>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the named timer.
    pub fn start(&self, name: &str) {
        self.start_with_metadata(name, None);
    }

    pub fn start_with_metadata(&self, name: &str, metadata: Option<serde_json::Value>) {
        self.active.lock().insert(
            name.to_string(),
            ActiveTimer {
                started_at: Instant::now(),
                metadata,
            },
        );
    }

    /// Complete the named timer. Returns `None` when no matching start
    /// exists.
    pub fn end(&self, name: &str) -> Option<CompletedTimer> {
        let timer = self.active.lock().remove(name)?;
        Some(CompletedTimer {
            name: name.to_string(),
            duration_ms: timer.started_at.elapsed().as_millis() as u64,
            metadata: timer.metadata,
        })
    }

    /// Number of timers started but not yet ended.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Drop all unmatched timers.
    pub fn clear(&self) {
        self.active.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn start_end_measures_elapsed_time() {
        let timers = TimerRegistry::new();
        timers.start("jump");
        tokio::time::advance(Duration::from_millis(120)).await;

        let completed = timers.end("jump").unwrap();
        assert_eq!(completed.name, "jump");
        assert_eq!(completed.duration_ms, 120);
        assert_eq!(timers.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn end_without_start_returns_none() {
        let timers = TimerRegistry::new();
        assert!(timers.end("never-started").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unmatched_starts_accumulate_until_cleared() {
        let timers = TimerRegistry::new();
        timers.start("a");
        timers.start("b");
        assert_eq!(timers.active_count(), 2);

        timers.clear();
        assert_eq!(timers.active_count(), 0);
        assert!(timers.end("a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn metadata_travels_with_the_timer() {
        let timers = TimerRegistry::new();
        timers.start_with_metadata("jump", Some(serde_json::json!({"file": "a.rs"})));
        let completed = timers.end("jump").unwrap();
        assert_eq!(completed.metadata.unwrap()["file"], "a.rs");
    }
}
