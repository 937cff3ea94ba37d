//! Centralized constants for cache, debounce, and launch behavior.
//!
//! All magic numbers in the crate are defined here with documented
//! rationale, so limits can be audited and tuned in one place.

use std::time::Duration;

// =============================================================================
// Cache
// =============================================================================

/// Maximum number of entries the cache store holds before LRU eviction.
/// Rationale: the store only holds per-editor command strings and a handful
/// of path/settings lookups; 100 is generous headroom.
pub const MAX_CACHE_ENTRIES: usize = 100;

/// Interval between periodic sweeps of expired entries.
/// Bounds growth from keys that are written but never read again.
pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Default TTL applied when `set` is called without one.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// TTL for settings-file lookups. Settings change rarely but the window is
/// kept tight so edits show up almost immediately.
pub const SETTINGS_TTL: Duration = Duration::from_secs(1);

/// TTL for filesystem path-existence checks. Executable locations rarely
/// change mid-session.
pub const PROJECT_PATH_TTL: Duration = Duration::from_secs(5);

/// TTL for editor-state lookups.
pub const EDITOR_STATE_TTL: Duration = Duration::from_secs(5);

/// TTL for built command strings, keyed by (editor id, platform).
/// Callers tolerate a stale command only inside this window.
pub const COMMAND_TTL: Duration = Duration::from_secs(5);

/// Upper bound accepted for a caller-supplied TTL (24 hours).
/// Larger values are almost certainly a unit mistake.
pub const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// Debounce / throttle
// =============================================================================

/// Default debounce window for the jump trigger path.
/// Rationale: coalesces double-fired shortcut events without a perceptible
/// delay for a deliberate single trigger.
pub const DEFAULT_DEBOUNCE_WAIT: Duration = Duration::from_millis(300);

/// Default upper bound on trigger deferral under continuous calling
/// pressure.
pub const DEFAULT_DEBOUNCE_MAX_WAIT: Duration = Duration::from_millis(1000);

// =============================================================================
// Process launch
// =============================================================================

/// Grace delay before a Windows launch is reported successful. GUI launch
/// success is not reliably observable there; after this delay the process
/// is assumed started.
pub const WINDOWS_LAUNCH_GRACE: Duration = Duration::from_millis(500);

/// Delay between SIGTERM and the liveness re-check during `kill_all`.
pub const KILL_ESCALATION_DELAY: Duration = Duration::from_millis(200);

// =============================================================================
// Validation limits
// =============================================================================

/// Maximum accepted path length (4096 bytes).
/// Prevents filesystem issues from pathological inputs.
pub const MAX_PATH_LENGTH: usize = 4096;
