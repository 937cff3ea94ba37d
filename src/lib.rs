// =============================================================================
// Lint Configuration
// =============================================================================

// Safety: deny unsafe by default, allow only where documented
// (Unix setsid detach in command/executor.rs)
#![deny(unsafe_code)]
// Correctness: Must handle all fallible operations
#![deny(unused_must_use)]
// Quality: Pedantic but pragmatic
#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![allow(clippy::module_name_repetitions)] // e.g., cache::CacheStore is clearer
#![allow(clippy::must_use_candidate)] // Not all returned values need annotation
#![allow(clippy::missing_errors_doc)] // Error returns self-documenting via type

//! Jump from a position in one editor to the identical file and line in an
//! externally launched editor (typically a JetBrains IDE).
//!
//! The crate is a small cluster of cooperating utilities:
//!
//! - [`cache`] — TTL+LRU key/value store with periodic sweep and statistics
//! - [`reliability`] — debounce/throttle, rate limiting, retry, batching
//! - [`command`] — per-platform command construction and detached launch
//! - [`editors`] — the configured-editor registry with persistence
//! - [`service`] — the context object wiring everything together
//!
//! # Example
//!
//! ```no_run
//! use jumpline::config::Config;
//! use jumpline::context::ProjectContext;
//! use jumpline::editors::{MemorySettings, NewEditor};
//! use jumpline::service::JumpService;
//!
//! # async fn example() -> jumpline::Result<()> {
//! let service = JumpService::start(Config::default(), Box::new(MemorySettings::default()))?;
//! service.add_editor(NewEditor {
//!     name: "IntelliJ IDEA".to_string(),
//!     path: "/usr/local/bin/idea".to_string(),
//!     kind: Some("intellij".to_string()),
//!     make_default: true,
//! })?;
//!
//! let context = ProjectContext::new("/proj", "/proj/src/main.kt", 42, 1)?;
//! let result = service.jump(&context).await;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod command;
pub mod config;
pub mod constants;
pub mod context;
pub mod editors;
pub mod error;
pub mod reliability;
pub mod service;
pub mod telemetry;
pub mod validate;

pub use error::{Error, Result};
