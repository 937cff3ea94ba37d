//! Time-window call-shaping primitives.
//!
//! This module provides:
//!
//! - **Debounce / throttle** — coalesce call bursts with leading/trailing
//!   edges and an optional max-wait bound
//! - **Rate limiting** — sliding-window call budget with explicit
//!   accept/reject
//! - **Retry** — bounded fixed-delay re-attempts via
//!   [backon](https://docs.rs/backon)
//! - **Batching** — flush by size or timer, whichever comes first
//! - **Once** — first-result memoization
//!
//! Each primitive is independent and composable. All of them validate their
//! parameters at construction and reject unusable values instead of
//! misbehaving later.

mod batch;
mod debounce;
mod once;
mod rate_limit;
mod retry;

pub use batch::Batcher;
pub use debounce::{DebounceConfig, Debouncer};
pub use once::Once;
pub use rate_limit::RateLimiter;
pub use retry::Retry;
