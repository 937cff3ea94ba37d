//! Command construction and execution for external editor launches.
//!
//! - `builder` turns (editor, file, line) into a platform-idiomatic,
//!   safely quoted command string
//! - `executor` launches that command as a detached child process and
//!   tracks it until exit

pub mod builder;
pub mod executor;

pub use builder::{build_jump_command, CommandCache, Platform};
pub use executor::{
    CommandExecutor, ErrorHandler, ExecutionResult, ExecutionStats, ExecutorConfig,
    TrackedProcess,
};
