//! Detached launch of editor commands, with a live-process table.
//!
//! The executor turns a built command into a running child process and
//! reports the outcome without ever waiting for the child to finish: the
//! launched editor is meant to outlive the triggering action. Children are
//! detached from the host (new session on Unix, detached process group on
//! Windows), registered in a process table keyed by a synthetic id, and
//! removed when they exit. `kill_all` is the blunt shutdown instrument.
//!
//! Success criterion differs per platform family: Unix resolves on a
//! successful spawn; Windows resolves after a short fixed grace delay
//! because GUI launch success is not reliably observable there.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::builder::{CommandCache, Platform};
use crate::cache::Namespace;
use crate::constants::{KILL_ESCALATION_DELAY, WINDOWS_LAUNCH_GRACE};
use crate::context::ProjectContext;
use crate::editors::EditorConfig;
use crate::error::{Error, Result};
use crate::validate;

/// Callback invoked on every failed execution, in addition to the returned
/// result. Lets the host surface a notification without this layer knowing
/// about UI.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Outcome of one execution attempt. Returned synchronously, never
/// persisted.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub command: String,
    pub execution_time: Duration,
    pub error: Option<String>,
    pub process_id: Option<u32>,
}

/// Running totals, recomputed incrementally after every attempt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionStats {
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_time_ms: u64,
    pub average_time_ms: f64,
}

/// A launched child still believed to be running.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedProcess {
    pub pid: u32,
    pub command: String,
    pub started_at: DateTime<Utc>,
}

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub platform: Platform,
    /// Grace delay before a Windows launch is reported successful.
    pub windows_grace: Duration,
}

impl ExecutorConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            windows_grace: WINDOWS_LAUNCH_GRACE,
        }
    }
}

struct ExecutorInner {
    config: ExecutorConfig,
    commands: CommandCache,
    path_checks: Namespace<bool>,
    processes: Mutex<HashMap<u64, TrackedProcess>>,
    next_key: AtomicU64,
    stats: Mutex<ExecutionStats>,
    error_handler: Mutex<Option<ErrorHandler>>,
}

/// Cross-platform launcher for editor jump commands. Cloning shares the
/// process table and statistics.
#[derive(Clone)]
pub struct CommandExecutor {
    inner: Arc<ExecutorInner>,
}

impl CommandExecutor {
    pub fn new(
        config: ExecutorConfig,
        commands: CommandCache,
        path_checks: Namespace<bool>,
    ) -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                config,
                commands,
                path_checks,
                processes: Mutex::new(HashMap::new()),
                next_key: AtomicU64::new(1),
                stats: Mutex::new(ExecutionStats::default()),
                error_handler: Mutex::new(None),
            }),
        }
    }

    /// Install the failure callback. Replaces any previous handler.
    pub fn set_error_handler(&self, handler: ErrorHandler) {
        *self.inner.error_handler.lock() = Some(handler);
    }

    pub fn platform(&self) -> Platform {
        self.inner.config.platform
    }

    /// Validate, build, and launch the jump command for `editor` at the
    /// context's file and line. Resolves once the child is confirmed
    /// started (or the platform grace delay elapses), not when it exits.
    pub async fn execute_jump(
        &self,
        editor: &EditorConfig,
        context: &ProjectContext,
    ) -> ExecutionResult {
        let started = Instant::now();
        match self.prepare(editor, context).await {
            Err(err) => self.finish_failure(String::new(), started, &err),
            Ok(command) => match self.launch(&command).await {
                Ok(pid) => self.finish_success(command, started, pid),
                Err(err) => self.finish_failure(command, started, &err),
            },
        }
    }

    /// Launch an already-built command. Used by hosts that construct
    /// commands themselves; the jump path goes through
    /// [`execute_jump`](Self::execute_jump).
    pub async fn execute_command(&self, command: &str) -> ExecutionResult {
        let started = Instant::now();
        if command.trim().is_empty() {
            let err = Error::validation("command must not be empty");
            return self.finish_failure(String::new(), started, &err);
        }
        match self.launch(command).await {
            Ok(pid) => self.finish_success(command.to_string(), started, pid),
            Err(err) => self.finish_failure(command.to_string(), started, &err),
        }
    }

    /// Record a failure detected before this executor was reached (editor
    /// resolution and similar pre-flight steps), so statistics and the
    /// error handler still see it.
    pub fn preflight_failure(&self, err: &Error) -> ExecutionResult {
        self.finish_failure(String::new(), Instant::now(), err)
    }

    /// Snapshot of the live-process table.
    pub fn running(&self) -> Vec<TrackedProcess> {
        self.inner.processes.lock().values().cloned().collect()
    }

    pub fn running_count(&self) -> usize {
        self.inner.processes.lock().len()
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> ExecutionStats {
        self.inner.stats.lock().clone()
    }

    /// Terminate every tracked process. Returns how many were signalled.
    pub async fn kill_all(&self) -> usize {
        let victims: Vec<TrackedProcess> = {
            let mut processes = self.inner.processes.lock();
            processes.drain().map(|(_, process)| process).collect()
        };
        for victim in &victims {
            kill_process(victim.pid).await;
        }
        if !victims.is_empty() {
            info!(count = victims.len(), "killed tracked processes");
        }
        victims.len()
    }

    async fn prepare(&self, editor: &EditorConfig, context: &ProjectContext) -> Result<String> {
        validate::non_empty_path(&editor.path, "editor path")?;
        context.validate()?;
        if !self.editor_exists(&editor.path).await {
            return Err(Error::editor_not_found(&editor.path));
        }
        self.inner.commands.build(
            &editor.id,
            self.inner.config.platform,
            &editor.path,
            &context.file_path,
            context.line,
        )
    }

    /// Cached existence check for the editor executable.
    async fn editor_exists(&self, path: &str) -> bool {
        if let Some(known) = self.inner.path_checks.get(path) {
            return known;
        }
        let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
        self.inner.path_checks.set(path, exists);
        exists
    }

    async fn launch(&self, command: &str) -> Result<Option<u32>> {
        let mut cmd = if has_shell_tokens(command) {
            shell_command(command)
        } else {
            let argv = split_command(command)?;
            let (program, args) = argv
                .split_first()
                .ok_or_else(|| Error::validation("empty command"))?;
            let mut direct = Command::new(program);
            direct.args(args);
            direct
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::launch(command, e.to_string()))?;
        let pid = child.id();

        let key = self.inner.next_key.fetch_add(1, Ordering::Relaxed);
        if let Some(pid) = pid {
            self.inner.processes.lock().insert(
                key,
                TrackedProcess {
                    pid,
                    command: command.to_string(),
                    started_at: Utc::now(),
                },
            );
        }

        // Reap the child and drop it from the table on exit or error. The
        // handle keeps nothing alive: the child runs in its own session.
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!(%status, "launched process exited"),
                Err(err) => warn!(%err, "failed to observe launched process"),
            }
            if let Some(inner) = weak.upgrade() {
                inner.processes.lock().remove(&key);
            }
        });

        if self.inner.config.platform == Platform::Windows {
            // GUI launch success is not observable here; assume started
            // after the grace delay.
            tokio::time::sleep(self.inner.config.windows_grace).await;
        }
        Ok(pid)
    }

    fn finish_success(
        &self,
        command: String,
        started: Instant,
        pid: Option<u32>,
    ) -> ExecutionResult {
        let elapsed = started.elapsed();
        self.record(true, elapsed);
        info!(
            pid = pid.unwrap_or_default(),
            elapsed_ms = elapsed.as_millis() as u64,
            "launched editor"
        );
        ExecutionResult {
            success: true,
            command,
            execution_time: elapsed,
            error: None,
            process_id: pid,
        }
    }

    fn finish_failure(&self, command: String, started: Instant, err: &Error) -> ExecutionResult {
        let elapsed = started.elapsed();
        self.record(false, elapsed);
        warn!(%err, "jump command failed");
        let handler = self.inner.error_handler.lock().clone();
        if let Some(handler) = handler {
            handler(err);
        }
        ExecutionResult {
            success: false,
            command,
            execution_time: elapsed,
            error: Some(err.to_string()),
            process_id: None,
        }
    }

    fn record(&self, success: bool, elapsed: Duration) {
        let mut stats = self.inner.stats.lock();
        stats.executions += 1;
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
        stats.total_time_ms += elapsed.as_millis() as u64;
        #[allow(clippy::cast_precision_loss)]
        {
            stats.average_time_ms = stats.total_time_ms as f64 / stats.executions as f64;
        }
    }
}

/// Shell metacharacters that require a shell-interpreting launch.
fn has_shell_tokens(command: &str) -> bool {
    command
        .chars()
        .any(|c| matches!(c, '&' | '|' | '>' | '<' | ';' | '`'))
        || command.contains("$(")
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Detach the child from the host process.
///
/// # Safety
///
/// On Unix this registers a `pre_exec` hook calling `setsid()`, which is
/// async-signal-safe per POSIX; the closure performs no allocation or
/// locking.
#[allow(unsafe_code)]
fn detach(cmd: &mut Command) {
    #[cfg(unix)]
    {
        use nix::libc;
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;

        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS | CREATE_NO_WINDOW);
    }
}

/// Split a command into program + arguments, respecting double-quoted
/// segments. Inside quotes, `\\` and `\"` unescape to the bare character;
/// any other backslash sequence is kept verbatim.
fn split_command(command: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = command.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => match chars.next() {
                Some(next @ ('"' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(Error::validation("unterminated quote in command"));
    }
    if has_token {
        tokens.push(current);
    }
    if tokens.is_empty() {
        return Err(Error::validation("empty command"));
    }
    Ok(tokens)
}

/// Terminate one process: polite first, forceful if it lingers.
#[cfg(unix)]
async fn kill_process(pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let target = Pid::from_raw(pid as i32);
    if let Err(err) = signal::kill(target, Signal::SIGTERM) {
        warn!(pid, %err, "failed to signal process");
        return;
    }
    tokio::time::sleep(KILL_ESCALATION_DELAY).await;
    // Signal 0 probes liveness without delivering anything.
    if signal::kill(target, None).is_ok() {
        warn!(pid, "process ignored SIGTERM, sending SIGKILL");
        let _ = signal::kill(target, Signal::SIGKILL);
    }
}

#[cfg(windows)]
async fn kill_process(pid: u32) {
    let polite = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T"])
        .status()
        .await;
    let succeeded = matches!(polite, Ok(status) if status.success());
    if !succeeded {
        if let Err(err) = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .status()
            .await
        {
            warn!(pid, %err, "failed to kill process");
        }
    }
}
