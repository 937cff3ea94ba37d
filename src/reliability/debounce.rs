//! Debounced function wrapper with leading/trailing edges and a max-wait
//! bound.
//!
//! A [`Debouncer`] wraps an action and coalesces bursts of calls into at
//! most one invocation per quiet window (or two, with both edges enabled).
//! `max_wait` puts an upper bound on deferral under continuous calling
//! pressure: once exceeded, a forced invocation occurs at that boundary.
//!
//! Within a single window only the most recent call's arguments are
//! ultimately invoked (unless the leading edge already fired). The wrapper
//! exposes `cancel()`, `flush()`, and `pending()` for callers that need to
//! discard, force, or observe a scheduled invocation.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::constants::DEFAULT_DEBOUNCE_WAIT;
use crate::error::Result;
use crate::validate;

/// Edge and window configuration for a [`Debouncer`].
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Quiet window that must elapse before a trailing invocation.
    pub wait: Duration,
    /// Invoke immediately on the first call of a quiet window.
    pub leading: bool,
    /// Invoke once more with the final call's arguments when the window
    /// closes.
    pub trailing: bool,
    /// Upper bound on deferral under continuous calling pressure.
    pub max_wait: Option<Duration>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            wait: DEFAULT_DEBOUNCE_WAIT,
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }
}

struct DebounceState<A, R> {
    last_call_at: Option<Instant>,
    last_invoke_at: Option<Instant>,
    pending_args: Option<A>,
    last_result: Option<R>,
    /// Bumped to invalidate in-flight timer tasks.
    timer_generation: u64,
    timer_active: bool,
}

struct DebounceInner<A, R> {
    action: Box<dyn Fn(A) -> R + Send + Sync>,
    config: DebounceConfig,
    state: Mutex<DebounceState<A, R>>,
}

/// Debounced wrapper around an action. Cloning shares the same window
/// state.
pub struct Debouncer<A, R = ()> {
    inner: Arc<DebounceInner<A, R>>,
}

impl<A, R> Clone for Debouncer<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> Debouncer<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Wrap `action` with the given window configuration.
    pub fn new<F>(action: F, config: DebounceConfig) -> Result<Self>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        validate::debounce_params(config.wait, config.max_wait)?;
        Ok(Self {
            inner: Arc::new(DebounceInner {
                action: Box::new(action),
                config,
                state: Mutex::new(DebounceState {
                    last_call_at: None,
                    last_invoke_at: None,
                    pending_args: None,
                    last_result: None,
                    timer_generation: 0,
                    timer_active: false,
                }),
            }),
        })
    }

    /// Throttle: at most one invocation per `window`, leading edge on.
    pub fn throttle<F>(action: F, window: Duration) -> Result<Self>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::new(
            action,
            DebounceConfig {
                wait: window,
                leading: true,
                trailing: true,
                max_wait: Some(window),
            },
        )
    }

    /// Record a call. Returns the invocation result when this call fired an
    /// edge synchronously (leading edge or max-wait boundary).
    pub fn call(&self, args: A) -> Option<R> {
        let now = Instant::now();
        let mut invoke_args = None;
        {
            let mut state = self.inner.state.lock();
            let is_invoking = should_invoke(&self.inner.config, &state, now);
            state.last_call_at = Some(now);
            state.pending_args = Some(args);

            if is_invoking {
                if !state.timer_active {
                    // Leading edge of a fresh window.
                    state.last_invoke_at = Some(now);
                    self.start_timer(&mut state, self.inner.config.wait);
                    if self.inner.config.leading {
                        invoke_args = state.pending_args.take();
                    }
                } else if self.inner.config.max_wait.is_some() {
                    // Continuous pressure hit the max-wait boundary.
                    state.last_invoke_at = Some(now);
                    self.start_timer(&mut state, self.inner.config.wait);
                    invoke_args = state.pending_args.take();
                }
            } else if !state.timer_active {
                self.start_timer(&mut state, self.inner.config.wait);
            }
        }
        invoke_args.map(|args| self.invoke(args))
    }

    /// Discard any scheduled invocation and reset window state. The last
    /// stored result is kept.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.timer_generation += 1;
        state.timer_active = false;
        state.last_call_at = None;
        state.last_invoke_at = None;
        state.pending_args = None;
    }

    /// Force a pending trailing invocation to run now. Returns the newest
    /// result (the flushed one, or the last stored result when nothing was
    /// pending).
    pub fn flush(&self) -> Option<R> {
        let mut invoke_args = None;
        {
            let mut state = self.inner.state.lock();
            if state.timer_active {
                state.timer_generation += 1;
                state.timer_active = false;
                if self.inner.config.trailing && state.pending_args.is_some() {
                    state.last_invoke_at = Some(Instant::now());
                    invoke_args = state.pending_args.take();
                } else {
                    state.pending_args = None;
                }
            }
        }
        match invoke_args {
            Some(args) => Some(self.invoke(args)),
            None => self.inner.state.lock().last_result.clone(),
        }
    }

    /// Whether an invocation is currently scheduled.
    pub fn pending(&self) -> bool {
        self.inner.state.lock().timer_active
    }

    /// Run the action outside any lock and store the result.
    fn invoke(&self, args: A) -> R {
        let result = (self.inner.action)(args);
        self.inner.state.lock().last_result = Some(result.clone());
        result
    }

    fn start_timer(&self, state: &mut DebounceState<A, R>, delay: Duration) {
        state.timer_generation += 1;
        state.timer_active = true;
        let generation = state.timer_generation;
        let weak = Arc::downgrade(&self.inner);
        let deadline = Instant::now() + delay;
        tokio::spawn(run_timer(weak, generation, deadline));
    }
}

/// Whether a call observed at `now` should invoke: the quiet window has
/// elapsed, the max-wait bound is exceeded, or this is the first call. A
/// call timestamped in the future (clock skew) counts as an elapsed window
/// rather than deferring forever.
fn should_invoke<A, R>(
    config: &DebounceConfig,
    state: &DebounceState<A, R>,
    now: Instant,
) -> bool {
    let Some(last_call) = state.last_call_at else {
        return true;
    };
    match now.checked_duration_since(last_call) {
        None => true,
        Some(since_call) => {
            if since_call >= config.wait {
                return true;
            }
            if let (Some(max_wait), Some(last_invoke)) = (config.max_wait, state.last_invoke_at) {
                if now.saturating_duration_since(last_invoke) >= max_wait {
                    return true;
                }
            }
            false
        }
    }
}

/// Time still owed before the trailing edge may fire.
fn remaining_wait<A, R>(
    config: &DebounceConfig,
    state: &DebounceState<A, R>,
    now: Instant,
) -> Duration {
    let since_call = state
        .last_call_at
        .map(|at| now.saturating_duration_since(at))
        .unwrap_or_default();
    let waiting = config.wait.saturating_sub(since_call);
    match (config.max_wait, state.last_invoke_at) {
        (Some(max_wait), Some(last_invoke)) => {
            let since_invoke = now.saturating_duration_since(last_invoke);
            waiting.min(max_wait.saturating_sub(since_invoke))
        }
        _ => waiting,
    }
}

async fn run_timer<A, R>(weak: Weak<DebounceInner<A, R>>, generation: u64, mut deadline: Instant)
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    loop {
        tokio::time::sleep_until(deadline).await;
        let Some(inner) = weak.upgrade() else { return };
        let mut invoke_args = None;
        {
            let mut state = inner.state.lock();
            if state.timer_generation != generation || !state.timer_active {
                return;
            }
            let now = Instant::now();
            if should_invoke(&inner.config, &state, now) {
                // Trailing edge.
                state.timer_active = false;
                if inner.config.trailing && state.pending_args.is_some() {
                    state.last_invoke_at = Some(now);
                    invoke_args = state.pending_args.take();
                } else {
                    state.pending_args = None;
                }
            } else {
                // Calls are still arriving; wait out the remainder.
                deadline = now + remaining_wait(&inner.config, &state, now);
                continue;
            }
        }
        if let Some(args) = invoke_args {
            let result = (inner.action)(args);
            inner.state.lock().last_result = Some(result);
        }
        return;
    }
}
