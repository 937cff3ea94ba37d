//! First-result memoization.

use std::sync::OnceLock;

/// Wraps an action so only the first call runs it; every later call gets a
/// clone of the first result and its arguments are ignored.
pub struct Once<A, R> {
    action: Box<dyn Fn(A) -> R + Send + Sync>,
    result: OnceLock<R>,
}

impl<A, R: Clone> Once<A, R> {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            action: Box::new(action),
            result: OnceLock::new(),
        }
    }

    pub fn call(&self, args: A) -> R {
        self.result.get_or_init(|| (self.action)(args)).clone()
    }

    /// Whether the action has run.
    pub fn initialized(&self) -> bool {
        self.result.get().is_some()
    }
}
