//! Batch accumulator that flushes by size or timer, whichever comes first.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::validate;

struct BatchState<T> {
    items: Vec<T>,
    /// Bumped to invalidate in-flight flush timers.
    timer_generation: u64,
    timer_active: bool,
}

struct BatchInner<T> {
    sink: Box<dyn Fn(Vec<T>) + Send + Sync>,
    max_size: usize,
    max_delay: Duration,
    state: Mutex<BatchState<T>>,
}

/// Accumulates items and hands full batches to a sink. Cloning shares the
/// same accumulator.
pub struct Batcher<T> {
    inner: Arc<BatchInner<T>>,
}

impl<T> Clone for Batcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Batcher<T> {
    /// Flush to `sink` when `max_size` items accumulate or `max_delay`
    /// passes since the first unflushed item.
    pub fn new<F>(max_size: usize, max_delay: Duration, sink: F) -> Result<Self>
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        validate::positive(max_size, "batch size")?;
        validate::window(max_delay, "batch delay")?;
        Ok(Self {
            inner: Arc::new(BatchInner {
                sink: Box::new(sink),
                max_size,
                max_delay,
                state: Mutex::new(BatchState {
                    items: Vec::new(),
                    timer_generation: 0,
                    timer_active: false,
                }),
            }),
        })
    }

    /// Add an item, flushing synchronously if the batch is now full.
    pub fn push(&self, item: T) {
        let mut ready = None;
        {
            let mut state = self.inner.state.lock();
            state.items.push(item);
            if state.items.len() >= self.inner.max_size {
                state.timer_generation += 1;
                state.timer_active = false;
                ready = Some(std::mem::take(&mut state.items));
            } else if !state.timer_active {
                self.start_timer(&mut state);
            }
        }
        if let Some(batch) = ready {
            (self.inner.sink)(batch);
        }
    }

    /// Flush whatever has accumulated, resetting any pending timer.
    pub fn flush(&self) {
        let mut ready = None;
        {
            let mut state = self.inner.state.lock();
            state.timer_generation += 1;
            state.timer_active = false;
            if !state.items.is_empty() {
                ready = Some(std::mem::take(&mut state.items));
            }
        }
        if let Some(batch) = ready {
            (self.inner.sink)(batch);
        }
    }

    /// Items currently waiting to be flushed.
    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn start_timer(&self, state: &mut BatchState<T>) {
        state.timer_generation += 1;
        state.timer_active = true;
        let generation = state.timer_generation;
        let weak: Weak<BatchInner<T>> = Arc::downgrade(&self.inner);
        let delay = self.inner.max_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else { return };
            let mut ready = None;
            {
                let mut state = inner.state.lock();
                if state.timer_generation != generation || !state.timer_active {
                    return;
                }
                state.timer_active = false;
                if !state.items.is_empty() {
                    ready = Some(std::mem::take(&mut state.items));
                }
            }
            if let Some(batch) = ready {
                (inner.sink)(batch);
            }
        });
    }
}
