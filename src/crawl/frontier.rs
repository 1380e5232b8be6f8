// src/crawl/frontier.rs
// =============================================================================
// The frontier: URLs waiting to be fetched.
//
// - Last in, first out, so the crawl goes deep before it goes wide.
// - Remembers every URL it has ever seen, so cycles (A -> B -> A) end.
// - Counts the URLs currently being worked on ("claims").
//
// The crawl is over when the stack is empty AND nothing is in flight. Both
// numbers live under the same lock, so there's no window where a task has
// popped a URL but hasn't pushed its children yet and the driver wrongly
// thinks everything is done.
//
// A claim gives its slot back when it is dropped (even if the task panics)
// and wakes the driver up.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// One pending URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub url: String,
    /// Hops from the seed it was found through (seeds are 0)
    pub depth: usize,
    /// How many times this URL was already tried
    pub attempts: usize,
}

impl Entry {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            attempts: 0,
        }
    }

    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
            attempts: 0,
        }
    }

    pub fn retry(&self) -> Self {
        Self {
            attempts: self.attempts + 1,
            ..self.clone()
        }
    }
}

#[derive(Default)]
struct State {
    stack: Vec<Entry>,
    seen: HashSet<String>,
    in_flight: usize,
}

#[derive(Default)]
pub struct Frontier {
    state: Mutex<State>,
    wake: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // The state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Records `url` as seen; returns false if it was already known
    pub fn mark_seen(&self, url: &str) -> bool {
        self.lock().seen.insert(url.to_string())
    }

    pub fn push(&self, entry: Entry) {
        self.lock().stack.push(entry);
        self.wake.notify_one();
    }

    // Takes the most recently pushed entry and claims an in-flight slot for it
    pub fn pop(self: &Arc<Self>) -> Option<Claim> {
        let mut state = self.lock();
        let entry = state.stack.pop()?;
        state.in_flight += 1;
        drop(state);

        Some(Claim {
            entry,
            frontier: Arc::clone(self),
        })
    }

    // Nothing pending and nothing in flight: the crawl is over
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.stack.is_empty() && state.in_flight == 0
    }

    // Waits until something was pushed or a claim was released
    pub async fn changed(&self) {
        self.wake.notified().await;
    }

    fn release(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);
        self.wake.notify_one();
    }
}

/// A popped entry; holds an in-flight slot until dropped
pub struct Claim {
    pub entry: Entry,
    frontier: Arc<Frontier>,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.frontier.release();
    }
}
