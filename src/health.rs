//! Cached reachability of a single backend.
//!
//! The flag starts out `false` and only a probe result moves it. Nothing expires it with time:
//! it is refreshed once at startup and again whenever someone asks for an explicit health check.
//! Readers racing a probe may see the previous value.
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct HealthState {
    reachable: AtomicBool,
}

impl HealthState {
    /// A fresh state, unreachable until a probe succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    /// Store a probe result, returning the previous value.
    pub fn record_probe(&self, reachable: bool) -> bool {
        let previous = self.reachable.swap(reachable, Ordering::AcqRel);
        match (previous, reachable) {
            (false, true) => info!("Backend is now reachable"),
            (true, false) => warn!("Backend is no longer reachable"),
            _ => {}
        }
        previous
    }
}
