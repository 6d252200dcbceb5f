//! Per-route log suppression.
//!
//! # State Transitions
//! ```text
//! unseen → seen(first_seen_at = now)         first event, logged
//! seen, now - first_seen_at <  period        suppressed
//! seen, now - first_seen_at >= period        logged
//! ```
//!
//! `first_seen_at` is never updated, so once the window has elapsed every
//! later event for the route is logged again. The window does not re-arm.
//! Entries live for the process lifetime: reconfiguring replaces the route
//! set and period but keeps the table.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Decides whether an event for a route key should be logged.
#[derive(Debug, Default)]
pub struct QuietDownTracker {
    routes: HashSet<String>,
    period: Duration,
    first_seen: Arc<DashMap<String, Instant>>,
}

impl QuietDownTracker {
    pub fn new(routes: impl IntoIterator<Item = String>, period: Duration) -> Self {
        Self {
            routes: routes.into_iter().collect(),
            period,
            first_seen: Arc::new(DashMap::new()),
        }
    }

    /// A tracker with new routes and period sharing this tracker's entries.
    pub fn reconfigured(&self, routes: impl IntoIterator<Item = String>, period: Duration) -> Self {
        Self {
            routes: routes.into_iter().collect(),
            period,
            first_seen: Arc::clone(&self.first_seen),
        }
    }

    /// Returns false while `route` is inside its quiet-down window.
    pub fn should_log(&self, route: &str, now: Instant) -> bool {
        if !self.routes.contains(route) {
            return true;
        }

        if let Some(first_seen) = self.first_seen.get(route) {
            return now.saturating_duration_since(*first_seen) >= self.period;
        }

        // Check-or-insert under the shard lock; a concurrent first event may have won.
        match self.first_seen.entry(route.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
            Entry::Occupied(entry) => now.saturating_duration_since(*entry.get()) >= self.period,
        }
    }

    /// Number of routes seen so far.
    pub fn tracked(&self) -> usize {
        self.first_seen.len()
    }
}
