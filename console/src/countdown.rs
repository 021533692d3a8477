//! Cleanup countdowns for finished builds.

use metis_types::time::{expiry_for, remaining_ms, retention_fraction};
use metis_types::Timestamp;
use metis_utils::format_duration;
use std::collections::HashMap;
use std::fmt;

/// What a countdown shows at a given instant.
#[derive(Clone, Debug, PartialEq)]
pub enum Countdown {
    /// Artifacts are still kept.
    Active {
        /// `HH:MM:SS` until cleanup.
        remaining: String,
        /// Share of the retention window left, in `[0.0, 1.0]`.
        fraction: f64,
    },
    /// The build never finished, or its artifacts are gone.
    Expired,
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active {
                remaining,
                fraction,
            } => write!(f, "expires in {remaining} ({:.0}%)", fraction * 100.0),
            Self::Expired => f.write_str("not ready or already cleaned up"),
        }
    }
}

/// Expiry instants of tracked builds.
///
/// Only the expiry is stored; every read recomputes the time left from the
/// instant it is given.
#[derive(Clone, Debug)]
pub struct CountdownBoard {
    expiries: HashMap<String, Option<Timestamp>>,
    retention_days: u32,
}

impl CountdownBoard {
    pub fn new(retention_days: u32) -> Self {
        Self {
            expiries: HashMap::new(),
            retention_days,
        }
    }

    /// Start (or restart) tracking a build from its reported end time.
    pub fn track(&mut self, deploy_id: &str, end_build_time: Option<&str>) {
        let expiry = expiry_for(end_build_time, self.retention_days);
        self.expiries.insert(deploy_id.to_string(), expiry);
    }

    pub fn forget(&mut self, deploy_id: &str) {
        self.expiries.remove(deploy_id);
    }

    pub fn is_tracked(&self, deploy_id: &str) -> bool {
        self.expiries.contains_key(deploy_id)
    }

    pub fn expiry(&self, deploy_id: &str) -> Option<Timestamp> {
        self.expiries.get(deploy_id).copied().flatten()
    }

    /// Milliseconds left at `now`; zero for untracked or unfinished builds.
    pub fn remaining(&self, deploy_id: &str, now: Timestamp) -> i64 {
        remaining_ms(self.expiry(deploy_id), now)
    }

    pub fn render(&self, deploy_id: &str, now: Timestamp) -> Countdown {
        let remaining = self.remaining(deploy_id, now);
        if remaining <= 0 {
            return Countdown::Expired;
        }
        Countdown::Active {
            remaining: format_duration(remaining),
            fraction: retention_fraction(remaining, self.retention_days),
        }
    }

    /// Number of tracked builds whose countdown is still running at `now`.
    pub fn active_count(&self, now: Timestamp) -> usize {
        self.expiries
            .values()
            .filter(|expiry| remaining_ms(**expiry, now) > 0)
            .count()
    }
}
