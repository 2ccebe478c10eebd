//! Simulation statistics tracking.
//!
//! Tracks tick outcomes, group activity and generator latencies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Number of generator latencies kept for percentiles
const LATENCY_WINDOW: usize = 1000;

/// Thread-safe simulation statistics
#[derive(Debug, Default)]
pub struct SimulationStats {
    /// Post/comment ticks that ran
    ticks: AtomicU64,
    /// Post/comment ticks dropped because one was in flight
    skipped: AtomicU64,
    /// Actions inserted into the feed
    actions: AtomicU64,
    /// Ticks abandoned on a generator or precondition failure
    failures: AtomicU64,
    /// Groups founded
    groups_founded: AtomicU64,
    /// Group joins
    groups_joined: AtomicU64,
    /// Generator latencies
    latencies: RwLock<Vec<Duration>>,
    /// Start time
    started_at: RwLock<Option<Instant>>,
}

impl SimulationStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: RwLock::new(Some(Instant::now())),
            ..Default::default()
        }
    }

    /// Record a tick that ran
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tick dropped on busy
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inserted action and the generation time it took
    pub fn record_action(&self, latency: Duration) {
        self.actions.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency);
            if latencies.len() > LATENCY_WINDOW {
                latencies.remove(0);
            }
        }
    }

    /// Record an abandoned tick
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a founded group
    pub fn record_group_founded(&self) {
        self.groups_founded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a group join
    pub fn record_group_joined(&self) {
        self.groups_joined.fetch_add(1, Ordering::Relaxed);
    }

    /// Ticks that ran
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks dropped on busy
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Actions inserted
    pub fn actions(&self) -> u64 {
        self.actions.load(Ordering::Relaxed)
    }

    /// Abandoned ticks
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Groups founded
    pub fn groups_founded(&self) -> u64 {
        self.groups_founded.load(Ordering::Relaxed)
    }

    /// Group joins
    pub fn groups_joined(&self) -> u64 {
        self.groups_joined.load(Ordering::Relaxed)
    }

    /// Get p50 generation latency
    pub fn p50_latency(&self) -> Option<Duration> {
        self.percentile_latency(50)
    }

    /// Get p95 generation latency
    pub fn p95_latency(&self) -> Option<Duration> {
        self.percentile_latency(95)
    }

    fn percentile_latency(&self, percentile: usize) -> Option<Duration> {
        let latencies = self.latencies.read().ok()?;
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.clone();
        sorted.sort();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        Some(sorted[idx])
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.started_at
            .read()
            .ok()
            .and_then(|s| s.map(|start| start.elapsed()))
            .unwrap_or_default()
    }

    /// Get summary as JSON-compatible struct
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            ticks: self.ticks(),
            skipped: self.skipped(),
            actions: self.actions(),
            failures: self.failures(),
            groups_founded: self.groups_founded(),
            groups_joined: self.groups_joined(),
            p50_generation_ms: self.p50_latency().map(|d| d.as_secs_f64() * 1000.0),
            p95_generation_ms: self.p95_latency().map(|d| d.as_secs_f64() * 1000.0),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

/// Statistics summary for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    /// Post/comment ticks that ran.
    pub ticks: u64,
    /// Ticks dropped because one was in flight.
    pub skipped: u64,
    /// Actions inserted into the feed.
    pub actions: u64,
    /// Abandoned ticks.
    pub failures: u64,
    /// Groups founded.
    pub groups_founded: u64,
    /// Group joins.
    pub groups_joined: u64,
    /// Median generation latency in milliseconds.
    pub p50_generation_ms: Option<f64>,
    /// 95th percentile generation latency in milliseconds.
    pub p95_generation_ms: Option<f64>,
    /// Seconds since the simulation was created.
    pub uptime_secs: u64,
}
