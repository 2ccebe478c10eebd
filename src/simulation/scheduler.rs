//! Interval timers driving a [`Simulation`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::Simulation;

/// Running set of simulation timers.
///
/// Each timer firing spawns its tick as a separate task. [`Scheduler::stop`]
/// aborts the timers only, so ticks already in flight run to completion and
/// their results are still applied. The remote refresh is not part of the
/// scheduler; see [`Refresher`].
pub struct Scheduler {
    timers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the post, group and discussion timers
    pub fn start(sim: Arc<Simulation>) -> Self {
        let config = sim.config().clone();
        tracing::info!(
            post_secs = config.post_interval_secs,
            group_secs = config.group_interval_secs,
            discussion_secs = config.discussion_interval_secs,
            "simulation started"
        );

        let timers = vec![
            every("post", config.post_interval(), sim.clone(), |sim| async move {
                sim.simulate_action(None, None).await;
            }),
            every("group", config.group_interval(), sim.clone(), |sim| async move {
                sim.group_tick().await;
            }),
            every("discussion", config.discussion_interval(), sim, |sim| async move {
                sim.discussion_tick().await;
            }),
        ];

        Self { timers }
    }

    /// Whether any timer is still running
    pub fn is_running(&self) -> bool {
        self.timers.iter().any(|t| !t.is_finished())
    }

    /// Clear all timers. In-flight ticks are not cancelled.
    pub fn stop(&mut self) {
        if self.timers.is_empty() {
            return;
        }
        for timer in self.timers.drain(..) {
            timer.abort();
        }
        tracing::info!("simulation stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Periodic re-fetch of agents, feed and groups.
///
/// Runs independently of the [`Scheduler`]: stopping the simulation leaves
/// the refresh going until this handle is stopped or dropped.
pub struct Refresher {
    timer: Option<JoinHandle<()>>,
}

impl Refresher {
    /// Start the refresh timer
    pub fn start(sim: Arc<Simulation>) -> Self {
        let period = sim.config().refresh_interval();
        tracing::info!(refresh_secs = period.as_secs(), "refresh started");

        let timer = every("refresh", period, sim, |sim| async move {
            sim.refresh().await;
        });
        Self { timer: Some(timer) }
    }

    /// Whether the refresh timer is still running
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop refreshing. A refresh already in flight is not cancelled.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::info!("refresh stopped");
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn every<F, Fut>(name: &'static str, period: Duration, sim: Arc<Simulation>, tick: F) -> JoinHandle<()>
where
    F: Fn(Arc<Simulation>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; timers fire after one period
        timer.tick().await;

        loop {
            timer.tick().await;
            tracing::trace!(timer = name, "tick");
            tokio::spawn(tick(sim.clone()));
        }
    })
}
