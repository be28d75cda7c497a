//! Periodic driver for the update cycle.
//!
//! Two states, `Idle` and `Running`. A pass runs once at startup and then on
//! a fixed interval, forever. A tick that arrives while a pass is still
//! running is skipped, never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use rates_types::{FeedSource, RateStore, UpdateResult};

use crate::UpdateCycle;

/// Whether a pass is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Outcome of asking for a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Ran(UpdateResult),
    /// Another pass held the scheduler; nothing was done.
    Skipped,
}

/// Anything that can trigger a refresh on demand.
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
    async fn refresh(&self) -> Tick;
}

/// Resets the running flag when a pass ends, including when its future is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cloneable handle sharing the scheduler's non-overlap guard.
pub struct SchedulerHandle<F: FeedSource, S: RateStore> {
    cycle: Arc<UpdateCycle<F, S>>,
    running: Arc<AtomicBool>,
}

impl<F: FeedSource, S: RateStore> Clone for SchedulerHandle<F, S> {
    fn clone(&self) -> Self {
        Self {
            cycle: Arc::clone(&self.cycle),
            running: Arc::clone(&self.running),
        }
    }
}

impl<F: FeedSource, S: RateStore> SchedulerHandle<F, S> {
    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Runs one pass unless one is already running.
    pub async fn run_once(&self) -> Tick {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Update already running, skipping tick");
            return Tick::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        Tick::Ran(self.cycle.run().await)
    }
}

#[async_trait]
impl<F: FeedSource, S: RateStore> Refresh for SchedulerHandle<F, S> {
    async fn refresh(&self) -> Tick {
        self.run_once().await
    }
}

/// Drives `UpdateCycle` at startup and then every `period`.
pub struct Scheduler<F: FeedSource, S: RateStore> {
    handle: SchedulerHandle<F, S>,
    period: Duration,
}

impl<F: FeedSource, S: RateStore> Scheduler<F, S> {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10 * 60);

    pub fn new(cycle: UpdateCycle<F, S>, period: Duration) -> Self {
        Self {
            handle: SchedulerHandle {
                cycle: Arc::new(cycle),
                running: Arc::new(AtomicBool::new(false)),
            },
            period,
        }
    }

    pub fn handle(&self) -> SchedulerHandle<F, S> {
        self.handle.clone()
    }

    pub fn state(&self) -> SchedulerState {
        self.handle.state()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs forever. The first pass completes before the timer starts.
    pub async fn run(self) {
        info!(period_secs = self.period.as_secs(), "Scheduler started");
        self.handle.run_once().await;

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Tick::Skipped = self.handle.run_once().await {
                info!("Previous update still running, tick skipped");
            }
        }
    }
}
