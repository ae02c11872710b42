//! The logical tick clock that drives Gloomhold's periodic work.
//!
//! Everything time-based in a run is measured in *ticks*, not wall-clock
//! time: ability cooldowns, boss invulnerability windows, run time limits.
//! One tick is 1/20 s at the default rate.
//!
//! - [`TickClock`] is a plain counter. Tests and tools advance it by hand.
//! - [`TickScheduler`] fires ticks at a fixed rate on the Tokio timer and
//!   keeps its own [`TickClock`] in step.
//!
//! The scheduler is meant to sit in an upkeep loop:
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(TickConfig::default());
//! loop {
//!     let info = scheduler.wait_for_tick().await;
//!     manager.lock().await.tick(info.tick);
//!     scheduler.record_tick_end();
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

/// A point on the logical clock.
pub type Tick = u64;

/// Ticks per second of the host game loop.
pub const DEFAULT_TICK_RATE_HZ: u32 = 20;

// ---------------------------------------------------------------------------
// TickClock
// ---------------------------------------------------------------------------

/// A monotonically increasing tick counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickClock {
    now: Tick,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock at an arbitrary tick.
    pub fn starting_at(now: Tick) -> Self {
        Self { now }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Moves the clock forward by one tick and returns the new time.
    pub fn advance(&mut self) -> Tick {
        self.advance_by(1)
    }

    /// Moves the clock forward by `ticks` and returns the new time.
    pub fn advance_by(&mut self, ticks: u64) -> Tick {
        self.now = self.now.saturating_add(ticks);
        self.now
    }

    /// Ticks elapsed since `earlier`. Zero if `earlier` is in the future.
    pub fn since(&self, earlier: Tick) -> u64 {
        self.now.saturating_sub(earlier)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What the clock does when the scheduler wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Drop the missed ticks. The logical clock only counts ticks that
    /// actually ran, so a lagging process runs its game slower.
    #[default]
    Skip,
    /// Count the missed ticks. The clock jumps forward by every elapsed
    /// period so cooldowns and time limits keep pace with wall time, but
    /// upkeep still runs once.
    Advance,
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 = manual mode: the scheduler never fires and the
    /// caller advances time some other way.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the tick budget (0.0–1.0) after which upkeep time is
    /// logged as a warning.
    pub budget_warn_threshold: f64,
    /// Random delay (0–max µs) before the first tick.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Length of one tick, or `None` in manual mode.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
        }
    }

    /// Converts a wall-clock duration to whole ticks at this rate.
    pub fn ticks_in(&self, duration: Duration) -> u64 {
        (duration.as_secs_f64() * self.tick_rate_hz as f64).floor() as u64
    }
}

// ---------------------------------------------------------------------------
// TickInfo
// ---------------------------------------------------------------------------

/// What [`TickScheduler::wait_for_tick`] reports for each fired tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// The logical time after this tick.
    pub tick: Tick,
    /// Fixed length of one tick.
    pub dt: Duration,
    /// Whole periods the scheduler woke up late by (0 when on time).
    pub late_ticks: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-rate tick driver on the Tokio timer.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    clock: TickClock,
    next_tick: Option<TokioInstant>,
    tick_start: Option<Instant>,
    paused: bool,
    total_late_ticks: u64,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = if config.initial_jitter_us > 0 {
                Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + d + jitter
        });

        match tick_duration {
            None => debug!("tick scheduler created in manual mode"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                budget_ms = d.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "tick scheduler created"
            ),
        }

        Self {
            config,
            tick_duration,
            clock: TickClock::new(),
            next_tick,
            tick_start: None,
            paused: false,
            total_late_ticks: 0,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits until the next tick is due and advances the clock.
    ///
    /// Pends forever in manual mode or while paused; inside a
    /// `tokio::select!` the other branches keep running.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, dur) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(dur)) if !self.paused => (next, dur),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let late_ticks = (late_by.as_nanos() / dur.as_nanos()) as u64;
        if late_ticks > 0 {
            self.total_late_ticks += late_ticks;
            warn!(
                tick = self.clock.now(),
                late_ticks,
                policy = ?self.config.policy,
                "tick scheduler fell behind"
            );
        }

        let advanced_by = match self.config.policy {
            TickPolicy::Skip => 1,
            TickPolicy::Advance => 1 + late_ticks,
        };
        let tick = self.clock.advance_by(advanced_by);

        // Reschedule from now so a late wake-up never causes a burst.
        self.next_tick = Some(now + dur);

        trace!(tick, late_ticks, "tick fired");
        TickInfo {
            tick,
            dt: dur,
            late_ticks,
        }
    }

    /// Marks the end of the upkeep work for the current tick and warns if
    /// it used more than the configured share of the budget.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let Some(budget) = self.tick_duration else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.clock.now(),
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "upkeep approaching tick budget"
            );
        }
    }

    /// Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.clock.now(), "tick scheduler paused");
        }
    }

    /// Resumes one full period from now; time spent paused is not
    /// counted.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(dur) = self.tick_duration {
                self.next_tick = Some(TokioInstant::now() + dur);
            }
            debug!(tick = self.clock.now(), "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_manual(&self) -> bool {
        self.tick_duration.is_none()
    }

    /// Current logical time.
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    pub fn clock(&self) -> TickClock {
        self.clock
    }

    pub fn total_late_ticks(&self) -> u64 {
        self.total_late_ticks
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_and_measures() {
        let mut clock = TickClock::new();
        assert_eq!(clock.now(), 0);
        clock.advance();
        clock.advance_by(9);
        assert_eq!(clock.now(), 10);
        assert_eq!(clock.since(4), 6);
        assert_eq!(clock.since(50), 0);
    }

    #[test]
    fn test_clock_saturates() {
        let mut clock = TickClock::starting_at(u64::MAX - 1);
        clock.advance_by(5);
        assert_eq!(clock.now(), u64::MAX);
    }

    #[test]
    fn test_default_rate_is_twenty_hz() {
        let cfg = TickConfig::default();
        assert_eq!(cfg.tick_rate_hz, 20);
        assert_eq!(cfg.tick_duration(), Some(Duration::from_millis(50)));
        assert_eq!(cfg.ticks_in(Duration::from_secs(5)), 100);
    }

    #[test]
    fn test_validated_clamps_rate_and_threshold() {
        let cfg = TickConfig {
            tick_rate_hz: 1000,
            budget_warn_threshold: 3.0,
            ..TickConfig::default()
        }
        .validated();
        assert_eq!(cfg.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
        assert_eq!(cfg.budget_warn_threshold, 1.0);
    }
}
