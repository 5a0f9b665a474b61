use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

use crate::events::TriggerCause;

/// Fixed-period Bernoulli trigger. Each tick rolls `1..=roll_max` and fires
/// on a roll of `1`.
pub struct TriggerScheduler<R: Rng = StdRng> {
    tick_interval: Duration,
    roll_max: u32,
    rng: R,
    next_tick: Option<Instant>,
}

impl TriggerScheduler<StdRng> {
    pub fn new(tick_interval: Duration, roll_max: u32) -> Self {
        Self::with_rng(tick_interval, roll_max, StdRng::from_entropy())
    }
}

impl<R: Rng> TriggerScheduler<R> {
    pub fn with_rng(tick_interval: Duration, roll_max: u32, rng: R) -> Self {
        Self {
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            roll_max: roll_max.max(1),
            rng,
            next_tick: None,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn roll_max(&self) -> u32 {
        self.roll_max
    }

    pub fn start(&mut self, now: Instant) {
        self.next_tick = Some(now + self.tick_interval);
        tracing::info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            roll_max = self.roll_max,
            "trigger scheduler started"
        );
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Run the tick if it is due. Missed periods are not replayed; the next
    /// tick is scheduled one interval after `now`.
    pub fn poll(&mut self, now: Instant) -> Option<TriggerCause> {
        let due = self.next_tick?;
        if now < due {
            return None;
        }
        self.next_tick = Some(now + self.tick_interval);
        self.tick()
    }

    pub fn tick(&mut self) -> Option<TriggerCause> {
        let roll = self.rng.gen_range(1..=self.roll_max);
        tracing::info!("Roll: {roll}");
        (roll == 1).then_some(TriggerCause::Roll(roll))
    }

    pub fn force_trigger(&self) -> TriggerCause {
        TriggerCause::Forced
    }
}
