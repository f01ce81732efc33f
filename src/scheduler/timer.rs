//! Timer bookkeeping shared between the presenter and its event loop.
//!
//! The presenter only records which timers should run and when they must
//! restart; the event loop owns the actual tokio intervals and keeps them in
//! step with that plan.

use std::future;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Period of the scroll animation.
pub const SCROLL_TICK: Duration = Duration::from_millis(100);

/// Desired state of one timer.
///
/// `epoch` changes every time the timer is armed or disarmed, so an event
/// loop can tell a restart from an unchanged timer with the same period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSlot {
    period: Option<Duration>,
    epoch: u64,
}

impl TimerSlot {
    /// Arms the timer, restarting it from zero if it was already running.
    pub fn arm(&mut self, period: Duration) {
        self.period = Some(period);
        self.epoch += 1;
    }

    pub fn disarm(&mut self) {
        if self.period.take().is_some() {
            self.epoch += 1;
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_armed(&self) -> bool {
        self.period.is_some()
    }
}

/// The three timers of one instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerPlan {
    pub refresh: TimerSlot,
    pub cycle: TimerSlot,
    pub scroll: TimerSlot,
}

impl TimerPlan {
    pub fn disarm_all(&mut self) {
        self.refresh.disarm();
        self.cycle.disarm();
        self.scroll.disarm();
    }
}

/// A tokio interval following a [`TimerSlot`].
#[derive(Debug, Default)]
pub(crate) struct Ticker {
    epoch: u64,
    interval: Option<Interval>,
}

impl Ticker {
    /// Recreates the interval when the slot was re-armed or disarmed. The
    /// first tick of a new interval comes one full period after arming.
    pub(crate) fn sync(&mut self, slot: &TimerSlot) {
        if self.epoch == slot.epoch() {
            return;
        }
        self.epoch = slot.epoch();
        self.interval = slot.period().map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
    }

    /// Waits for the next tick; never completes while disarmed.
    pub(crate) async fn tick(&mut self) {
        match &mut self.interval {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending().await,
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.interval = None;
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.interval.is_some()
    }
}
