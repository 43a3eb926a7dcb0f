//! Synthetic progress for a request whose real progress is opaque.
//!
//! Once armed, the simulator jumps to `initial_jump_value` after
//! `initial_jump_ms`, then adds `increment_value` every
//! `increment_interval_ms` up to `max_progress`. Both timers are owned here
//! and cancelled on every disarm, so nothing fires after `complete`,
//! `cancel` or `reset` returns.

use std::time::Duration;

use tracing::debug;

use crate::config::SimulatedProgressConfig;
use crate::timer::{TimerHandle, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimulatorTimer {
    InitialJump,
    Increment,
}

/// Timer-driven progress value in `0..=100`.
#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    config: SimulatedProgressConfig,
    progress: u8,
    clock: TimerQueue<SimulatorTimer>,
    jump: Option<TimerHandle>,
    increment: Option<TimerHandle>,
}

impl ProgressSimulator {
    pub fn new(config: SimulatedProgressConfig) -> Self {
        Self {
            config,
            progress: 0,
            clock: TimerQueue::new(),
            jump: None,
            increment: None,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Whether any simulator timer is pending.
    pub fn is_armed(&self) -> bool {
        self.jump.is_some() || self.increment.is_some()
    }

    /// Start a fresh curve from zero.
    pub fn arm(&mut self) {
        self.disarm();
        self.progress = 0;
        self.jump = Some(self.clock.schedule_once(
            Duration::from_millis(self.config.initial_jump_ms),
            SimulatorTimer::InitialJump,
        ));
    }

    /// Stop the curve and show a full bar.
    ///
    /// 100 is set even when it exceeds `max_progress`.
    pub fn complete(&mut self) {
        self.disarm();
        self.progress = 100;
    }

    /// Stop the curve and clear the bar.
    pub fn cancel(&mut self) {
        self.disarm();
        self.progress = 0;
    }

    /// Same effect as [`ProgressSimulator::cancel`], used when the whole form resets.
    pub fn reset(&mut self) {
        self.cancel();
    }

    /// Override the value directly. Timers are left alone.
    pub fn set(&mut self, value: u8) {
        self.progress = value.min(100);
    }

    /// Run every timer due within `elapsed`. Returns true if progress changed.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let until = self.clock.now() + elapsed;
        let before = self.progress;

        while let Some((handle, timer)) = self.clock.pop_due(until) {
            match timer {
                SimulatorTimer::InitialJump => {
                    if self.jump == Some(handle) {
                        self.jump = None;
                    }
                    self.apply_jump();
                    self.increment = Some(self.clock.schedule_repeating(
                        Duration::from_millis(self.config.increment_interval_ms),
                        SimulatorTimer::Increment,
                    ));
                }
                SimulatorTimer::Increment => self.apply_increment(),
            }
        }
        self.clock.settle(until);

        self.progress != before
    }

    fn apply_jump(&mut self) {
        let target = self.config.initial_jump_value.min(self.config.max_progress);
        self.progress = self.progress.max(target);
        debug!(progress = self.progress, "simulated progress jump");
    }

    fn apply_increment(&mut self) {
        if self.progress >= self.config.max_progress {
            return;
        }
        self.progress = self
            .progress
            .saturating_add(self.config.increment_value)
            .min(self.config.max_progress);
        debug!(progress = self.progress, "simulated progress tick");
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.jump.take() {
            self.clock.cancel(handle);
        }
        if let Some(handle) = self.increment.take() {
            self.clock.cancel(handle);
        }
    }
}
