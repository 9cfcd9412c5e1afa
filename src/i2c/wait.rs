// Licensed under the Apache-2.0 license

//! Blocking primitive used by every busy-flag poll in the engine.
//!
//! [`Spin`] waits forever, which is the classic Wiring contract. [`Deadline`]
//! bounds each wait so a dead controller surfaces as a timeout instead of a
//! hang.

use embedded_hal::delay::DelayNs;
use fugit::MicrosDurationU32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaitTimeout;

pub trait WaitPolicy {
    /// Called once before each wait.
    fn start(&mut self);

    /// Called on every poll that found the hardware still busy.
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` once the wait should be abandoned.
    fn poll(&mut self) -> Result<(), WaitTimeout>;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Spin;

impl WaitPolicy for Spin {
    fn start(&mut self) {}

    fn poll(&mut self) -> Result<(), WaitTimeout> {
        core::hint::spin_loop();
        Ok(())
    }
}

pub struct Deadline<D: DelayNs> {
    delay: D,
    budget: MicrosDurationU32,
    step: MicrosDurationU32,
    elapsed_us: u32,
}

impl<D: DelayNs> Deadline<D> {
    pub fn new(delay: D, budget: MicrosDurationU32) -> Self {
        Self {
            delay,
            budget,
            step: MicrosDurationU32::micros(1),
            elapsed_us: 0,
        }
    }

    /// Time slept between polls.
    #[must_use]
    pub fn with_step(mut self, step: MicrosDurationU32) -> Self {
        self.step = step;
        self
    }
}

impl<D: DelayNs> WaitPolicy for Deadline<D> {
    fn start(&mut self) {
        self.elapsed_us = 0;
    }

    fn poll(&mut self) -> Result<(), WaitTimeout> {
        if self.elapsed_us >= self.budget.to_micros() {
            return Err(WaitTimeout);
        }
        self.delay.delay_us(self.step.to_micros());
        self.elapsed_us = self.elapsed_us.saturating_add(self.step.to_micros());
        Ok(())
    }
}
