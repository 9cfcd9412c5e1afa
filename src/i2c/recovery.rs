// Licensed under the Apache-2.0 license

//! I2C bus recovery
//!
//! A slave that lost power or was reset in the middle of a read can keep SDA
//! (and with clock stretching, SCL) low forever. These helpers free the bus
//! by driving the lines as GPIOs, separate from the protocol code in the
//! engine.

use crate::i2c::common::RecoveryConfig;
use crate::i2c::traits::{BusRecoveryPins, I2cMaster};
use crate::i2c::wait::{WaitPolicy, WaitTimeout};
use embedded_hal::delay::DelayNs;

/// Result of [`BusRecovery::pulse_scl`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Passes run, never more than the configured limit.
    pub passes: u8,
    /// The controller no longer reports the bus as busy.
    pub released: bool,
}

pub struct BusRecovery;

impl BusRecovery {
    /// Put a STOP on the bus by hand and reset the controller.
    ///
    /// Used when SCL is already low before the controller is configured.
    /// The reset is required: without it the controller drives the bus back
    /// into the state it was stuck in.
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the controller does not come out of reset
    /// within the wait policy's budget.
    pub fn force_stop<H, W>(hardware: &mut H, wait: &mut W) -> Result<(), WaitTimeout>
    where
        H: BusRecoveryPins,
        W: WaitPolicy,
    {
        hardware.pins_to_gpio();
        hardware.set_sda(false);
        hardware.set_scl(true);
        hardware.set_sda(true);

        hardware.reset_peripheral();
        wait.start();
        while !hardware.peripheral_ready() {
            wait.poll()?;
        }
        Ok(())
    }

    /// Toggle SCL until the controller sees the bus free, in passes of
    /// `config.pulses` level changes, for at most `config.passes` passes.
    ///
    /// The pins are handed back to the controller afterwards either way.
    pub fn pulse_scl<H, D>(hardware: &mut H, delay: &mut D, config: &RecoveryConfig) -> RecoveryOutcome
    where
        H: I2cMaster + BusRecoveryPins,
        D: DelayNs,
    {
        hardware.scl_to_gpio();

        let mut passes: u8 = 0;
        loop {
            for pulse in 0..config.pulses {
                delay.delay_us(config.half_period_us);
                hardware.set_scl(pulse % 2 == 1);
            }
            passes = passes.saturating_add(1);
            if !hardware.is_bus_busy() || passes >= config.passes {
                break;
            }
        }

        hardware.pins_to_i2c();
        RecoveryOutcome {
            passes,
            released: !hardware.is_bus_busy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::mock::{CountingDelay, HwEvent, MockHardware};
    use crate::i2c::wait::Spin;

    #[test]
    fn test_force_stop_drives_stop_condition_then_resets() {
        let mut hw = MockHardware::new();
        hw.ready_after_polls = 3;

        assert!(BusRecovery::force_stop(&mut hw, &mut Spin).is_ok());
        assert_eq!(
            hw.events,
            vec![
                HwEvent::PinsGpio,
                HwEvent::Sda(false),
                HwEvent::Scl(true),
                HwEvent::Sda(true),
                HwEvent::Reset,
            ]
        );
        assert_eq!(hw.ready_polls, 4);
    }

    #[test]
    fn test_pulse_scl_stops_once_bus_is_released() {
        let mut hw = MockHardware::new();
        hw.bus_busy_polls = 1;
        let mut delay = CountingDelay::default();
        let config = RecoveryConfig::default();

        let outcome = BusRecovery::pulse_scl(&mut hw, &mut delay, &config);

        assert_eq!(outcome, RecoveryOutcome { passes: 2, released: true });
        assert_eq!(hw.scl_writes(), 20);
        assert_eq!(hw.events.first(), Some(&HwEvent::SclGpio));
        assert_eq!(hw.events.last(), Some(&HwEvent::PinsI2c));
        assert_eq!(delay.total_ns, 20 * 5_000);
    }

    #[test]
    fn test_pulse_scl_alternates_low_then_high() {
        let mut hw = MockHardware::new();
        let config = RecoveryConfig::default();

        BusRecovery::pulse_scl(&mut hw, &mut CountingDelay::default(), &config);

        let levels: Vec<bool> = hw
            .events
            .iter()
            .filter_map(|e| match e {
                HwEvent::Scl(level) => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels.len(), 10);
        assert!(levels.iter().enumerate().all(|(i, level)| *level == (i % 2 == 1)));
    }
}
