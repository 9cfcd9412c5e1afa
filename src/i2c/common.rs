// Licensed under the Apache-2.0 license

//! Common types and constants for the TwoWire engine.
//!
//! This module provides shared definitions for configuration, the master
//! command encoding, transaction state, and the status lookup applied to the
//! controller's raw error bits.

/// Size of each transfer ring. One slot is always kept empty, so at most
/// `BUFFER_LENGTH - 1` bytes are resident at once.
pub const BUFFER_LENGTH: usize = 32;

/// Raw error bits reported by the master controller.
pub mod raw_error {
    pub const NONE: u32 = 0x00;
    pub const ERROR: u32 = 0x02;
    pub const ADDR_ACK: u32 = 0x04;
    pub const DATA_ACK: u32 = 0x08;
    pub const ARB_LOST: u32 = 0x10;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
}

impl I2cSpeed {
    #[must_use]
    pub const fn hz(self) -> u32 {
        self as u32
    }
}

/// Value written to the master control/status register.
///
/// The bits combine freely; `STOP` alone is also the error-stop command used
/// to release the bus after a failed burst.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct MasterCommand(u8);

impl MasterCommand {
    pub const RUN: Self = Self(0x01);
    pub const START: Self = Self(0x02);
    pub const STOP: Self = Self(0x04);
    pub const ACK: Self = Self(0x08);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for MasterCommand {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Where the master state machine was left by the previous transfer.
///
/// A transfer that ends without STOP keeps the bus, and the next transfer in
/// the same direction continues without a new START.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    MasterTx,
    MasterRx,
}

/// Outcome of a master transmission, using the Wiring status codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
#[must_use]
pub enum TransferStatus {
    Success = 0,
    AddressNack = 2,
    DataNack = 3,
    Other = 4,
}

impl TransferStatus {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Slave transaction status as decoded by the hardware layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlaveAction {
    /// No slave action pending.
    None,
    /// The master wrote a byte to us.
    ReceiveRequest,
    /// The master is reading from us and wants a byte.
    TransmitRequest,
    /// Any status the engine does not act on.
    Unknown(u32),
}

/// Timing of the manual SCL pulsing used to free a wedged bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// SCL level changes per recovery pass.
    pub pulses: u8,
    /// Upper bound on recovery passes before giving up.
    pub passes: u8,
    /// Delay between SCL level changes.
    pub half_period_us: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            pulses: 10,
            passes: 100,
            half_period_us: 5,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WireConfig {
    pub speed: I2cSpeed,
    pub recovery: RecoveryConfig,
}

impl Default for WireConfig {
    fn default() -> Self {
        WireConfigBuilder::new().build()
    }
}

pub struct WireConfigBuilder {
    speed: I2cSpeed,
    recovery: RecoveryConfig,
}

impl Default for WireConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WireConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            speed: I2cSpeed::Standard,
            recovery: RecoveryConfig::default(),
        }
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn recovery_pulses(mut self, pulses: u8) -> Self {
        self.recovery.pulses = pulses;
        self
    }
    #[must_use]
    pub fn recovery_passes(mut self, passes: u8) -> Self {
        self.recovery.passes = passes;
        self
    }
    #[must_use]
    pub fn recovery_half_period_us(mut self, us: u32) -> Self {
        self.recovery.half_period_us = us;
        self
    }
    #[must_use]
    pub fn build(self) -> WireConfig {
        WireConfig {
            speed: self.speed,
            recovery: self.recovery,
        }
    }
}
