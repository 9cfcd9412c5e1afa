// Licensed under the Apache-2.0 license

//! # I2C Hardware Abstraction Traits
//!
//! Small traits that together describe what the engine needs from a
//! controller. Each maps onto a handful of register accesses on the
//! master block, the slave block or the GPIO port of the bound module.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! I2cHardwareCore (clock, reset, module binding)
//!     ├── I2cMaster (address, data, command, status)
//!     ├── BusRecoveryPins (pin muxing and manual SCL/SDA drive)
//!     └── slave module (feature: i2c_target)
//!         └── I2cSlave (own address, data, interrupt status)
//! I2cHardware = I2cMaster + BusRecoveryPins (+ I2cSlave with i2c_target)
//! ```

use crate::i2c::bus::BusHandle;
use crate::i2c::common::{I2cSpeed, MasterCommand};

/// Core controller operations shared by every role.
pub trait I2cHardwareCore {
    /// Point all subsequent register accesses at `bus`.
    fn bind(&mut self, bus: &BusHandle);

    /// Ungate the peripheral clock of the bound module.
    fn enable_clock(&mut self);

    /// Pulse the system-control reset of the bound module.
    fn reset_peripheral(&mut self);

    /// Whether the module is out of reset and accepts register accesses.
    fn peripheral_ready(&mut self) -> bool;

    /// Enable the master block and program the clock period for `speed`.
    fn init_master(&mut self, speed: I2cSpeed);
}

/// Master-mode register primitives.
///
/// The engine owns the protocol: it decides which [`MasterCommand`] bits to
/// issue and polls [`is_busy`](I2cMaster::is_busy) until each command
/// completes.
pub trait I2cMaster: I2cHardwareCore {
    /// Program the target address and the direction of the next transfer.
    fn set_target_address(&mut self, address: u8, read: bool);

    /// Load the data register for the next transmitted byte.
    fn put_data(&mut self, byte: u8);

    /// Fetch the byte received by the last command.
    fn get_data(&mut self) -> u8;

    /// Write the control register.
    fn command(&mut self, command: MasterCommand);

    /// The controller is still executing the last command.
    fn is_busy(&mut self) -> bool;

    /// Some master is holding the bus.
    fn is_bus_busy(&mut self) -> bool;

    /// Raw error bits of the last command, see [`raw_error`](crate::i2c::common::raw_error).
    fn raw_error(&mut self) -> u32;

    fn disable_master(&mut self);
}

/// Pin control used to unwedge the bus by hand.
pub trait BusRecoveryPins: I2cHardwareCore {
    /// Sample SCL while the pins are still in their reset function.
    fn scl_is_low(&mut self) -> bool;

    /// Route SCL and SDA to the I2C controller.
    fn pins_to_i2c(&mut self);

    /// Make SCL and SDA push-pull GPIO outputs.
    fn pins_to_gpio(&mut self);

    /// Make only SCL a GPIO output, leaving SDA to the slaves.
    fn scl_to_gpio(&mut self);

    fn set_scl(&mut self, high: bool);

    fn set_sda(&mut self, high: bool);
}

/// I2C slave functionality (feature-gated module)
#[cfg(feature = "i2c_target")]
pub mod slave {
    use crate::i2c::common::SlaveAction;

    /// Slave-mode register primitives.
    pub trait I2cSlave: super::I2cHardwareCore {
        /// Program our own bus address.
        fn init_slave(&mut self, address: u8);

        fn enable_slave(&mut self);

        /// Stop answering at our own address.
        fn disable_slave(&mut self);

        /// Byte shifted out on the next master read.
        fn put_slave_data(&mut self, byte: u8);

        /// Byte last written to us by a master.
        fn get_slave_data(&mut self) -> u8;

        fn enable_slave_data_interrupt(&mut self);

        fn clear_slave_interrupt(&mut self);

        /// Decode the slave control/status register.
        fn slave_action(&mut self) -> SlaveAction;
    }
}

#[cfg(feature = "i2c_target")]
pub use slave::I2cSlave;

/// Everything the engine drives.
#[cfg(feature = "i2c_target")]
pub trait I2cHardware: I2cMaster + BusRecoveryPins + I2cSlave {}

#[cfg(feature = "i2c_target")]
impl<T> I2cHardware for T where T: I2cMaster + BusRecoveryPins + I2cSlave {}

/// Everything the engine drives.
#[cfg(not(feature = "i2c_target"))]
pub trait I2cHardware: I2cMaster + BusRecoveryPins {}

#[cfg(not(feature = "i2c_target"))]
impl<T> I2cHardware for T where T: I2cMaster + BusRecoveryPins {}
