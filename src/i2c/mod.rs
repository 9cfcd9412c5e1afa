// Licensed under the Apache-2.0 license

//! TwoWire I2C driver for the LM4F/TM4C I2C modules.
//!
//! The [`Wire`] engine provides buffered master transmit/receive and
//! interrupt-driven slave mode on one of the four I2C modules, over the
//! hardware traits in [`traits`]. Bus recovery, busy-waiting and interrupt
//! unmasking are separate pieces injected into the engine.

pub mod buffer;
pub mod bus;
pub mod common;
pub mod error;
pub mod i2c_controller;
pub mod interrupt;
pub mod recovery;
pub mod traits;
pub mod wait;
pub mod wire;

#[cfg(test)]
pub(crate) mod mock;

pub use bus::{bus_handle, BusHandle, BUSES};
pub use common::{I2cSpeed, TransactionState, TransferStatus, WireConfig, WireConfigBuilder};
pub use error::Error;
pub use wire::Wire;
