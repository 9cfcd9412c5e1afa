// Licensed under the Apache-2.0 license

//! # I2C module table for LM4F/TM4C123 parts
//!
//! The controller exposes four independent I2C modules. Each one is described
//! by a [`BusHandle`]: the master and slave register blocks, the NVIC line,
//! the system-control peripheral id used for clock gating and reset, and the
//! GPIO port, pin masks and pin-mux codes for SCL and SDA.
//!
//! Hardware implementations receive the handle through
//! [`I2cHardwareCore::bind`](crate::i2c::traits::I2cHardwareCore::bind) and
//! resolve every register access against it, so rebinding a [`Wire`] to a
//! different module is just a table lookup followed by a fresh `begin`.
//!
//! ```rust,ignore
//! let bus = bus_handle(1).ok_or(Error::Bus)?;   // I2C1 on PA6/PA7
//! let mut wire = Wire::new(hardware, delay, bus);
//! wire.begin()?;
//! ```
//!
//! [`Wire`]: crate::i2c::wire::Wire

/// Static description of one physical I2C module.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusHandle {
    pub module: u8,
    pub master_base: u32,
    pub slave_base: u32,
    /// NVIC interrupt number (vector number minus 16).
    pub irq: u16,
    pub peripheral: u32,
    pub gpio_base: u32,
    pub scl_pin: u8,
    pub sda_pin: u8,
    pub scl_pin_config: u32,
    pub sda_pin_config: u32,
}

pub const MODULE_COUNT: usize = 4;

pub const BUSES: [BusHandle; MODULE_COUNT] = [
    BusHandle {
        module: 0,
        master_base: 0x4002_0000,
        slave_base: 0x4002_0800,
        irq: 8,
        peripheral: 0xf000_2000,
        gpio_base: 0x4000_5000,
        scl_pin: 1 << 2,
        sda_pin: 1 << 3,
        scl_pin_config: 0x0001_0803,
        sda_pin_config: 0x0001_0c03,
    },
    BusHandle {
        module: 1,
        master_base: 0x4002_1000,
        slave_base: 0x4002_1800,
        irq: 37,
        peripheral: 0xf000_2001,
        gpio_base: 0x4000_4000,
        scl_pin: 1 << 6,
        sda_pin: 1 << 7,
        scl_pin_config: 0x0000_1803,
        sda_pin_config: 0x0000_1c03,
    },
    BusHandle {
        module: 2,
        master_base: 0x4002_2000,
        slave_base: 0x4002_2800,
        irq: 68,
        peripheral: 0xf000_2002,
        gpio_base: 0x4002_4000,
        scl_pin: 1 << 4,
        sda_pin: 1 << 5,
        scl_pin_config: 0x0004_1003,
        sda_pin_config: 0x0004_1403,
    },
    BusHandle {
        module: 3,
        master_base: 0x4002_3000,
        slave_base: 0x4002_3800,
        irq: 69,
        peripheral: 0xf000_2003,
        gpio_base: 0x4000_7000,
        scl_pin: 1 << 0,
        sda_pin: 1 << 1,
        scl_pin_config: 0x0003_0003,
        sda_pin_config: 0x0003_0403,
    },
];

/// Looks up the handle for `module`, `None` past the last module.
#[must_use]
pub fn bus_handle(module: usize) -> Option<BusHandle> {
    BUSES.get(module).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_module() {
        for (index, bus) in BUSES.iter().enumerate() {
            assert_eq!(usize::from(bus.module), index);
            assert_eq!(bus.slave_base, bus.master_base + 0x800);
            assert_eq!(bus.scl_pin & bus.sda_pin, 0);
        }
    }

    #[test]
    fn test_lookup_out_of_range() {
        assert_eq!(bus_handle(2).map(|b| b.irq), Some(68));
        assert!(bus_handle(MODULE_COUNT).is_none());
    }
}
