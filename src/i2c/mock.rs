// Licensed under the Apache-2.0 license

//! Recording mock of the controller, shared by the unit tests.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;

use crate::common::{LogLevel, Logger};
use crate::i2c::bus::{BusHandle, BUSES};
use crate::i2c::common::{raw_error, I2cSpeed, MasterCommand, SlaveAction};
use crate::i2c::interrupt::InterruptControl;
use crate::i2c::traits::{BusRecoveryPins, I2cHardwareCore, I2cMaster};
use crate::i2c::wait::Spin;
use crate::i2c::wire::Wire;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HwEvent {
    Bind(u8),
    EnableClock,
    Reset,
    InitMaster(u32),
    Address { address: u8, read: bool },
    Put(u8),
    Command(u8),
    DisableMaster,
    PinsI2c,
    PinsGpio,
    SclGpio,
    Scl(bool),
    Sda(bool),
    InitSlave(u8),
    EnableSlave,
    DisableSlave,
    SlavePut(u8),
    SlaveIntEnable,
    SlaveIntClear,
}

pub struct MockHardware {
    pub events: Vec<HwEvent>,
    pub bound: Option<BusHandle>,
    /// SCL reads low before the pins are configured.
    pub scl_low: bool,
    /// The bus never becomes free.
    pub bus_stuck: bool,
    /// Number of `is_bus_busy` calls that report busy before the bus frees.
    pub bus_busy_polls: u32,
    /// Error bits reported before any command has run.
    pub startup_error: u32,
    /// Number of `is_busy` polls that report busy after each command.
    pub busy_polls_per_command: u32,
    busy_remaining: u32,
    pub busy_forever: bool,
    pub ready_after_polls: u32,
    pub ready_polls: u32,
    /// Bytes returned by successive master reads.
    pub read_data: VecDeque<u8>,
    /// `(n, bits)`: the n-th RUN command (0-based) fails with `bits`.
    pub fail_at: Option<(usize, u32)>,
    run_commands: usize,
    pub slave_action: SlaveAction,
    pub slave_rx: VecDeque<u8>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            bound: None,
            scl_low: false,
            bus_stuck: false,
            bus_busy_polls: 0,
            startup_error: raw_error::NONE,
            busy_polls_per_command: 0,
            busy_remaining: 0,
            busy_forever: false,
            ready_after_polls: 0,
            ready_polls: 0,
            read_data: VecDeque::new(),
            fail_at: None,
            run_commands: 0,
            slave_action: SlaveAction::None,
            slave_rx: VecDeque::new(),
        }
    }

    pub fn commands(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HwEvent::Command(bits) => Some(*bits),
                _ => None,
            })
            .collect()
    }

    pub fn puts(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HwEvent::Put(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    pub fn slave_puts(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HwEvent::SlavePut(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    pub fn scl_writes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HwEvent::Scl(_)))
            .count()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl I2cHardwareCore for MockHardware {
    fn bind(&mut self, bus: &BusHandle) {
        self.bound = Some(*bus);
        self.events.push(HwEvent::Bind(bus.module));
    }

    fn enable_clock(&mut self) {
        self.events.push(HwEvent::EnableClock);
    }

    fn reset_peripheral(&mut self) {
        self.events.push(HwEvent::Reset);
    }

    fn peripheral_ready(&mut self) -> bool {
        self.ready_polls += 1;
        self.ready_polls > self.ready_after_polls
    }

    fn init_master(&mut self, speed: I2cSpeed) {
        self.events.push(HwEvent::InitMaster(speed.hz()));
    }
}

impl I2cMaster for MockHardware {
    fn set_target_address(&mut self, address: u8, read: bool) {
        self.events.push(HwEvent::Address { address, read });
    }

    fn put_data(&mut self, byte: u8) {
        self.events.push(HwEvent::Put(byte));
    }

    fn get_data(&mut self) -> u8 {
        self.read_data.pop_front().unwrap_or(0)
    }

    fn command(&mut self, command: MasterCommand) {
        self.events.push(HwEvent::Command(command.bits()));
        if command.contains(MasterCommand::RUN) {
            self.run_commands += 1;
        }
        self.busy_remaining = self.busy_polls_per_command;
    }

    fn is_busy(&mut self) -> bool {
        if self.busy_forever {
            return true;
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return true;
        }
        false
    }

    fn is_bus_busy(&mut self) -> bool {
        if self.bus_stuck {
            return true;
        }
        if self.bus_busy_polls > 0 {
            self.bus_busy_polls -= 1;
            return true;
        }
        false
    }

    fn raw_error(&mut self) -> u32 {
        if self.run_commands == 0 {
            return self.startup_error;
        }
        match self.fail_at {
            Some((index, bits)) if index + 1 == self.run_commands => bits,
            _ => raw_error::NONE,
        }
    }

    fn disable_master(&mut self) {
        self.events.push(HwEvent::DisableMaster);
    }
}

impl BusRecoveryPins for MockHardware {
    fn scl_is_low(&mut self) -> bool {
        self.scl_low
    }

    fn pins_to_i2c(&mut self) {
        self.events.push(HwEvent::PinsI2c);
    }

    fn pins_to_gpio(&mut self) {
        self.events.push(HwEvent::PinsGpio);
    }

    fn scl_to_gpio(&mut self) {
        self.events.push(HwEvent::SclGpio);
    }

    fn set_scl(&mut self, high: bool) {
        self.events.push(HwEvent::Scl(high));
    }

    fn set_sda(&mut self, high: bool) {
        self.events.push(HwEvent::Sda(high));
    }
}

#[cfg(feature = "i2c_target")]
impl crate::i2c::traits::I2cSlave for MockHardware {
    fn init_slave(&mut self, address: u8) {
        self.events.push(HwEvent::InitSlave(address));
    }

    fn enable_slave(&mut self) {
        self.events.push(HwEvent::EnableSlave);
    }

    fn disable_slave(&mut self) {
        self.events.push(HwEvent::DisableSlave);
    }

    fn put_slave_data(&mut self, byte: u8) {
        self.events.push(HwEvent::SlavePut(byte));
    }

    fn get_slave_data(&mut self) -> u8 {
        self.slave_rx.pop_front().unwrap_or(0)
    }

    fn enable_slave_data_interrupt(&mut self) {
        self.events.push(HwEvent::SlaveIntEnable);
    }

    fn clear_slave_interrupt(&mut self) {
        self.events.push(HwEvent::SlaveIntClear);
    }

    fn slave_action(&mut self) -> SlaveAction {
        self.slave_action
    }
}

#[derive(Default)]
pub struct MockInterrupts {
    pub unmasked: Vec<u16>,
}

impl InterruptControl for MockInterrupts {
    fn unmask(&mut self, irq: u16) {
        self.unmasked.push(irq);
    }
}

#[derive(Default)]
pub struct CountingDelay {
    pub total_ns: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    pub records: Vec<(LogLevel, String)>,
}

impl RecordingLogger {
    pub fn count(&self, level: LogLevel) -> usize {
        self.records.iter().filter(|(l, _)| *l == level).count()
    }
}

impl Logger for RecordingLogger {
    fn log(&mut self, level: LogLevel, args: core::fmt::Arguments<'_>) {
        self.records.push((level, args.to_string()));
    }
}

pub type TestWire = Wire<MockHardware, CountingDelay, MockInterrupts, Spin, RecordingLogger>;

pub fn test_wire() -> TestWire {
    test_wire_with(MockHardware::new())
}

pub fn test_wire_with(hardware: MockHardware) -> TestWire {
    Wire::from_parts(
        hardware,
        CountingDelay::default(),
        MockInterrupts::default(),
        Spin,
        RecordingLogger::default(),
        BUSES[0],
    )
}
