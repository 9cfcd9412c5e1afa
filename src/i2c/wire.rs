// Licensed under the Apache-2.0 license

//! # TwoWire master/slave transfer engine
//!
//! [`Wire`] gives byte-stream semantics over one I2C module, in the style of
//! the Wiring `TwoWire` API:
//!
//! - **Master transmit**: [`begin_transmission`](Wire::begin_transmission) opens a
//!   packet, [`write`](Wire::write) queues bytes in the TX ring and
//!   [`end_transmission`](Wire::end_transmission) clocks them out.
//! - **Master receive**: [`request_from`](Wire::request_from) appends bytes to the RX
//!   ring, consumed with [`read`](Wire::read) / [`peek`](Wire::peek).
//! - **Slave**: after [`begin_slave`](Wire::begin_slave) the application calls
//!   [`handle_interrupt`](Wire::handle_interrupt) from the module's ISR, which
//!   dispatches to the handlers registered with
//!   [`on_receive`](Wire::on_receive) and [`on_request`](Wire::on_request).
//!
//! Master operations block, polling the controller's busy flag through the
//! injected [`WaitPolicy`]. A transfer that ends without STOP keeps the bus;
//! the next transfer in the same direction continues without a new START.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut wire = Wire::new(hardware, delay, bus_handle(0).ok_or(Error::Bus)?);
//! wire.begin()?;
//!
//! wire.begin_transmission(0x48);
//! wire.write(0x01);
//! let status = wire.end_transmission(false);
//!
//! if wire.request_from(0x48, 2, true) == 2 {
//!     let msb = wire.read();
//!     let lsb = wire.read();
//! }
//! ```
//!
//! ## Sharing with the ISR
//!
//! The engine unmasks its NVIC line in `begin_slave`; enabling global
//! interrupts is up to the application (see [`crate::i2c::interrupt`]).
//!
//! ```rust,ignore
//! static WIRE: Mutex<RefCell<Option<MyWire>>> = Mutex::new(RefCell::new(None));
//!
//! #[interrupt]
//! fn I2C0() {
//!     cortex_m::interrupt::free(|cs| {
//!         if let Some(wire) = WIRE.borrow(cs).borrow_mut().as_mut() {
//!             wire.handle_interrupt();
//!         }
//!     });
//! }
//! ```

use embedded_hal::delay::DelayNs;

use crate::common::{Logger, NoOpLogger};
use crate::i2c::buffer::TransferBuffer;
use crate::i2c::bus::{bus_handle, BusHandle};
#[cfg(feature = "i2c_target")]
use crate::i2c::common::SlaveAction;
use crate::i2c::common::{raw_error, MasterCommand, TransactionState, TransferStatus, WireConfig};
use crate::i2c::error::Error;
use crate::i2c::interrupt::{InterruptControl, Nvic};
use crate::i2c::recovery::BusRecovery;
use crate::i2c::traits::{I2cHardware, I2cMaster};
use crate::i2c::wait::{Spin, WaitPolicy};

/// Called with the number of unread RX bytes after a master wrote to us.
pub type ReceiveHandler<H, D, I, W, L> = fn(&mut Wire<H, D, I, W, L>, usize);

/// Called when a master reads from us; reply with [`Wire::write`].
pub type RequestHandler<H, D, I, W, L> = fn(&mut Wire<H, D, I, W, L>);

pub struct Wire<H, D, I = Nvic, W = Spin, L = NoOpLogger> {
    hardware: H,
    delay: D,
    interrupts: I,
    wait: W,
    logger: L,
    config: WireConfig,
    bus: BusHandle,
    rx: TransferBuffer,
    tx: TransferBuffer,
    tx_address: u8,
    transmitting: bool,
    state: TransactionState,
    slave_address: Option<u8>,
    write_error: bool,
    on_receive: Option<ReceiveHandler<H, D, I, W, L>>,
    on_request: Option<RequestHandler<H, D, I, W, L>>,
}

impl<H: I2cHardware, D: DelayNs> Wire<H, D> {
    /// Engine for `bus` that spins on busy flags, logs nothing and unmasks
    /// slave interrupts in the core's NVIC.
    pub fn new(hardware: H, delay: D, bus: BusHandle) -> Self {
        Self::from_parts(hardware, delay, Nvic, Spin, NoOpLogger, bus)
    }
}

impl<H, D, I, W, L> Wire<H, D, I, W, L>
where
    H: I2cHardware,
    D: DelayNs,
    I: InterruptControl,
    W: WaitPolicy,
    L: Logger,
{
    pub fn from_parts(hardware: H, delay: D, interrupts: I, wait: W, logger: L, bus: BusHandle) -> Self {
        Self {
            hardware,
            delay,
            interrupts,
            wait,
            logger,
            config: WireConfig::default(),
            bus,
            rx: TransferBuffer::new(),
            tx: TransferBuffer::new(),
            tx_address: 0,
            transmitting: false,
            state: TransactionState::Idle,
            slave_address: None,
            write_error: false,
            on_receive: None,
            on_request: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: WireConfig) -> Self {
        self.config = config;
        self
    }

    /// Initialize as bus master on the selected module.
    ///
    /// Both rings are emptied and the transaction state returns to idle. If
    /// SCL is already low, a STOP is forced by hand and the controller is
    /// reset. If the controller still reports the bus busy (or an error)
    /// after init, SCL is pulsed in bounded passes until the bus frees.
    ///
    /// # Errors
    ///
    /// - `Error::RecoveryFailed` if the bus is still busy after the last
    ///   recovery pass. The controller is configured regardless.
    /// - `Error::Timeout` if the controller does not come out of reset
    ///   within the wait policy's budget. The pins are handed back to the
    ///   controller but it is left unconfigured.
    pub fn begin(&mut self) -> Result<(), Error> {
        self.rx.clear();
        self.tx.clear();
        self.transmitting = false;
        self.state = TransactionState::Idle;

        // Leaving slave mode: silence the module that is still bound.
        #[cfg(feature = "i2c_target")]
        {
            if self.slave_address.is_some() {
                self.hardware.disable_slave();
            }
        }
        self.slave_address = None;

        self.hardware.bind(&self.bus);
        self.hardware.enable_clock();

        if self.hardware.scl_is_low() {
            self.logger
                .warn(format_args!("i2c{}: SCL held low, forcing STOP", self.bus.module));
            if BusRecovery::force_stop(&mut self.hardware, &mut self.wait).is_err() {
                self.hardware.pins_to_i2c();
                self.logger.error(format_args!(
                    "i2c{}: controller did not leave reset",
                    self.bus.module
                ));
                return Err(Error::Timeout);
            }
        }

        self.hardware.pins_to_i2c();
        self.hardware.init_master(self.config.speed);

        if self.hardware.is_bus_busy() || self.hardware.raw_error() != raw_error::NONE {
            self.logger
                .warn(format_args!("i2c{}: bus busy after init, pulsing SCL", self.bus.module));
            let outcome =
                BusRecovery::pulse_scl(&mut self.hardware, &mut self.delay, &self.config.recovery);
            if !outcome.released {
                self.logger.error(format_args!(
                    "i2c{}: bus still busy after {} recovery passes",
                    self.bus.module, outcome.passes
                ));
                return Err(Error::RecoveryFailed);
            }
            self.logger.debug(format_args!(
                "i2c{}: bus released after {} passes",
                self.bus.module, outcome.passes
            ));
        }

        self.logger.debug(format_args!(
            "i2c{}: master ready at {} Hz",
            self.bus.module,
            self.config.speed.hz()
        ));
        Ok(())
    }

    /// Initialize as a slave answering at `address`.
    ///
    /// Runs [`begin`](Self::begin) first, then hands the module to the slave
    /// block, enables its data interrupt and unmasks the module's NVIC line.
    /// Global interrupts are not touched; the application enables them once
    /// the engine is reachable from the ISR.
    ///
    /// # Errors
    ///
    /// Same as [`begin`](Self::begin); slave mode is configured even when
    /// recovery failed.
    #[cfg(feature = "i2c_target")]
    pub fn begin_slave(&mut self, address: u8) -> Result<(), Error> {
        let master = self.begin();
        self.slave_address = Some(address);

        self.interrupts.unmask(self.bus.irq);
        self.hardware.enable_slave_data_interrupt();
        self.hardware.disable_master();
        self.hardware.enable_slave();
        self.hardware.init_slave(address);

        self.logger.debug(format_args!(
            "i2c{}: slave at {:#04x}",
            self.bus.module, address
        ));
        master
    }

    /// Rebind to another module and initialize it in the current role.
    ///
    /// # Errors
    ///
    /// `Error::Bus` for an index past the module table, otherwise whatever
    /// the re-run `begin` reports.
    pub fn select_module(&mut self, module: usize) -> Result<(), Error> {
        let bus = bus_handle(module).ok_or(Error::Bus)?;
        self.bus = bus;

        #[cfg(feature = "i2c_target")]
        {
            if let Some(address) = self.slave_address {
                return self.begin_slave(address);
            }
        }
        self.begin()
    }

    /// Start building a packet for `address`. Nothing goes on the bus yet.
    pub fn begin_transmission(&mut self, address: u8) {
        self.transmitting = true;
        self.tx_address = address;
        self.tx.clear();
    }

    /// Queue `byte` for the open transmission, or outside a transmission
    /// (inside a request handler) hand it straight to the slave data register.
    ///
    /// Returns the number of bytes accepted. A full TX ring accepts nothing
    /// and sets the sticky write error.
    pub fn write(&mut self, byte: u8) -> usize {
        if self.transmitting {
            if !self.tx.push(byte) {
                self.write_error = true;
                return 0;
            }
            return 1;
        }
        self.reply(byte)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> usize {
        data.iter().map(|&byte| self.write(byte)).sum()
    }

    /// Send the queued packet.
    ///
    /// An empty packet succeeds without touching the bus. The first byte is
    /// sent with START unless the previous transmission ended without STOP.
    /// The first NACK or controller error aborts the rest of the packet and
    /// releases the bus. Without `send_stop` the bus is kept so the next
    /// transmission continues where this one ended.
    pub fn end_transmission(&mut self, send_stop: bool) -> TransferStatus {
        match self.finish_transmission(send_stop) {
            Ok(()) => TransferStatus::Success,
            Err(error) => error.status(),
        }
    }

    pub(crate) fn finish_transmission(&mut self, send_stop: bool) -> Result<(), Error> {
        let result = self.transmit(send_stop);
        self.tx.clear();
        self.transmitting = false;
        result
    }

    /// Read up to `quantity` bytes from `address` into the RX ring.
    ///
    /// `quantity` is clipped to the free space in the ring. The last byte of
    /// the batch is NACKed. On a NACK or controller error the bus is
    /// released and the count received so far is returned.
    pub fn request_from(&mut self, address: u8, quantity: usize, send_stop: bool) -> usize {
        self.receive(address, quantity, send_stop, true).0
    }

    /// Master receive with control over the final ACK, reporting the error
    /// that cut the batch short.
    pub(crate) fn receive(
        &mut self,
        address: u8,
        quantity: usize,
        send_stop: bool,
        nack_last: bool,
    ) -> (usize, Option<Error>) {
        let quantity = quantity.min(self.rx.free());
        if quantity == 0 {
            return (0, None);
        }

        self.hardware.set_target_address(address, true);

        for index in 0..quantity {
            let mut command = MasterCommand::RUN;
            if index == 0 && self.state != TransactionState::MasterRx {
                command = command | MasterCommand::START;
            }
            if index + 1 < quantity || !nack_last {
                command = command | MasterCommand::ACK;
            }
            if let Err(error) = self.receive_byte(command) {
                return (index, Some(error));
            }
        }

        if send_stop {
            (quantity, self.stop().err())
        } else {
            self.state = TransactionState::MasterRx;
            (quantity, None)
        }
    }

    /// STOP if a transfer left the bus held.
    pub(crate) fn release_bus(&mut self) -> Result<(), Error> {
        if self.state == TransactionState::Idle {
            return Ok(());
        }
        self.stop()
    }

    /// Unread bytes in the RX ring.
    #[must_use]
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    pub fn read(&mut self) -> Option<u8> {
        self.rx.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek()
    }

    /// Drop any queued TX bytes and mark all RX bytes as consumed.
    pub fn flush(&mut self) {
        self.tx.clear();
        self.rx.clear();
    }

    /// Register the slave receive handler, replacing any previous one.
    pub fn on_receive(&mut self, handler: ReceiveHandler<H, D, I, W, L>) {
        self.on_receive = Some(handler);
    }

    /// Register the slave request handler, replacing any previous one.
    pub fn on_request(&mut self, handler: RequestHandler<H, D, I, W, L>) {
        self.on_request = Some(handler);
    }

    /// Slave-mode interrupt service. Call from the module's ISR.
    ///
    /// A byte written by the master is moved into the RX ring before the
    /// receive handler runs with the number of unread bytes. A read by the
    /// master runs the request handler. Other statuses are ignored.
    #[cfg(feature = "i2c_target")]
    pub fn handle_interrupt(&mut self) {
        self.hardware.clear_slave_interrupt();

        match self.hardware.slave_action() {
            SlaveAction::ReceiveRequest => {
                let byte = self.hardware.get_slave_data();
                if !self.rx.push(byte) {
                    self.logger
                        .warn(format_args!("i2c{}: slave RX overflow", self.bus.module));
                }
                if let Some(handler) = self.on_receive {
                    let count = self.available();
                    handler(self, count);
                }
            }
            SlaveAction::TransmitRequest => {
                if let Some(handler) = self.on_request {
                    handler(self);
                }
            }
            SlaveAction::None | SlaveAction::Unknown(_) => {}
        }
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[must_use]
    pub fn module(&self) -> u8 {
        self.bus.module
    }

    #[must_use]
    pub fn bus(&self) -> &BusHandle {
        &self.bus
    }

    #[must_use]
    pub fn slave_address(&self) -> Option<u8> {
        self.slave_address
    }

    #[must_use]
    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    #[must_use]
    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    /// Sticky flag set when a write found the TX ring full.
    #[must_use]
    pub fn write_error(&self) -> bool {
        self.write_error
    }

    pub fn clear_write_error(&mut self) {
        self.write_error = false;
    }

    #[must_use]
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    #[must_use]
    pub fn logger(&self) -> &L {
        &self.logger
    }

    fn transmit(&mut self, send_stop: bool) -> Result<(), Error> {
        let Some(first) = self.tx.pop() else {
            return Ok(());
        };

        self.hardware.set_target_address(self.tx_address, false);

        let mut command = MasterCommand::RUN;
        if self.state != TransactionState::MasterTx {
            command = command | MasterCommand::START;
        }
        self.send_byte(command, first)?;

        while let Some(byte) = self.tx.pop() {
            self.send_byte(MasterCommand::RUN, byte)?;
        }

        if send_stop {
            self.stop()
        } else {
            self.state = TransactionState::MasterTx;
            Ok(())
        }
    }

    #[cfg(feature = "i2c_target")]
    fn reply(&mut self, byte: u8) -> usize {
        self.hardware.put_slave_data(byte);
        1
    }

    #[cfg(not(feature = "i2c_target"))]
    fn reply(&mut self, _byte: u8) -> usize {
        self.write_error = true;
        0
    }

    fn send_byte(&mut self, command: MasterCommand, byte: u8) -> Result<(), Error> {
        self.hardware.put_data(byte);
        self.execute(command)
    }

    fn receive_byte(&mut self, command: MasterCommand) -> Result<(), Error> {
        // Another master may own the bus; only a fresh START has to wait.
        if self.state == TransactionState::Idle && command.contains(MasterCommand::START) {
            self.wait_while(<H as I2cMaster>::is_bus_busy)?;
        }
        self.execute(command)?;

        let byte = self.hardware.get_data();
        // Room was reserved when the batch was clipped to the free space.
        let _ = self.rx.push(byte);
        Ok(())
    }

    /// Issue `command`, wait for it to finish and check the error bits.
    fn execute(&mut self, command: MasterCommand) -> Result<(), Error> {
        self.hardware.command(command);

        let result = match self.wait_while(<H as I2cMaster>::is_busy) {
            Ok(()) => Error::from_raw(self.hardware.raw_error()).map_or(Ok(()), Err),
            Err(error) => Err(error),
        };
        if let Err(error) = result {
            self.abort(error);
        }
        result
    }

    /// Error-stop: release the bus after a failed command.
    fn abort(&mut self, error: Error) {
        self.hardware.command(MasterCommand::STOP);
        self.state = TransactionState::Idle;
        self.logger.debug(format_args!(
            "i2c{}: transfer aborted: {:?}",
            self.bus.module, error
        ));
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.hardware.command(MasterCommand::STOP);
        self.state = TransactionState::Idle;
        self.wait_while(<H as I2cMaster>::is_busy)
    }

    fn wait_while(&mut self, busy: fn(&mut H) -> bool) -> Result<(), Error> {
        self.wait.start();
        while busy(&mut self.hardware) {
            self.wait.poll().map_err(|_| Error::Timeout)?;
        }
        Ok(())
    }
}
