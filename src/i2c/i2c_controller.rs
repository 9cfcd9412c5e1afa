// Licensed under the Apache-2.0 license

//! embedded-hal 1.0 `I2c` implementation for [`Wire`].
//!
//! Operations are streamed through the engine's rings: writes go out in
//! ring-sized packets and reads come back in ring-sized batches, all as
//! continuations of one bus transaction. A direction change issues a repeated
//! START and the bus is released with STOP after the last operation.
//!
//! Pending RX bytes are discarded before each read operation.
//!
//! `Wire` has inherent `write` and `read` methods with Wiring semantics, so
//! call the trait versions with a path:
//!
//! ```rust,ignore
//! use embedded_hal::i2c::I2c;
//!
//! I2c::write(&mut wire, 0x48, &[0x01, 0x60])?;
//! wire.write_read(0x48, &[0x00], &mut temperature)?;
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};

use crate::common::Logger;
use crate::i2c::common::BUFFER_LENGTH;
use crate::i2c::error::Error;
use crate::i2c::interrupt::InterruptControl;
use crate::i2c::traits::I2cHardware;
use crate::i2c::wait::WaitPolicy;
use crate::i2c::wire::Wire;

/// Bytes one ring can hold.
const CHUNK: usize = BUFFER_LENGTH - 1;

impl<H, D, I, W, L> ErrorType for Wire<H, D, I, W, L>
where
    H: I2cHardware,
    D: DelayNs,
    I: InterruptControl,
    W: WaitPolicy,
    L: Logger,
{
    type Error = Error;
}

impl<H, D, I, W, L> I2c for Wire<H, D, I, W, L>
where
    H: I2cHardware,
    D: DelayNs,
    I: InterruptControl,
    W: WaitPolicy,
    L: Logger,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut operations = operations.iter_mut().peekable();

        while let Some(operation) = operations.next() {
            let next_is_read = matches!(operations.peek(), Some(Operation::Read(_)));
            match operation {
                Operation::Write(bytes) => self.write_packets(address, bytes)?,
                Operation::Read(buffer) => self.read_batches(address, buffer, !next_is_read)?,
            }
        }

        self.release_bus()
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
    fn write_packets(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error> {
        for packet in bytes.chunks(CHUNK) {
            self.begin_transmission(address);
            self.write_bytes(packet);
            self.finish_transmission(false)?;
        }
        Ok(())
    }

    fn read_batches(&mut self, address: u8, buffer: &mut [u8], nack_last: bool) -> Result<(), Error> {
        while self.read().is_some() {}

        let batches = buffer.len().div_ceil(CHUNK);
        for (index, batch) in buffer.chunks_mut(CHUNK).enumerate() {
            let final_batch = index + 1 == batches;
            let (received, error) = self.receive(address, batch.len(), false, nack_last && final_batch);
            if let Some(error) = error {
                return Err(error);
            }
            if received < batch.len() {
                return Err(Error::Bus);
            }
            for slot in batch.iter_mut() {
                *slot = self.read().ok_or(Error::Bus)?;
            }
        }
        Ok(())
    }
}
