// Licensed under the Apache-2.0 license

use crate::i2c::common::{raw_error, TransferStatus};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The addressed device did not acknowledge its address.
    AddressNack,
    /// A data byte was not acknowledged.
    DataNack,
    ArbitrationLoss,
    /// Unclassified controller error, or an unknown bus module.
    Bus,
    /// A busy-wait exceeded the configured deadline.
    Timeout,
    /// The bus was still held low after the bounded recovery passes.
    RecoveryFailed,
}

impl Error {
    /// Maps the controller's raw error bits, `None` when no error is set.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        if raw == raw_error::NONE {
            None
        } else if raw & raw_error::ADDR_ACK != 0 {
            Some(Error::AddressNack)
        } else if raw & raw_error::DATA_ACK != 0 {
            Some(Error::DataNack)
        } else if raw & raw_error::ARB_LOST != 0 {
            Some(Error::ArbitrationLoss)
        } else {
            Some(Error::Bus)
        }
    }

    /// Coarse status code reported by `end_transmission`.
    pub const fn status(self) -> TransferStatus {
        match self {
            Error::AddressNack => TransferStatus::AddressNack,
            Error::DataNack => TransferStatus::DataNack,
            _ => TransferStatus::Other,
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Error::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Error::ArbitrationLoss => ErrorKind::ArbitrationLoss,
            Error::Bus | Error::RecoveryFailed => ErrorKind::Bus,
            Error::Timeout => ErrorKind::Other,
        }
    }
}
