// Licensed under the Apache-2.0 license

//! Interrupt-controller access for slave mode.
//!
//! The engine only unmasks its own line. Global interrupts (PRIMASK) are left
//! to the application, which enables them once the engine is reachable from
//! the ISR:
//!
//! ```rust,ignore
//! cortex_m::interrupt::free(|cs| {
//!     let mut wire = Wire::new(hardware, delay, bus);
//!     let _ = wire.begin_slave(0x42);
//!     WIRE.borrow(cs).replace(Some(wire));
//! });
//! // SAFETY: outside any critical section.
//! unsafe { cortex_m::interrupt::enable() };
//! ```

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

pub trait InterruptControl {
    /// Unmask NVIC line `irq`.
    fn unmask(&mut self, irq: u16);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct IrqNumber(u16);

// SAFETY: the numbers come from the module table and name real I2C lines.
unsafe impl InterruptNumber for IrqNumber {
    fn number(self) -> u16 {
        self.0
    }
}

/// The Cortex-M NVIC of the running core.
#[derive(Copy, Clone, Debug, Default)]
pub struct Nvic;

impl InterruptControl for Nvic {
    fn unmask(&mut self, irq: u16) {
        // SAFETY: the engine's state is shared with its ISR through a
        // PRIMASK-based `interrupt::Mutex`, which unmasking a line leaves intact.
        unsafe { NVIC::unmask(IrqNumber(irq)) }
    }
}
