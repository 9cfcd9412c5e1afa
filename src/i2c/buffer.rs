// Licensed under the Apache-2.0 license

//! Fixed-capacity byte rings used for the RX and TX sides of the engine.
//!
//! Backed by `heapless::spsc::Queue`, which keeps one slot empty to tell a
//! full ring from an empty one: a `TransferBuffer<N>` holds at most `N - 1`
//! bytes. The rings live inside the engine and are only touched through
//! `&mut`; sharing with the interrupt handler goes through the application's
//! lock around the whole engine.

use heapless::spsc::Queue;

use crate::i2c::common::BUFFER_LENGTH;

pub struct TransferBuffer<const N: usize = BUFFER_LENGTH> {
    queue: Queue<u8, N>,
}

impl<const N: usize> Default for TransferBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TransferBuffer<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self { queue: Queue::new() }
    }

    /// Usable slots, `N - 1`.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Unread bytes, the circular distance from read to write index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Stores `byte`, returning `false` and leaving the ring untouched when full.
    pub fn push(&mut self, byte: u8) -> bool {
        self.queue.enqueue(byte).is_ok()
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.queue.dequeue()
    }

    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.queue.peek().copied()
    }

    /// Marks every resident byte as consumed.
    pub fn clear(&mut self) {
        while self.queue.dequeue().is_some() {}
    }
}
