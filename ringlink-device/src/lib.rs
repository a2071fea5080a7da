//! Ringlink byte device interface
//!
//! The crate provides the interface between a byte transport driver and the
//! Ringlink stack. Limited scope facilitates compatibility across versions.
//! Driver crates should depend on this crate. Ringlink stack users should
//! depend on the `ringlink` crate instead.
//!
//! A [`Device`] is anything that can produce received bytes and accept bytes
//! for transmission without blocking: a UART with FIFOs, a DMA-fed ring
//! buffer, or the in-memory [`SoftDevice`] used by tests and simulations.
//!
//! The stack polls `read` to completion on every update and calls `write`
//! from within the decode path while relaying, so both operations must stay
//! cheap and must never block.
#![no_std]

use heapless::Deque;

/// Non-blocking byte transport consumed by the stack
pub trait Device {
    /// Fetches the next received byte, `None` when nothing is pending.
    fn read(&mut self) -> Option<u8>;

    /// Hands one byte to the transmitter.
    ///
    /// Assumed to never fail; there is no backpressure signal. A driver that
    /// can fall behind should buffer internally and account for drops itself.
    fn write(&mut self, byte: u8);
}

impl<D: Device> Device for &mut D {
    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn write(&mut self, byte: u8) {
        (**self).write(byte)
    }
}

/// In-memory device backed by two bounded byte FIFOs
///
/// The receive side is filled with [`SoftDevice::feed`] and drained by the
/// stack through [`Device::read`]. The transmit side is filled by the stack
/// through [`Device::write`] and drained with [`SoftDevice::pop_written`].
/// Bytes written to a full transmit FIFO are dropped and counted.
pub struct SoftDevice<const N: usize> {
    rx: Deque<u8, N>,
    tx: Deque<u8, N>,
    overruns: usize,
}

impl<const N: usize> SoftDevice<N> {
    pub const fn new() -> Self {
        Self {
            rx: Deque::new(),
            tx: Deque::new(),
            overruns: 0,
        }
    }

    /// Queues bytes for the stack to receive. Returns the number accepted.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.rx.push_back(byte).is_err() {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    /// Fetches the next byte the stack has written, oldest first.
    pub fn pop_written(&mut self) -> Option<u8> {
        self.tx.pop_front()
    }

    /// Number of written bytes not yet fetched
    pub fn written_len(&self) -> usize {
        self.tx.len()
    }

    /// Number of written bytes dropped because the transmit FIFO was full
    pub fn overruns(&self) -> usize {
        self.overruns
    }
}

impl<const N: usize> Default for SoftDevice<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Device for SoftDevice<N> {
    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write(&mut self, byte: u8) {
        if self.tx.push_back(byte).is_err() {
            self.overruns += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_device_order() {
        let mut device: SoftDevice<8> = SoftDevice::new();
        assert_eq!(device.feed(&[1, 2, 3]), 3);
        assert_eq!(device.read(), Some(1));
        assert_eq!(device.read(), Some(2));
        assert_eq!(device.read(), Some(3));
        assert_eq!(device.read(), None);

        device.write(4);
        device.write(5);
        assert_eq!(device.written_len(), 2);
        assert_eq!(device.pop_written(), Some(4));
        assert_eq!(device.pop_written(), Some(5));
        assert_eq!(device.pop_written(), None);
    }

    #[test]
    fn test_soft_device_overrun() {
        let mut device: SoftDevice<2> = SoftDevice::new();
        device.write(0);
        device.write(1);
        device.write(2);
        assert_eq!(device.overruns(), 1);
        assert_eq!(device.pop_written(), Some(0));
        assert_eq!(device.pop_written(), Some(1));
        assert_eq!(device.pop_written(), None);

        assert_eq!(device.feed(&[0; 4]), 2);
    }
}
