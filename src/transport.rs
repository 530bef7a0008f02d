//! Transport abstraction — the byte-oriented serial channel to the chip.
//!
//! Concrete implementations:
//! - ESP-IDF UART driver ([`crate::adapters::uart::EspUart`], device only)
//! - scripted in-memory UARTs in the test suites
//!
//! The driver is generic over `Transport`, so porting to another MCU or a
//! USB-serial bridge on a host only requires implementing this trait.

use core::time::Duration;

/// Byte-oriented serial channel, already configured for 8-N-1.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout` for them.
    /// Returns the number of bytes actually read (possibly fewer).
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, Self::Error>;

    /// Number of received bytes buffered and readable without blocking.
    fn buffered_len(&mut self) -> Result<usize, Self::Error>;

    /// Discard everything received but not yet read.
    fn flush_input(&mut self) -> Result<(), Self::Error>;

    /// Block until queued output has left the wire, or `timeout` expires.
    fn wait_tx_done(&mut self, timeout: Duration) -> Result<(), Self::Error>;

    /// Switch the line rate.  Only used during bring-up.
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, Self::Error> {
        (**self).read(buf, timeout)
    }

    fn buffered_len(&mut self) -> Result<usize, Self::Error> {
        (**self).buffered_len()
    }

    fn flush_input(&mut self) -> Result<(), Self::Error> {
        (**self).flush_input()
    }

    fn wait_tx_done(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        (**self).wait_tx_done(timeout)
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error> {
        (**self).set_baud_rate(baud)
    }
}
