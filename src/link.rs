//! Timed byte I/O and preamble resynchronisation.
//!
//! The PN532 answers every frame with a preamble of zero or more `00`
//! bytes followed by the start code `00 FF`.  After a timeout or a corrupt
//! frame the host may be positioned anywhere inside the chip's output, so
//! every inbound frame begins with [`Link::scan_preamble`], which discards
//! bytes until the start code has gone past.
//!
//! Reads never succeed partially: fewer bytes than requested by the
//! deadline is a [`TransportFault::Timeout`].

use core::time::Duration;
use std::time::Instant;

use log::{trace, warn};

use crate::error::TransportFault;
use crate::transport::Transport;

/// Shortest wait handed to a single transport read.  A zero timeout would
/// turn the final read before a deadline into a non-blocking poll.
const MIN_READ_WAIT: Duration = Duration::from_millis(2);

/// Base allowance for the bytes of one frame section once its header has
/// been seen.
const SECTION_TIMEOUT: Duration = Duration::from_millis(10);

/// Per-byte allowance on top of [`SECTION_TIMEOUT`] (one byte at
/// 115200 baud 8-N-1 takes ~87 µs).
const PER_BYTE: Duration = Duration::from_micros(100);

/// Deadline for reading `len` bytes that are already on their way.
pub fn section_timeout(len: usize) -> Duration {
    SECTION_TIMEOUT + PER_BYTE * len as u32
}

/// Timed reader/writer over a [`Transport`].
pub struct Link<T> {
    port: T,
}

impl<T: Transport> Link<T> {
    pub fn new(port: T) -> Self {
        Self { port }
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.port
    }

    pub fn into_inner(self) -> T {
        self.port
    }

    /// Consume bytes until `00 FF` has been read.
    ///
    /// Gives up with [`TransportFault::Timeout`] when `timeout` elapses or
    /// the transport runs dry.
    pub fn scan_preamble(&mut self, timeout: Duration) -> Result<(), TransportFault> {
        let deadline = Instant::now() + timeout;
        let mut last = 0xFF;
        let mut skipped = 0usize;

        loop {
            let wait = deadline
                .saturating_duration_since(Instant::now())
                .max(MIN_READ_WAIT);
            let mut byte = [0u8; 1];
            match self.port.read(&mut byte, wait) {
                Ok(1) => {}
                Ok(_) => return Err(TransportFault::Timeout),
                Err(e) => {
                    warn!("link: read failed during preamble scan: {:?}", e);
                    return Err(TransportFault::Timeout);
                }
            }

            if last == 0x00 && byte[0] == 0xFF {
                if skipped > 1 {
                    trace!("link: skipped {} bytes before start code", skipped - 1);
                }
                return Ok(());
            }
            last = byte[0];
            skipped += 1;

            if Instant::now() >= deadline {
                return Err(TransportFault::Timeout);
            }
        }
    }

    /// Fill `buf` completely within `timeout`.
    pub fn read_exact(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), TransportFault> {
        let deadline = Instant::now() + timeout;
        let mut filled = 0;

        while filled < buf.len() {
            let wait = deadline
                .saturating_duration_since(Instant::now())
                .max(MIN_READ_WAIT);
            let n = self.port.read(&mut buf[filled..], wait).map_err(|e| {
                warn!("link: read failed: {:?}", e);
                TransportFault::Timeout
            })?;
            filled += n;

            if filled < buf.len() && (n == 0 || Instant::now() >= deadline) {
                trace!("link: short read {}/{}", filled, buf.len());
                return Err(TransportFault::Timeout);
            }
        }

        trace!("link: rx {:02X?}", buf);
        Ok(())
    }

    /// Write all of `data` or fail with [`TransportFault::Io`].
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), TransportFault> {
        if data.is_empty() {
            return Ok(());
        }
        trace!("link: tx {:02X?}", data);
        match self.port.write(data) {
            Ok(n) if n == data.len() => Ok(()),
            Ok(n) => {
                warn!("link: short write {}/{}", n, data.len());
                Err(TransportFault::Io)
            }
            Err(e) => {
                warn!("link: write failed: {:?}", e);
                Err(TransportFault::Io)
            }
        }
    }

    pub fn flush_input(&mut self) -> Result<(), TransportFault> {
        self.port.flush_input().map_err(|e| {
            warn!("link: input flush failed: {:?}", e);
            TransportFault::Io
        })
    }

    pub fn wait_tx_done(&mut self, timeout: Duration) -> Result<(), TransportFault> {
        self.port.wait_tx_done(timeout).map_err(|e| {
            warn!("link: TX drain failed: {:?}", e);
            TransportFault::Io
        })
    }

    /// Bytes readable right now, without blocking.
    pub fn buffered_len(&mut self) -> Result<usize, TransportFault> {
        self.port.buffered_len().map_err(|e| {
            warn!("link: buffered length query failed: {:?}", e);
            TransportFault::Io
        })
    }

    /// Read and throw away whatever arrives within `timeout`.
    pub fn drain(&mut self, timeout: Duration) {
        let mut scratch = [0u8; 32];
        while let Ok(n) = self.port.read(&mut scratch, timeout) {
            if n < scratch.len() {
                break;
            }
        }
    }

    pub fn set_baud_rate(&mut self, baud: u32) -> Result<(), TransportFault> {
        self.port.set_baud_rate(baud).map_err(|e| {
            warn!("link: baud change to {} failed: {:?}", baud, e);
            TransportFault::Io
        })
    }
}
