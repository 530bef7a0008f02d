//! Command/response session with one command in flight at a time.
//!
//! ```text
//!            send(cmd) + ACK ok
//!   ┌──────┐ ─────────────────────▶ ┌──────────────────────────────┐
//!   │ Idle │                        │ AwaitingResponse { cmd + 1 } │
//!   └──────┘ ◀───────────────────── └──────────────────────────────┘
//!            receive() (any outcome) / abandon()
//! ```
//!
//! `send` from `AwaitingResponse` fails with
//! [`TransportFault::CommandPending`]; `receive` or `ready` from `Idle`
//! fails with [`TransportFault::NotPending`] before touching the wire.
//!
//! Exclusive access comes from `&mut self`.  Callers that split a command
//! into send-now / receive-later keep the session (or the
//! [`SharedPn532`](crate::shared::SharedPn532) guard) for the whole span.

use core::time::Duration;

use log::debug;

use crate::codec::{self, ACK_BODY, NACK_BODY};
use crate::config::Pn532Config;
use crate::error::{Error, Result, TransportFault};
use crate::link::{Link, section_timeout};
use crate::registry::CardRegistry;
use crate::transport::Transport;

/// How long output may take to leave the UART after a frame.
const TX_DRAIN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Protocol state of a [`Pn532`] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// A command was acknowledged; its response carries id `expected`.
    AwaitingResponse { expected: u8 },
}

/// One PN532 reached over HSU.
pub struct Pn532<T> {
    pub(crate) link: Link<T>,
    pub(crate) state: SessionState,
    pub(crate) last_error: Option<Error>,
    pub(crate) registry: CardRegistry,
    pub(crate) config: Pn532Config,
}

impl<T: Transport> Pn532<T> {
    /// Wrap a transport whose chip has already been brought up.
    ///
    /// Use [`Pn532::init`] to run the wake and configuration sequence.
    pub fn new(transport: T, config: Pn532Config) -> Self {
        Self {
            link: Link::new(transport),
            state: SessionState::Idle,
            last_error: None,
            registry: CardRegistry::new(),
            config,
        }
    }

    /// Give the transport back.  Card state is discarded.
    pub fn release(self) -> T {
        self.link.into_inner()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SessionState::AwaitingResponse { .. })
    }

    /// Most recent fault.  Never cleared by later successes.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Pn532Config {
        &self.config
    }

    pub(crate) fn record<V>(&mut self, result: Result<V>) -> Result<V> {
        if let Err(e) = &result {
            debug!("pn532: fault {} ({})", e.name(), e);
            self.last_error = Some(*e);
        }
        result
    }

    /// Send `cmd` with a payload split over two segments and wait for the
    /// chip's ACK.  Returns the number of payload bytes sent.
    pub fn send(&mut self, cmd: u8, first: &[u8], second: &[u8]) -> Result<usize> {
        let result = self.send_frame(cmd, first, second).map_err(Error::from);
        self.record(result)
    }

    fn send_frame(&mut self, cmd: u8, first: &[u8], second: &[u8]) -> core::result::Result<usize, TransportFault> {
        if self.is_pending() {
            return Err(TransportFault::CommandPending);
        }

        self.link.flush_input()?;
        codec::write_frame(&mut self.link, cmd, first, second)?;
        self.link.wait_tx_done(TX_DRAIN_TIMEOUT)?;
        self.await_ack()?;

        self.state = SessionState::AwaitingResponse {
            expected: cmd.wrapping_add(1),
        };
        Ok(first.len() + second.len())
    }

    fn await_ack(&mut self) -> core::result::Result<(), TransportFault> {
        let timeout = self.config.ack_timeout();
        self.link
            .scan_preamble(timeout)
            .map_err(|_| TransportFault::AckTimeout)?;

        let mut body = [0u8; 3];
        let body_timeout = section_timeout(body.len());
        self.link
            .read_exact(&mut body, body_timeout)
            .map_err(|_| TransportFault::AckTimeout)?;

        if body == ACK_BODY {
            Ok(())
        } else if body == NACK_BODY {
            Err(TransportFault::Nack)
        } else {
            Err(TransportFault::BadAck)
        }
    }

    /// Receive the response to the pending command into `first`, then
    /// `second`.  Returns the payload length.
    ///
    /// The session is idle again afterwards whatever the outcome.
    pub fn receive(&mut self, first: &mut [u8], second: &mut [u8], timeout: Duration) -> Result<usize> {
        let result = match self.state {
            SessionState::Idle => Err(TransportFault::NotPending.into()),
            SessionState::AwaitingResponse { expected } => {
                self.state = SessionState::Idle;
                codec::read_frame(&mut self.link, expected, first, second, timeout).map_err(Error::from)
            }
        };
        self.record(result)
    }

    /// Non-blocking readiness poll for an outstanding command: the number
    /// of bytes buffered so far, `0` meaning "not yet".
    pub fn ready(&mut self) -> Result<usize> {
        let result = if self.is_pending() {
            self.link.buffered_len().map_err(Error::from)
        } else {
            Err(TransportFault::NotPending.into())
        };
        self.record(result)
    }

    /// Send `cmd` and receive its response into `reply`.
    pub fn transact(&mut self, cmd: u8, payload: &[u8], reply: &mut [u8], timeout: Duration) -> Result<usize> {
        self.send(cmd, payload, &[])?;
        self.receive(reply, &mut [], timeout)
    }

    /// Give up on the outstanding command without reading its response.
    /// The next send flushes whatever the chip still delivers.
    pub fn abandon(&mut self) {
        if let SessionState::AwaitingResponse { expected } = self.state {
            debug!("pn532: abandoning response 0x{:02X}", expected);
            self.state = SessionState::Idle;
        }
    }
}
