//! InDataExchange facade.
//!
//! The chip prefixes every card reply with a status byte.  That byte is
//! split off into its own slot so the card's answer lands at the start of
//! the caller's buffer, and a non-zero value becomes
//! [`Error::CardStatus`].

use crate::commands::Command;
use crate::error::{Error, Result, StatusCode, TransportFault};
use crate::session::Pn532;
use crate::transport::Transport;

impl<T: Transport> Pn532<T> {
    /// Send `buf[..len]` (card command and arguments) to the registered
    /// card and read its answer back into `buf`.
    ///
    /// Returns the answer length, or `0` without any I/O when no card is
    /// registered.
    pub fn data_exchange(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        if self.registry.is_empty() {
            return Ok(0);
        }
        let len = len.min(buf.len());
        let target = self.registry.target();
        self.send(Command::InDataExchange.code(), &[target], &buf[..len])?;

        let mut status = [0u8; 1];
        let timeout = self.config.exchange_timeout();
        let n = self.receive(&mut status, buf, timeout)?;

        let result = match (n, status[0]) {
            (0, _) => Err(TransportFault::Short.into()),
            (_, 0) => Ok(n - 1),
            (_, code) => Err(Error::CardStatus(StatusCode::from_code(code))),
        };
        self.record(result)
    }
}
