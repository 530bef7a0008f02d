//! Card-level operations built on [`Pn532::data_exchange`].
//!
//! MIFARE Classic block access assumes the sector is already
//! authenticated.  NTAG2xx user memory runs from page 4 to at most
//! page 225 (NTAG216):
//!
//! | Tag      | Pages | User start | User stop |
//! |----------|-------|------------|-----------|
//! | NTAG 203 | 42    | 4          | 39        |
//! | NTAG 213 | 45    | 4          | 39        |
//! | NTAG 215 | 135   | 4          | 129       |
//! | NTAG 216 | 231   | 4          | 225       |

use log::{debug, info, warn};

use crate::commands::Command;
use crate::error::{Error, Result, TransportFault};
use crate::session::Pn532;
use crate::transport::Transport;

const MIFARE_CMD_READ: u8 = 0x30;
const MIFARE_CMD_WRITE: u8 = 0xA0;
const NTAG_CMD_READ: u8 = 0x30;
const NTAG_CMD_WRITE: u8 = 0xA2;

/// Diagnose test number for the ISO/IEC 14443-4 attention request.
const DIAG_ATTENTION_REQUEST: u8 = 0x06;

/// Room for a 16-byte READ answer plus slack.
const CARD_BUF: usize = 26;

pub const NTAG_FIRST_USER_PAGE: u8 = 4;
pub const NTAG_LAST_USER_PAGE: u8 = 225;
/// First page past the end of the largest NTAG2xx.
pub const NTAG_PAGE_LIMIT: u8 = 231;

/// MAD sector contents for an NDEF-formatted MIFARE Classic card.
const NDEF_BLOCK_1: [u8; 16] = [
    0x14, 0x01, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1,
];
const NDEF_BLOCK_2: [u8; 16] = [
    0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1, 0x03, 0xE1,
];
/// Sector trailer: MAD key A, access bits, key B.
const NDEF_BLOCK_3: [u8; 16] = [
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0x78, 0x77, 0x88, 0xC1, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Outcome of [`Pn532::ntag_erase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EraseSummary {
    /// Page writes issued.
    pub attempted: u16,
    /// Page writes that failed.
    pub failed: u16,
}

impl EraseSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl<T: Transport> Pn532<T> {
    /// Read one 16-byte MIFARE Classic block.
    pub fn mifare_read_block(&mut self, block: u8) -> Result<[u8; 16]> {
        let mut buf = [0u8; CARD_BUF];
        buf[0] = MIFARE_CMD_READ;
        buf[1] = block;
        let n = self.data_exchange(&mut buf, 2)?;
        if n < 16 {
            return self.record(Err(TransportFault::Short.into()));
        }
        let mut out = [0u8; 16];
        out.copy_from_slice(&buf[..16]);
        Ok(out)
    }

    /// Write one 16-byte MIFARE Classic block.
    pub fn mifare_write_block(&mut self, block: u8, data: &[u8; 16]) -> Result<usize> {
        let mut buf = [0u8; CARD_BUF];
        buf[0] = MIFARE_CMD_WRITE;
        buf[1] = block;
        buf[2..18].copy_from_slice(data);
        self.data_exchange(&mut buf, 18)
    }

    /// Lay out an empty NDEF MAD in sector 0.  Stops at the first block
    /// that fails.
    pub fn mifare_format_ndef(&mut self) -> Result<()> {
        for (block, data) in [(1, &NDEF_BLOCK_1), (2, &NDEF_BLOCK_2), (3, &NDEF_BLOCK_3)] {
            if let Err(e) = self.mifare_write_block(block, data) {
                warn!("cards: NDEF format failed at block {}: {}", block, e.name());
                return Err(e);
            }
        }
        info!("cards: MIFARE Classic formatted for NDEF");
        Ok(())
    }

    /// Read one 4-byte NTAG2xx page.
    pub fn ntag_read_page(&mut self, page: u8) -> Result<[u8; 4]> {
        if page >= NTAG_PAGE_LIMIT {
            return Err(Error::PageOutOfRange(page));
        }
        let mut buf = [0u8; CARD_BUF];
        buf[0] = NTAG_CMD_READ;
        buf[1] = page;
        let n = self.data_exchange(&mut buf, 2)?;
        if n < 4 {
            return self.record(Err(TransportFault::Short.into()));
        }
        // READ returns four pages; only the requested one is kept.
        Ok([buf[0], buf[1], buf[2], buf[3]])
    }

    /// Write one 4-byte NTAG2xx user page.
    pub fn ntag_write_page(&mut self, page: u8, data: &[u8; 4]) -> Result<usize> {
        if !(NTAG_FIRST_USER_PAGE..=NTAG_LAST_USER_PAGE).contains(&page) {
            return Err(Error::PageOutOfRange(page));
        }
        let mut buf = [0u8; CARD_BUF];
        buf[0] = NTAG_CMD_WRITE;
        buf[1] = page;
        buf[2..6].copy_from_slice(data);
        self.data_exchange(&mut buf, 6)
    }

    /// Zero user pages 4 through `max_page`, carrying on past failures.
    pub fn ntag_erase(&mut self, max_page: u8) -> EraseSummary {
        let mut summary = EraseSummary::default();
        for page in NTAG_FIRST_USER_PAGE..=max_page {
            summary.attempted += 1;
            if let Err(e) = self.ntag_write_page(page, &[0; 4]) {
                debug!("cards: erase of page {} failed: {}", page, e.name());
                summary.failed += 1;
            }
        }
        if !summary.is_clean() {
            warn!("cards: erase finished with {}/{} failed pages", summary.failed, summary.attempted);
        }
        summary
    }

    /// Whether the registered card is still in the field; returns the
    /// card count.
    ///
    /// Cards that answer the attention request are checked with a single
    /// Diagnose.  Everything else, and any doubt, falls back to a full
    /// [`Pn532::cards`] discovery.
    pub fn present(&mut self) -> Result<u8> {
        if !self.is_pending() && self.registry.supports_presence_check() {
            match self.attention_request() {
                Ok(0) => return Ok(self.registry.count()),
                Ok(status) => debug!("cards: attention request status 0x{:02X}", status),
                Err(e) => debug!("cards: attention request failed: {}", e.name()),
            }
        }
        self.cards()
    }

    fn attention_request(&mut self) -> Result<u8> {
        let mut status = [0u8; 1];
        let timeout = self.config.presence_timeout();
        let n = self.transact(Command::Diagnose.code(), &[DIAG_ATTENTION_REQUEST], &mut status, timeout)?;
        if n < 1 {
            return self.record(Err(TransportFault::Short.into()));
        }
        Ok(status[0])
    }
}
