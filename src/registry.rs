//! Card registry: what the last InListPassiveTarget found.
//!
//! InListPassiveTarget response for 106 kbps type A, per target:
//! ```text
//! ┌────┬──────────┬─────────┬────────────┬─────────────────┬──────────────┐
//! │ Tg │ SENS_RES │ SEL_RES │ NFCIDLength│ NFCID1 (n bytes)│ ATS (opt.)   │
//! │ 1B │ 2B (BE)  │ 1B      │ 1B         │                 │ len incl. TL │
//! └────┴──────────┴─────────┴────────────┴─────────────────┴──────────────┘
//! ```
//! preceded by a single `NbTg` byte.  Only the first target is retained.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::commands::Command;
use crate::error::{Result, TransportFault};
use crate::session::{Pn532, SessionState};
use crate::transport::Transport;

/// Longest UID kept (triple-size NFCID1).
pub const MAX_UID: usize = 10;

/// Stored ATS size: one length byte plus up to 29 bytes that follow it.
pub const MAX_ATS: usize = 30;

/// ATS format byte T0 announcing TA, TB and TC with FSCI 5.  DESFire
/// cards answer with this and support the attention-request check.
pub const PRESENCE_CHECK_T0: u8 = 0x75;

/// Ask for up to two targets; only the first is kept.
const MAX_TARGETS: u8 = 2;

/// BrTy 0: 106 kbps ISO/IEC 14443 type A.
const BRTY_106K_TYPE_A: u8 = 0x00;

/// Generous bound on a two-target type A response.
const DISCOVERY_REPLY_MAX: usize = 128;

/// Attributes of the primary discovered card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardRegistry {
    count: u8,
    target: u8,
    sens_res: u16,
    sel_res: u8,
    uid: Vec<u8, MAX_UID>,
    ats: Vec<u8, MAX_ATS>,
}

impl CardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cards seen by the last discovery (0, 1 or 2).
    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Logical target number the chip assigned to the primary card.
    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn sens_res(&self) -> u16 {
        self.sens_res
    }

    pub fn sel_res(&self) -> u8 {
        self.sel_res
    }

    /// UID of the primary card; empty when none (or too long to keep).
    pub fn uid(&self) -> &[u8] {
        &self.uid
    }

    /// ATS as stored: first byte is the length of what follows.
    /// Empty when the card sent none.
    pub fn ats(&self) -> &[u8] {
        &self.ats
    }

    /// UID as upper-case hex, e.g. `04A2B3C4D5E680`.
    pub fn uid_hex(&self) -> String<{ MAX_UID * 2 }> {
        let mut text = String::new();
        for b in &self.uid {
            // Capacity is exactly two characters per UID byte.
            let _ = write!(text, "{b:02X}");
        }
        text
    }

    /// Whether the registered card answers the cheap attention-request
    /// presence test.
    pub fn supports_presence_check(&self) -> bool {
        self.count > 0 && self.ats.first().is_some_and(|&len| len > 0) && self.ats.get(1) == Some(&PRESENCE_CHECK_T0)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace the registry with the content of an InListPassiveTarget
    /// response.  Returns the card count.
    ///
    /// The registry is cleared first; if parsing fails it stays empty.
    pub fn parse_discovery(&mut self, reply: &[u8]) -> Result<u8> {
        self.clear();
        *self = Self::parse(reply)?;
        Ok(self.count)
    }

    fn parse(reply: &[u8]) -> core::result::Result<Self, TransportFault> {
        let (&count, rest) = reply.split_first().ok_or(TransportFault::Short)?;
        let mut reg = Self { count, ..Self::default() };
        if count == 0 {
            return Ok(reg);
        }

        // Tg, SENS_RES (2), SEL_RES, NFCIDLength
        if rest.len() < 5 {
            return Err(TransportFault::Space);
        }
        reg.target = rest[0];
        reg.sens_res = u16::from_be_bytes([rest[1], rest[2]]);
        reg.sel_res = rest[3];
        let rest = &rest[4..];

        let uid_len = usize::from(rest[0]);
        if 1 + uid_len > rest.len() {
            return Err(TransportFault::Short);
        }
        if uid_len <= MAX_UID {
            reg.uid = Vec::from_slice(&rest[1..=uid_len]).map_err(|()| TransportFault::Space)?;
        }
        let rest = &rest[1 + uid_len..];

        if let Some(&ats_len) = rest.first() {
            let ats_len = usize::from(ats_len);
            if ats_len == 0 || ats_len > rest.len() {
                return Err(TransportFault::Short);
            }
            if ats_len <= MAX_ATS {
                reg.ats = Vec::from_slice(&rest[..ats_len]).map_err(|()| TransportFault::Space)?;
                // Stored length excludes the length byte itself.
                reg.ats[0] = (ats_len - 1) as u8;
            }
            // Anything after this belongs to a second target.
        }

        Ok(reg)
    }
}

impl<T: Transport> Pn532<T> {
    /// Send InListPassiveTarget without waiting for the result.  Poll
    /// [`Pn532::ready`] and collect with [`Pn532::cards`].
    pub fn start_discovery(&mut self) -> Result<()> {
        self.send(
            Command::InListPassiveTarget.code(),
            &[MAX_TARGETS, BRTY_106K_TYPE_A],
            &[],
        )?;
        Ok(())
    }

    /// Number of cards in the field, refreshing the registry.
    ///
    /// Starts a discovery if nothing is pending, then collects its result.
    pub fn cards(&mut self) -> Result<u8> {
        if !self.is_pending() {
            self.start_discovery()?;
        }
        let expected = Command::InListPassiveTarget.response();
        if self.state != (SessionState::AwaitingResponse { expected }) {
            return self.record(Err(TransportFault::CommandMismatch.into()));
        }

        let mut reply = [0u8; DISCOVERY_REPLY_MAX];
        let timeout = self.config.discovery_timeout();
        let n = self.receive(&mut reply, &mut [], timeout)?;
        let result = self.registry.parse_discovery(&reply[..n]);
        self.record(result)
    }
}
