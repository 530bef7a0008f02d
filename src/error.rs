//! Unified error types for the PN532 driver.
//!
//! Two disjoint fault spaces meet here: faults detected by the host while
//! talking to the chip ([`TransportFault`]) and status codes the chip itself
//! reports about the card it is talking to ([`StatusCode`]).  Both funnel
//! into [`Error`], which is what every fallible operation returns and what
//! the session keeps in its `last_error` slot.  All variants are `Copy`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Host-side framing, handshake or sequencing fault.
    Transport(TransportFault),
    /// Non-zero status byte returned by the chip for a card operation.
    CardStatus(StatusCode),
    /// Page number rejected before any I/O took place.
    PageOutOfRange(u8),
}

impl Error {
    /// Stable identifier for logs and displays.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transport(f) => f.name(),
            Self::CardStatus(s) => s.name(),
            Self::PageOutOfRange(_) => "PAGE_RANGE",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::CardStatus(e) => write!(f, "card status: {e}"),
            Self::PageOutOfRange(page) => write!(f, "page {page} out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport / protocol faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// A send was attempted while another command awaits its response.
    CommandPending,
    /// A receive (or readiness poll) was attempted with nothing sent.
    NotPending,
    /// No acknowledgement frame arrived in time.
    AckTimeout,
    /// Something other than an ACK/NACK came back after a command.
    BadAck,
    /// The chip explicitly rejected the command frame.
    Nack,
    /// Bad length checksum, wrong direction byte or impossible length.
    Header,
    /// The response belongs to a different command than the one pending.
    CommandMismatch,
    /// The response did not arrive, or arrived incomplete, in time.
    Timeout,
    /// Reply too short for what the operation needs.
    Short,
    /// Reply larger than the buffers provided for it.
    Space,
    /// Data checksum did not sum to zero.
    Checksum,
    /// The byte after the data checksum was not zero.
    Postamble,
    /// The platform transport reported a write or query failure.
    Io,
}

impl TransportFault {
    pub const fn name(self) -> &'static str {
        match self {
            Self::CommandPending => "CMDPENDING",
            Self::NotPending => "NOTPENDING",
            Self::AckTimeout => "TIMEOUTACK",
            Self::BadAck => "BADACK",
            Self::Nack => "NACK",
            Self::Header => "HEADER",
            Self::CommandMismatch => "CMDMISMATCH",
            Self::Timeout => "TIMEOUT",
            Self::Short => "SHORT",
            Self::Space => "SPACE",
            Self::Checksum => "CHECKSUM",
            Self::Postamble => "POSTAMBLE",
            Self::Io => "IO",
        }
    }
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandPending => write!(f, "command already pending"),
            Self::NotPending => write!(f, "no command pending"),
            Self::AckTimeout => write!(f, "timed out waiting for ACK"),
            Self::BadAck => write!(f, "malformed ACK"),
            Self::Nack => write!(f, "command NACKed"),
            Self::Header => write!(f, "bad frame header"),
            Self::CommandMismatch => write!(f, "response for unexpected command"),
            Self::Timeout => write!(f, "timed out waiting for response"),
            Self::Short => write!(f, "response too short"),
            Self::Space => write!(f, "response too large for buffer"),
            Self::Checksum => write!(f, "data checksum mismatch"),
            Self::Postamble => write!(f, "bad postamble"),
            Self::Io => write!(f, "transport I/O failure"),
        }
    }
}

impl From<TransportFault> for Error {
    fn from(e: TransportFault) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Chip-reported status codes
// ---------------------------------------------------------------------------

/// Status byte values from the PN532 user manual, §7.1 "Error handling".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Timeout,
    Crc,
    Parity,
    BitCount,
    Framing,
    Collision,
    BufferSpace,
    Overflow,
    NoField,
    Protocol,
    Temperature,
    InternalOverflow,
    Parameter,
    DepProtocol,
    DepFormat,
    MifareAuth,
    UidCheck,
    DepState,
    NotAllowed,
    NotAcceptable,
    Released,
    CardSwapped,
    Disappeared,
    MismatchId,
    Overcurrent,
    NadMissing,
    /// A status value the table does not list.
    Unknown(u8),
}

impl StatusCode {
    /// Classify a status byte.  The caller handles `0` (success) itself;
    /// the error bits live in the low six bits, the top bits are flags.
    pub const fn from_code(code: u8) -> Self {
        match code & 0x3F {
            0x01 => Self::Timeout,
            0x02 => Self::Crc,
            0x03 => Self::Parity,
            0x04 => Self::BitCount,
            0x05 => Self::Framing,
            0x06 => Self::Collision,
            0x07 => Self::BufferSpace,
            0x09 => Self::Overflow,
            0x0A => Self::NoField,
            0x0B => Self::Protocol,
            0x0D => Self::Temperature,
            0x0E => Self::InternalOverflow,
            0x10 => Self::Parameter,
            0x12 => Self::DepProtocol,
            0x13 => Self::DepFormat,
            0x14 => Self::MifareAuth,
            0x23 => Self::UidCheck,
            0x25 => Self::DepState,
            0x26 => Self::NotAllowed,
            0x27 => Self::NotAcceptable,
            0x29 => Self::Released,
            0x2A => Self::CardSwapped,
            0x2B => Self::Disappeared,
            0x2C => Self::MismatchId,
            0x2D => Self::Overcurrent,
            0x2E => Self::NadMissing,
            _ => Self::Unknown(code),
        }
    }

    /// The raw status value.
    pub const fn code(self) -> u8 {
        match self {
            Self::Timeout => 0x01,
            Self::Crc => 0x02,
            Self::Parity => 0x03,
            Self::BitCount => 0x04,
            Self::Framing => 0x05,
            Self::Collision => 0x06,
            Self::BufferSpace => 0x07,
            Self::Overflow => 0x09,
            Self::NoField => 0x0A,
            Self::Protocol => 0x0B,
            Self::Temperature => 0x0D,
            Self::InternalOverflow => 0x0E,
            Self::Parameter => 0x10,
            Self::DepProtocol => 0x12,
            Self::DepFormat => 0x13,
            Self::MifareAuth => 0x14,
            Self::UidCheck => 0x23,
            Self::DepState => 0x25,
            Self::NotAllowed => 0x26,
            Self::NotAcceptable => 0x27,
            Self::Released => 0x29,
            Self::CardSwapped => 0x2A,
            Self::Disappeared => 0x2B,
            Self::MismatchId => 0x2C,
            Self::Overcurrent => 0x2D,
            Self::NadMissing => 0x2E,
            Self::Unknown(code) => code,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Timeout => "STATUS_TIMEOUT",
            Self::Crc => "STATUS_CRC",
            Self::Parity => "STATUS_PARITY",
            Self::BitCount => "STATUS_BITCOUNT",
            Self::Framing => "STATUS_FRAMING",
            Self::Collision => "STATUS_COLLISION",
            Self::BufferSpace => "STATUS_SPACE",
            Self::Overflow => "STATUS_OVERFLOW",
            Self::NoField => "STATUS_NOFIELD",
            Self::Protocol => "STATUS_PROTOCOL",
            Self::Temperature => "STATUS_TEMPERATURE",
            Self::InternalOverflow => "STATUS_INTOVERFLOW",
            Self::Parameter => "STATUS_PARAMETER",
            Self::DepProtocol => "STATUS_DEPPROTOCOL",
            Self::DepFormat => "STATUS_DEPFORMAT",
            Self::MifareAuth => "STATUS_MIFAREAUTH",
            Self::UidCheck => "STATUS_UIDCHECK",
            Self::DepState => "STATUS_DEPSTATE",
            Self::NotAllowed => "STATUS_NOTALLOWED",
            Self::NotAcceptable => "STATUS_NOTACCEPTABLE",
            Self::Released => "STATUS_RELEASED",
            Self::CardSwapped => "STATUS_CARDSWAPPED",
            Self::Disappeared => "STATUS_DISAPPEARED",
            Self::MismatchId => "STATUS_MISMATCHID",
            Self::Overcurrent => "STATUS_OVERCURRENT",
            Self::NadMissing => "STATUS_NADMISSING",
            Self::Unknown(_) => "STATUS_UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "target did not answer"),
            Self::Crc => write!(f, "CRC error"),
            Self::Parity => write!(f, "parity error"),
            Self::BitCount => write!(f, "erroneous bit count during anticollision"),
            Self::Framing => write!(f, "MIFARE framing error"),
            Self::Collision => write!(f, "abnormal bit collision"),
            Self::BufferSpace => write!(f, "communication buffer too small"),
            Self::Overflow => write!(f, "RF buffer overflow"),
            Self::NoField => write!(f, "RF field not switched on in time"),
            Self::Protocol => write!(f, "RF protocol error"),
            Self::Temperature => write!(f, "antenna driver overheated"),
            Self::InternalOverflow => write!(f, "internal buffer overflow"),
            Self::Parameter => write!(f, "invalid parameter"),
            Self::DepProtocol => write!(f, "DEP protocol: unsupported command"),
            Self::DepFormat => write!(f, "DEP protocol: bad data format"),
            Self::MifareAuth => write!(f, "MIFARE authentication error"),
            Self::UidCheck => write!(f, "UID check byte wrong"),
            Self::DepState => write!(f, "DEP protocol: invalid device state"),
            Self::NotAllowed => write!(f, "operation not allowed"),
            Self::NotAcceptable => write!(f, "command not acceptable in this context"),
            Self::Released => write!(f, "target released by initiator"),
            Self::CardSwapped => write!(f, "card ID does not match (card swapped)"),
            Self::Disappeared => write!(f, "activated card disappeared"),
            Self::MismatchId => write!(f, "NFCID3 mismatch"),
            Self::Overcurrent => write!(f, "over-current detected"),
            Self::NadMissing => write!(f, "NAD missing in DEP frame"),
            Self::Unknown(code) => write!(f, "unknown status 0x{code:02X}"),
        }
    }
}

impl From<StatusCode> for Error {
    fn from(e: StatusCode) -> Self {
        Self::CardStatus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
