//! Driver configuration parameters
//!
//! Everything the bring-up sequence sends to the chip, plus the host-side
//! timeouts.  Values can be provisioned as JSON or stored as a compact
//! postcard blob in NVS.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// HSU line rates supported by SetSerialBaudRate, in command-code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BaudRate {
    B9600 = 0,
    B19200 = 1,
    B38400 = 2,
    B57600 = 3,
    B115200 = 4,
    B230400 = 5,
    B460800 = 6,
    B921600 = 7,
    B1288000 = 8,
}

impl BaudRate {
    /// Rate the chip powers up with.
    pub const POWER_ON: Self = Self::B115200;

    /// Code byte for SetSerialBaudRate.
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn bits_per_second(self) -> u32 {
        match self {
            Self::B9600 => 9_600,
            Self::B19200 => 19_200,
            Self::B38400 => 38_400,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
            Self::B230400 => 230_400,
            Self::B460800 => 460_800,
            Self::B921600 => 921_600,
            Self::B1288000 => 1_288_000,
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pn532Config {
    // --- Line ---
    /// Rate to switch to after wake-up.
    pub baud: BaudRate,

    // --- SAM ---
    /// Virtual-card timeout in units of 50 ms.
    pub sam_timeout_50ms: u8,

    // --- RF retries (RFConfiguration item 5 / item 4) ---
    /// ATR_REQ retries (0xFF = forever).
    pub atr_retries: u8,
    /// PSL_REQ retries.
    pub psl_retries: u8,
    /// Passive activation retries for InListPassiveTarget.
    pub passive_activation_retries: u8,
    /// InCommunicateThru / InDataExchange retries.
    pub com_retries: u8,

    // --- RF timings (RFConfiguration item 2), 100 µs · 2^(n-1) ---
    pub atr_res_timeout: u8,
    pub retry_timeout: u8,

    // --- Auxiliary pins ---
    /// Pins to drive as push-pull outputs: P30–P35 in bits 0–5,
    /// P71–P72 in bits 6–7.
    pub aux_outputs: u8,

    // --- Host timeouts (milliseconds) ---
    /// Wait for the ACK frame after a command.
    pub ack_timeout_ms: u16,
    /// Default wait for a housekeeping response.
    pub response_timeout_ms: u16,
    /// Wait for an InDataExchange response.
    pub exchange_timeout_ms: u16,
    /// Wait for an InListPassiveTarget response.
    pub discovery_timeout_ms: u16,
    /// Wait for the attention-request diagnose response.
    pub presence_timeout_ms: u16,
}

impl Default for Pn532Config {
    fn default() -> Self {
        Self {
            baud: BaudRate::POWER_ON,

            sam_timeout_50ms: 20, // 1 s

            atr_retries: 0xFF,
            psl_retries: 0x01,
            passive_activation_retries: 0x01,
            com_retries: 1,

            atr_res_timeout: 0x0B, // 102.4 ms
            retry_timeout: 0x0A,   // 51.2 ms

            aux_outputs: 0,

            ack_timeout_ms: 50,
            response_timeout_ms: 50,
            exchange_timeout_ms: 500,
            discovery_timeout_ms: 110,
            presence_timeout_ms: 110,
        }
    }
}

impl Pn532Config {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms.into())
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms.into())
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms.into())
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms.into())
    }

    pub fn presence_timeout(&self) -> Duration {
        Duration::from_millis(self.presence_timeout_ms.into())
    }

    /// Reject values the chip or the host timing cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.atr_res_timeout > 0x10 || self.retry_timeout > 0x10 {
            return Err(ConfigError::ValidationFailed("RF timing code above 0x10"));
        }
        if self.ack_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("ack_timeout_ms must be non-zero"));
        }
        if self.response_timeout_ms == 0
            || self.exchange_timeout_ms == 0
            || self.discovery_timeout_ms == 0
            || self.presence_timeout_ms == 0
        {
            return Err(ConfigError::ValidationFailed("response timeouts must be non-zero"));
        }
        Ok(())
    }

    /// Parse and validate a provisioning document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Compact blob for persistent storage.
    pub fn to_blob(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Corrupted)
    }

    pub fn from_blob(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors from loading or validating a [`Pn532Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored or provisioned config could not be decoded.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// The backing store could not be read or written.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "config store I/O error"),
        }
    }
}
