//! PN532 NFC controller driver over HSU (high speed UART).
//!
//! ```text
//!  application
//!      │  &mut Pn532 / SharedPn532::lock()
//!      ▼
//!  session ──▶ codec ──▶ link ──▶ Transport ──▶ chip
//!      ▲                                         │
//!      └──── registry / exchange / cards ◀───────┘
//! ```
//!
//! The protocol layers are plain Rust and run on the host against any
//! [`Transport`].  ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]`.

#![deny(unused_must_use)]

pub mod cards;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod exchange;
pub mod init;
pub mod link;
pub mod registry;
pub mod session;
pub mod shared;
pub mod transport;

pub mod adapters;
pub mod pins;

pub use cards::EraseSummary;
pub use commands::{Command, FirmwareVersion};
pub use config::{BaudRate, ConfigError, Pn532Config};
pub use error::{Error, Result, StatusCode, TransportFault};
pub use registry::CardRegistry;
pub use session::{Pn532, SessionState};
pub use shared::SharedPn532;
pub use transport::Transport;
