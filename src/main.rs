//! PN532 reader firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  NvsConfigStore ──▶ Pn532Config                          │
//! │  EspUart (UART1) ──▶ Pn532::init ──▶ SharedPn532         │
//! │                                        │                 │
//! │                 ┌──────────────────────┴──────────┐      │
//! │                 │ poll loop: present() / cards()  │      │
//! │                 │ status task: snapshot()         │      │
//! │                 └─────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use heapless::String;
use log::{info, warn};

use pn532_hsu::adapters::nvs::NvsConfigStore;
use pn532_hsu::adapters::uart::EspUart;
use pn532_hsu::registry::MAX_UID;
use pn532_hsu::{Pn532, Pn532Config, SharedPn532, pins};

const CARD_POLL_INTERVAL: Duration = Duration::from_millis(250);
const STATUS_INTERVAL: Duration = Duration::from_secs(10);

/// P30 high while a card is in the field.
const LED_GPIO_BIT: u8 = 0b0000_0001;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PN532 reader v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut config = match NvsConfigStore::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            Pn532Config::default()
        }
    };
    if config.aux_outputs == 0 {
        config.aux_outputs = pins::PN532_AUX_OUTPUTS;
    }

    // ── 3. Bring up the PN532 ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let uart = EspUart::new(peripherals.uart1)?;
    let pn = Pn532::init(uart, config, &mut FreeRtos)
        .map_err(|e| anyhow!("PN532 bring-up failed: {} ({})", e.name(), e))?;
    let pn = Arc::new(SharedPn532::new(pn));

    // ── 4. Status reporter ────────────────────────────────────
    let status = Arc::clone(&pn);
    std::thread::Builder::new()
        .name("pn532-status".into())
        .stack_size(4096)
        .spawn(move || {
            loop {
                std::thread::sleep(STATUS_INTERVAL);
                match status.snapshot() {
                    Some((registry, last_error)) => info!(
                        "status: {} card(s), uid={}, last error {}",
                        registry.count(),
                        registry.uid_hex(),
                        last_error.map_or("none", |e| e.name())
                    ),
                    None => info!("status: reader busy"),
                }
            }
        })?;

    // ── 5. Card poll loop ─────────────────────────────────────
    info!("Reader ready. Polling for cards.");
    let mut current: String<{ MAX_UID * 2 }> = String::new();
    loop {
        {
            let mut reader = pn.lock();
            let seen = match reader.present() {
                Ok(n) => n > 0,
                Err(e) => {
                    warn!("poll failed: {}", e.name());
                    false
                }
            };

            let uid = if seen { reader.registry().uid_hex() } else { String::new() };
            if uid != current {
                if uid.is_empty() {
                    info!("card {} removed", current);
                } else {
                    info!("card {} presented", uid);
                }
                let led = if uid.is_empty() { 0 } else { LED_GPIO_BIT };
                if let Err(e) = reader.write_gpio(led) {
                    warn!("LED update failed: {}", e.name());
                }
                current = uid;
            }
        }
        std::thread::sleep(CARD_POLL_INTERVAL);
    }
}
