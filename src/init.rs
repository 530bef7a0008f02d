//! Chip bring-up.
//!
//! ```text
//!  wake ──▶ [baud change] ──▶ SAM (1 retry) ──▶ firmware ──▶ max retries
//!        ──▶ aux pins ──▶ MaxRtyCOM ──▶ timings ──▶ ready
//! ```
//!
//! The chip powers up at 115200 baud in low-VBAT mode; SAMConfiguration
//! must be the first real command.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::codec::ACK_FRAME;
use crate::config::{BaudRate, Pn532Config};
use crate::error::{Error, Result};
use crate::session::Pn532;
use crate::transport::Transport;

/// Wake-up preamble: a long run of zeros followed by idle `55` bytes.
const WAKE_ZEROS: usize = 27;
const WAKE_IDLE: [u8; 3] = [0x55; 3];

const WAKE_TX_TIMEOUT: Duration = Duration::from_millis(100);

/// Longer than any response the chip could still owe after a failed SAM
/// attempt.
const SAM_RETRY_DRAIN: Duration = Duration::from_millis(100);

/// Settle time either side of a host baud change.
const BAUD_SETTLE_MS: u32 = 10;

impl<T: Transport> Pn532<T> {
    /// Wake the chip on `transport` and configure it per `config`.
    ///
    /// Any fault aborts bring-up; the transport is dropped with the
    /// half-built session.
    pub fn init(transport: T, config: Pn532Config, delay: &mut impl DelayNs) -> Result<Self> {
        let mut pn = Self::new(transport, config);
        pn.wake()?;

        if pn.config.baud != BaudRate::POWER_ON {
            pn.change_baud_rate(delay).inspect_err(|e| log_abort("baud rate change", *e))?;
        }

        pn.configure_sam().inspect_err(|e| log_abort("SAMConfiguration", *e))?;

        let fw = pn.firmware_version().inspect_err(|e| log_abort("GetFirmwareVersion", *e))?;
        info!("pn532: found {}", fw);

        let cfg = pn.config.clone();
        pn.set_max_retries(cfg.atr_retries, cfg.psl_retries, cfg.passive_activation_retries)
            .inspect_err(|e| log_abort("RFConfiguration (retries)", *e))?;
        pn.configure_aux_pins(cfg.aux_outputs)
            .inspect_err(|e| log_abort("WriteRegister", *e))?;
        pn.set_com_retries(cfg.com_retries)
            .inspect_err(|e| log_abort("RFConfiguration (MaxRtyCOM)", *e))?;
        pn.set_timings(cfg.atr_res_timeout, cfg.retry_timeout)
            .inspect_err(|e| log_abort("RFConfiguration (timings)", *e))?;

        info!("pn532: ready at {} baud", cfg.baud.bits_per_second());
        Ok(pn)
    }

    fn wake(&mut self) -> Result<()> {
        let mut seq = [0u8; WAKE_ZEROS + WAKE_IDLE.len()];
        seq[WAKE_ZEROS..].copy_from_slice(&WAKE_IDLE);

        let result = self
            .link
            .flush_input()
            .and_then(|()| self.link.write_all(&seq))
            .and_then(|()| self.link.wait_tx_done(WAKE_TX_TIMEOUT))
            .map_err(Error::from);
        self.record(result)
    }

    fn change_baud_rate(&mut self, delay: &mut impl DelayNs) -> Result<()> {
        let baud = self.config.baud;
        self.set_serial_baud_rate(baud)?;

        // The chip only switches once it has seen our ACK at the old rate.
        let result = self
            .link
            .write_all(&ACK_FRAME)
            .and_then(|()| self.link.wait_tx_done(WAKE_TX_TIMEOUT))
            .and_then(|()| {
                delay.delay_ms(BAUD_SETTLE_MS);
                self.link.set_baud_rate(baud.bits_per_second())
            })
            .map_err(Error::from);
        self.record(result)?;

        delay.delay_ms(BAUD_SETTLE_MS);
        info!("pn532: host switched to {} baud", baud.bits_per_second());
        Ok(())
    }

    fn configure_sam(&mut self) -> Result<()> {
        let timeout = self.config.sam_timeout_50ms;
        if let Err(e) = self.sam_configuration(timeout) {
            warn!("pn532: SAMConfiguration failed ({}), retrying", e.name());
            self.link.drain(SAM_RETRY_DRAIN);
            self.sam_configuration(timeout)?;
        }
        Ok(())
    }
}

fn log_abort(step: &str, e: Error) {
    error!("pn532: {} failed: {} ({})", step, e.name(), e);
}
