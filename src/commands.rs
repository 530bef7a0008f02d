//! PN532 command set and housekeeping commands.
//!
//! Command codes from the PN532 user manual (UM0701-02), §7.  Only the
//! commands this driver issues are listed.

use core::time::Duration;

use log::info;

use crate::config::BaudRate;
use crate::error::{Result, TransportFault};
use crate::session::Pn532;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Diagnose = 0x00,
    GetFirmwareVersion = 0x02,
    WriteRegister = 0x08,
    ReadGpio = 0x0C,
    WriteGpio = 0x0E,
    SetSerialBaudRate = 0x10,
    SamConfiguration = 0x14,
    RfConfiguration = 0x32,
    InDataExchange = 0x40,
    InDeselect = 0x44,
    InListPassiveTarget = 0x4A,
    InRelease = 0x52,
}

impl Command {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Command code the chip puts in its response frame.
    pub const fn response(self) -> u8 {
        self.code().wrapping_add(1)
    }
}

/// RFConfiguration items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RfItem {
    /// ATR_RES timeout and InCommunicateThru/InDataExchange retry timeout.
    Timings = 0x02,
    /// MaxRtyCOM.
    MaxRetryCom = 0x04,
    /// MxRtyATR, MxRtyPSL, MxRtyPassiveActivation.
    MaxRetries = 0x05,
}

/// GetFirmwareVersion response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// `0x32` for a PN532.
    pub ic: u8,
    pub version: u8,
    pub revision: u8,
    /// Bit 0 ISO 14443 type A, bit 1 type B, bit 2 ISO 18092.
    pub support: u8,
}

impl core::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "PN5{:02X} v{}.{} (support 0x{:02X})",
            self.ic, self.version, self.revision, self.support
        )
    }
}

/// InDeselect / InRelease may first have to wait out an RF exchange.
const RELEASE_TIMEOUT: Duration = Duration::from_millis(100);

const BAUD_CHANGE_TIMEOUT: Duration = Duration::from_millis(20);

/// SFR addresses of the port 3 / port 7 configuration registers.
const P3CFGA: u16 = 0xFFFC;
const P3CFGB: u16 = 0xFFFD;
const P3: u16 = 0xFFB0;
const P7CFGA: u16 = 0xFFF4;
const P7CFGB: u16 = 0xFFF5;
const P7: u16 = 0xFFF7;

/// Bits usable on port 3 (P30–P35) and port 7 (P71, P72).
const P3_MASK: u8 = 0x3F;
const P7_MASK: u8 = 0x06;

/// Split a caller pin mask (P30–P35 in bits 0–5, P71–P72 in bits 6–7)
/// into port 3 and port 7 register bits.
const fn split_pins(value: u8) -> (u8, u8) {
    (value & P3_MASK, (value >> 5) & P7_MASK)
}

impl<T: Transport> Pn532<T> {
    /// Put the SAM in normal mode (no secure element) with IRQ unused.
    pub fn sam_configuration(&mut self, timeout_50ms: u8) -> Result<()> {
        let mut reply = [0u8; 4];
        let timeout = self.config.response_timeout();
        self.transact(Command::SamConfiguration.code(), &[0x01, timeout_50ms, 0x00], &mut reply, timeout)?;
        Ok(())
    }

    /// Send GetFirmwareVersion without waiting for the answer.
    pub fn send_firmware_version(&mut self) -> Result<()> {
        self.send(Command::GetFirmwareVersion.code(), &[], &[])?;
        Ok(())
    }

    /// Query the firmware version, collecting a previously sent query if
    /// one is pending.
    pub fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        if !self.is_pending() {
            self.send_firmware_version()?;
        }
        let mut reply = [0u8; 8];
        let timeout = self.config.discovery_timeout();
        let n = self.receive(&mut reply, &mut [], timeout)?;
        if n < 4 {
            return self.record(Err(TransportFault::Short.into()));
        }
        Ok(FirmwareVersion {
            ic: reply[0],
            version: reply[1],
            revision: reply[2],
            support: reply[3],
        })
    }

    /// Raw RFConfiguration.
    pub fn rf_configuration(&mut self, item: RfItem, data: &[u8]) -> Result<()> {
        let mut reply = [0u8; 4];
        let timeout = self.config.response_timeout();
        self.send(Command::RfConfiguration.code(), &[item as u8], data)?;
        self.receive(&mut reply, &mut [], timeout)?;
        Ok(())
    }

    /// Retry counts for ATR_REQ, PSL_REQ and passive activation.
    pub fn set_max_retries(&mut self, atr: u8, psl: u8, passive_activation: u8) -> Result<()> {
        self.rf_configuration(RfItem::MaxRetries, &[atr, psl, passive_activation])
    }

    /// Retry count for InDataExchange / InCommunicateThru.
    pub fn set_com_retries(&mut self, retries: u8) -> Result<()> {
        self.rf_configuration(RfItem::MaxRetryCom, &[retries])
    }

    /// ATR_RES and retry timeouts, each coded as 100 µs · 2^(n-1).
    pub fn set_timings(&mut self, atr_res_timeout: u8, retry_timeout: u8) -> Result<()> {
        self.rf_configuration(RfItem::Timings, &[0x00, atr_res_timeout, retry_timeout])
    }

    /// Make the pins in `outputs` push-pull outputs driven high, leaving
    /// the rest as inputs.  Pin mask as for [`Pn532::write_gpio`].
    pub fn configure_aux_pins(&mut self, outputs: u8) -> Result<()> {
        let (p3, p7) = split_pins(outputs);
        // CFGA/CFGB per bit: 01 = input, 11 = push-pull output.
        let writes: [(u16, u8); 6] = [
            (P3CFGA, p3),
            (P3CFGB, 0xFF),
            (P3, 0xFF),
            (P7CFGA, p7),
            (P7CFGB, 0xFF),
            (P7, 0xFF),
        ];

        let mut payload = [0u8; 18];
        for (chunk, (addr, value)) in payload.chunks_exact_mut(3).zip(writes) {
            let [hi, lo] = addr.to_be_bytes();
            chunk.copy_from_slice(&[hi, lo, value]);
        }

        let mut reply = [0u8; 4];
        let timeout = self.config.response_timeout();
        self.transact(Command::WriteRegister.code(), &payload, &mut reply, timeout)?;
        Ok(())
    }

    /// Drive the auxiliary outputs: P72/P71 in bits 7–6, P35–P30 in 5–0.
    pub fn write_gpio(&mut self, value: u8) -> Result<()> {
        let (p3, p7) = split_pins(value);
        let mut reply = [0u8; 2];
        let timeout = self.config.response_timeout();
        // Bit 7 of each byte marks the port as "to be written".
        self.transact(Command::WriteGpio.code(), &[0x80 | p3, 0x80 | p7], &mut reply, timeout)?;
        Ok(())
    }

    /// Read the auxiliary pins, packed as for [`Pn532::write_gpio`].
    pub fn read_gpio(&mut self) -> Result<u8> {
        let mut reply = [0u8; 3];
        let timeout = self.config.response_timeout();
        let n = self.transact(Command::ReadGpio.code(), &[], &mut reply, timeout)?;
        if n < 3 {
            return self.record(Err(TransportFault::Short.into()));
        }
        Ok((reply[0] & P3_MASK) | ((reply[1] & P7_MASK) << 5))
    }

    /// InDeselect; target 0 means all targets.
    pub fn deselect(&mut self, target: u8) -> Result<usize> {
        let mut reply = [0u8; 2];
        self.transact(Command::InDeselect.code(), &[target], &mut reply, RELEASE_TIMEOUT)
    }

    /// InRelease; target 0 means all targets.
    pub fn release_target(&mut self, target: u8) -> Result<usize> {
        let mut reply = [0u8; 2];
        self.transact(Command::InRelease.code(), &[target], &mut reply, RELEASE_TIMEOUT)
    }

    /// Ask the chip to switch its UART rate.  The caller must follow up
    /// with an ACK frame at the old rate before changing the host side.
    pub fn set_serial_baud_rate(&mut self, baud: BaudRate) -> Result<()> {
        let mut reply = [0u8; 4];
        self.transact(
            Command::SetSerialBaudRate.code(),
            &[baud.code()],
            &mut reply,
            BAUD_CHANGE_TIMEOUT,
        )?;
        info!("pn532: chip switching to {} baud", baud.bits_per_second());
        Ok(())
    }
}
