//! ESP-IDF UART adapter: [`Transport`] over `esp_idf_hal::uart::UartDriver`.
//!
//! The PN532 HSU link is 8-N-1 without flow control, starting at
//! 115200 baud.

use core::time::Duration;

use esp_idf_hal::delay::TickType;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::uart::{self, Uart, UartDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::sys::EspError;
use log::info;

use crate::config::BaudRate;
use crate::pins;
use crate::transport::Transport;

/// UART driver bound to the PN532.
pub struct EspUart<'d> {
    driver: UartDriver<'d>,
}

impl<'d> EspUart<'d> {
    /// Install the UART driver on the PN532 pins at the power-on rate.
    pub fn new<U: Uart>(uart: impl Peripheral<P = U> + 'd) -> Result<Self, EspError> {
        let config = uart::config::Config::new().baudrate(Hertz(BaudRate::POWER_ON.bits_per_second()));

        // SAFETY: the PN532 pins are reserved for this driver and not
        // handed out through `Peripherals` anywhere else.
        let (tx, rx) = unsafe {
            (
                AnyIOPin::new(pins::PN532_TX_GPIO),
                AnyIOPin::new(pins::PN532_RX_GPIO),
            )
        };

        let driver = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        info!(
            "EspUart: UART{} tx=GPIO{} rx=GPIO{}",
            pins::PN532_UART_NUM,
            pins::PN532_TX_GPIO,
            pins::PN532_RX_GPIO
        );
        Ok(Self { driver })
    }

    pub fn from_driver(driver: UartDriver<'d>) -> Self {
        Self { driver }
    }
}

fn ticks(timeout: Duration) -> u32 {
    TickType::from(timeout).ticks()
}

impl Transport for EspUart<'_> {
    type Error = EspError;

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.driver.write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, EspError> {
        self.driver.read(buf, ticks(timeout))
    }

    fn buffered_len(&mut self) -> Result<usize, EspError> {
        self.driver.remaining_read()
    }

    fn flush_input(&mut self) -> Result<(), EspError> {
        self.driver.clear_rx()
    }

    fn wait_tx_done(&mut self, timeout: Duration) -> Result<(), EspError> {
        self.driver.wait_tx_done(ticks(timeout))
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), EspError> {
        self.driver.change_baudrate(Hertz(baud))?;
        Ok(())
    }
}
