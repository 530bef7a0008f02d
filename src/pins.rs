//! GPIO / peripheral assignments for the PN532 reader board.
//!
//! Single source of truth for the wiring; the UART adapter and the
//! firmware entry point reference these rather than hard-coding numbers.

// ---------------------------------------------------------------------------
// PN532 HSU link
// ---------------------------------------------------------------------------

/// UART peripheral wired to the PN532 (UART0 stays on the console).
pub const PN532_UART_NUM: u8 = 1;
/// ESP TX → PN532 RXD / SDA.
pub const PN532_TX_GPIO: i32 = 17;
/// ESP RX ← PN532 TXD / SCL.
pub const PN532_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// PN532 auxiliary pins
// ---------------------------------------------------------------------------

/// PN532 pins driven as outputs: P30 (green LED) and P31 (buzzer).
/// Bit layout as for `Pn532Config::aux_outputs`.
pub const PN532_AUX_OUTPUTS: u8 = 0b0000_0011;
