//! Adapters: platform implementations behind the driver's seams.
//!
//! | Adapter | Implements          | Connects to                 |
//! |---------|---------------------|-----------------------------|
//! | `nvs`   | config persistence  | NVS / in-memory store       |
//! | `uart`  | `Transport`         | ESP-IDF UART driver (8-N-1) |

pub mod nvs;
#[cfg(target_os = "espidf")]
pub mod uart;
