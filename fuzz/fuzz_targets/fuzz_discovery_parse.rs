//! Fuzz target: `CardRegistry::parse_discovery`
//!
//! Any InListPassiveTarget payload must parse or fail without panicking,
//! and a failed parse must leave the registry empty.
//!
//! cargo fuzz run fuzz_discovery_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use pn532_hsu::CardRegistry;
use pn532_hsu::registry::{MAX_ATS, MAX_UID};

fuzz_target!(|data: &[u8]| {
    let mut registry = CardRegistry::new();
    match registry.parse_discovery(data) {
        Ok(count) => {
            assert_eq!(count, registry.count());
            assert!(registry.uid().len() <= MAX_UID);
            assert!(registry.ats().len() <= MAX_ATS);
            if let Some(&len) = registry.ats().first() {
                assert_eq!(usize::from(len) + 1, registry.ats().len());
            }
        }
        Err(_) => assert!(registry.is_empty()),
    }
});
