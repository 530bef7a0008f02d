//! Thread-shared session handle.
//!
//! A [`Pn532`] is single-owner (`&mut self`).  Tasks that share one chip
//! go through [`SharedPn532`]; whoever holds the guard owns the wire, so
//! a split send / receive must happen under one `lock()`.

use std::sync::{Mutex, MutexGuard, TryLockError};

use log::warn;

use crate::error::Error;
use crate::registry::CardRegistry;
use crate::session::Pn532;

pub struct SharedPn532<T> {
    inner: Mutex<Pn532<T>>,
}

impl<T> SharedPn532<T> {
    pub fn new(pn: Pn532<T>) -> Self {
        Self { inner: Mutex::new(pn) }
    }

    /// Exclusive access for one or more transactions.
    ///
    /// A poisoned lock is recovered.  A panicking holder at worst left a
    /// command pending, which the next `send` reports.
    pub fn lock(&self) -> MutexGuard<'_, Pn532<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("pn532: session lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Copy of the registry and last fault, or `None` while another
    /// thread is mid-transaction.
    pub fn snapshot(&self) -> Option<(CardRegistry, Option<Error>)> {
        let guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some((guard.registry.clone(), guard.last_error))
    }

    pub fn into_inner(self) -> Pn532<T> {
        self.inner
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
