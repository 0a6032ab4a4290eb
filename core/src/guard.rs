//! Keyed in-flight guard.
//!
//! A key stays registered for as long as its `InFlightTicket` is alive.
//! Dropping the ticket releases the key, so every exit path of a call
//! (including unwinding) frees it.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct InFlightGuard {
    keys: Mutex<HashSet<String>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key`, or `None` if it is already in flight.
    pub fn try_acquire(&self, key: &str) -> Option<InFlightTicket<'_>> {
        if !self.lock().insert(key.to_string()) {
            return None;
        }
        Some(InFlightTicket {
            guard: self,
            key: key.to_string(),
        })
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The set is only touched by insert/remove, so a poisoned lock still
    // holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct InFlightTicket<'a> {
    guard: &'a InFlightGuard,
    key: String,
}

impl InFlightTicket<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.guard.lock().remove(&self.key);
    }
}
