// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [Lamport logical clock](https://lamport.azurewebsites.net/pubs/time-clocks.pdf):
//! a monotonic counter advanced on local events and on message receipt so
//! that causally related events always carry increasing timestamps.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe Lamport clock. Every operation is lock-free: callers never
/// block behind each other just to read or advance the timestamp.
#[derive(Debug, Default)]
pub struct LamportClock {
    ts: AtomicU64,
}

impl LamportClock {
    /// Starts a clock at `0`.
    pub fn new() -> Self {
        Self {
            ts: AtomicU64::new(0),
        }
    }

    /// Local event: advances the clock by one and returns the new value.
    pub fn tick(&self) -> u64 {
        self.ts.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Remote event: folds in a timestamp observed from a peer message.
    /// Sets `ts := max(ts, incoming) + 1` and returns the new value.
    pub fn observe(&self, incoming: u64) -> u64 {
        let mut current = self.ts.load(Ordering::SeqCst);
        loop {
            let next = current.max(incoming) + 1;
            match self
                .ts
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Current value without advancing the clock.
    pub fn read(&self) -> u64 {
        self.ts.load(Ordering::SeqCst)
    }
}

impl fmt::Display for LamportClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.read())
    }
}
