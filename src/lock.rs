//! Bus arbitration between display instances
//!
//! Several displays may share a data line, so only one instance at a time may
//! toggle pins. [`BusLock`] records which instance (by oid) currently owns the
//! bus. It is not fair: a loser backs off by rescheduling its timer and tries
//! again later.
//!
//! ```
//! use tm1637::BusLock;
//!
//! static BUS: BusLock = BusLock::new();
//!
//! assert!(BUS.try_acquire(0));
//! assert!(BUS.try_acquire(0));
//! assert!(!BUS.try_acquire(1));
//! BUS.release();
//! assert!(BUS.try_acquire(1));
//! ```

use portable_atomic::{AtomicU16, Ordering};

/// No instance holds the bus
const UNHELD: u16 = u16::MAX;

/// Exclusive bus token shared by every instance
#[derive(Debug)]
pub struct BusLock {
    holder: AtomicU16,
}

impl BusLock {
    /// Create an unheld lock
    pub const fn new() -> Self {
        Self {
            holder: AtomicU16::new(UNHELD),
        }
    }

    /// Take the bus for `oid`
    ///
    /// Succeeds if the bus is free or already held by `oid`.
    pub fn try_acquire(&self, oid: u8) -> bool {
        let oid = u16::from(oid);
        match self
            .holder
            .compare_exchange(UNHELD, oid, Ordering::Acquire, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == oid,
        }
    }

    /// Free the bus, whoever holds it
    pub fn release(&self) {
        self.holder.store(UNHELD, Ordering::Release);
    }

    /// Oid currently holding the bus
    pub fn holder(&self) -> Option<u8> {
        match self.holder.load(Ordering::Acquire) {
            UNHELD => None,
            oid => Some(oid as u8),
        }
    }
}

impl Default for BusLock {
    fn default() -> Self {
        Self::new()
    }
}
