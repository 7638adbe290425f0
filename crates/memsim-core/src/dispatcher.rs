//! The host-facing dispatcher capability set (§6 "Host API", §9 "Polymorphic dispatcher").
//!
//! JEDEC, HMC, and Ideal dispatchers each have distinct internal state, so
//! this is modeled as a single shared trait with dynamic dispatch at the
//! host boundary rather than a class hierarchy (§9).

use crate::transaction::Transaction;

/// Host read/write completion callbacks (C9).
///
/// A plain `fn(u64)` pair would match the spec's literal signature, but it
/// can't capture host state (a running total, a log sink); a boxed closure
/// is the natural Rust shape for "the host supplies two completion
/// handlers" and is what every dispatcher variant stores.
pub struct Callbacks {
    pub on_read: Box<dyn FnMut(u64)>,
    pub on_write: Box<dyn FnMut(u64)>,
}

impl Callbacks {
    #[must_use]
    pub fn new(on_read: impl FnMut(u64) + 'static, on_write: impl FnMut(u64) + 'static) -> Self {
        Self {
            on_read: Box::new(on_read),
            on_write: Box::new(on_write),
        }
    }
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::new(|_| {}, |_| {})
    }
}

/// The capability set shared by every dispatcher variant (§6, §9).
pub trait MemorySystem {
    /// `willAccept(addr, isWrite)`.
    fn will_accept_addr(&self, addr: u64, is_write: bool) -> bool;

    /// `add(addr, isWrite)`.
    fn add_addr(&mut self, addr: u64, is_write: bool) -> bool;

    /// `willAccept(Transaction)` — covers plain and CiM transactions alike.
    fn will_accept(&self, t: &Transaction) -> bool;

    /// `add(Transaction)`.
    fn add(&mut self, t: Transaction) -> bool;

    /// `tick()` — advance by exactly one dispatcher clock cycle.
    fn tick(&mut self);

    fn register_callbacks(&mut self, callbacks: Callbacks);

    fn print_stats(&self);

    fn reset_stats(&mut self);
}
