//! Process-wide informational state (§9 "Global process state").
//!
//! `TOTAL_CHANNELS` mirrors the reference implementation's static
//! `total_channels_` counter: incremented once per dispatcher instance at
//! construction, read only for reporting, never decremented, and never
//! consulted for correctness.

use std::sync::atomic::{AtomicU64, Ordering};

static TOTAL_CHANNELS: AtomicU64 = AtomicU64::new(0);

/// Record that a new dispatcher instance with `channels` channels/vaults was
/// constructed. Call once per instance, at construction.
pub fn record_dispatcher_construction(channels: u64) {
    TOTAL_CHANNELS.fetch_add(channels, Ordering::Relaxed);
}

/// The process-wide running total of channels/vaults across every
/// dispatcher instance constructed so far. Informational only.
#[must_use]
pub fn total_channels() -> u64 {
    TOTAL_CHANNELS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_instances() {
        let before = total_channels();
        record_dispatcher_construction(4);
        record_dispatcher_construction(2);
        assert_eq!(total_channels(), before + 6);
    }
}
