//! CiM sub-transaction tracking inside the HMC path (§4.3 `InsertReqToDRAM`,
//! `VaultCallback`).
//!
//! Unlike the JEDEC tracker, there is no configured compute delay here: a
//! SWAP's write phase is issued the instant both reads complete. ADD/XOR/
//! FETCH/STORE need no phase tracking at all — they're submitted as their
//! full set of vault sub-transactions up front and are terminal once that
//! count of completions comes back.

use std::collections::HashMap;

struct Entry {
    remaining: u32,
    swap_write_phase: Option<(u64, u64)>,
}

#[derive(Default)]
pub struct CimTracker {
    entries: HashMap<u64, Entry>,
}

/// What the vault-completion pump should do next for an `id` whose
/// remaining sub-transaction count just reached zero.
pub enum Outcome {
    /// A SWAP's read phase just finished; issue writes to these addresses.
    IssueSwapWrites(u64, u64),
    /// The operation is fully complete; push its response packet.
    Terminal,
}

impl CimTracker {
    /// ADD/XOR/FETCH/STORE: `count` vault sub-transactions submitted up front.
    pub fn start_flat(&mut self, id: u64, count: u32) {
        self.entries.insert(id, Entry { remaining: count, swap_write_phase: None });
    }

    /// SWAP: two reads submitted now; `a1`/`a2` are the write-back targets.
    pub fn start_swap(&mut self, id: u64, a1: u64, a2: u64) {
        self.entries.insert(
            id,
            Entry { remaining: 2, swap_write_phase: Some((a1, a2)) },
        );
    }

    /// Decrement the outstanding count for `id`. Returns `None` while
    /// sub-transactions are still pending.
    pub fn complete_one(&mut self, id: u64) -> Option<Outcome> {
        let entry = self.entries.get_mut(&id)?;
        entry.remaining -= 1;
        if entry.remaining != 0 {
            return None;
        }
        if let Some((a1, a2)) = entry.swap_write_phase.take() {
            entry.remaining = 2;
            Some(Outcome::IssueSwapWrites(a1, a2))
        } else {
            self.entries.remove(&id);
            Some(Outcome::Terminal)
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_op_terminates_after_count_completions() {
        let mut t = CimTracker::default();
        t.start_flat(1, 3);
        assert!(t.complete_one(1).is_none());
        assert!(t.complete_one(1).is_none());
        assert!(matches!(t.complete_one(1), Some(Outcome::Terminal)));
    }

    #[test]
    fn swap_issues_writes_then_terminates() {
        let mut t = CimTracker::default();
        t.start_swap(7, 0x10, 0x20);
        assert!(t.complete_one(7).is_none());
        match t.complete_one(7) {
            Some(Outcome::IssueSwapWrites(a, b)) => {
                assert_eq!((a, b), (0x10, 0x20));
            }
            _ => panic!("expected IssueSwapWrites"),
        }
        assert!(t.complete_one(7).is_none());
        assert!(matches!(t.complete_one(7), Some(Outcome::Terminal)));
        assert_eq!(t.in_flight(), 0);
    }
}
