//! The CiM completion tracker (C7), owned by [`crate::JedecDispatcher`].
//!
//! Tracks, per `req_id`: how many controller completions are still expected
//! in the current phase, the write target(s) for the eventual write phase,
//! and a calendar of deferred write-phase issues keyed by absolute cycle.

use std::collections::HashMap;

use memsim_core::Cycle;

/// The CiM operation a tracked `req_id` is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CimOp {
    Add,
    Xor,
    Swap,
}

impl CimOp {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "CiM_Add",
            Self::Xor => "CiM_Xor",
            Self::Swap => "CiM_Swap",
        }
    }
}

/// Write targets recorded for a tracked `req_id`, set at submission time and
/// consumed by the deferred issuer once the read phase completes.
#[derive(Debug, Clone, Copy)]
pub enum WriteTarget {
    /// ADD/XOR: single write to `A3`.
    Single(u64),
    /// SWAP: writes to `A1` and `A2`.
    Pair(u64, u64),
}

struct Entry {
    op: CimOp,
    target: WriteTarget,
    pending_subtx: i32,
    total_callbacks: i32,
    start_clk: Cycle,
    end_clk: Option<Cycle>,
}

/// Per-request bookkeeping plus the deferred-issue calendar (§3, §4.2).
#[derive(Default)]
pub struct CimTracker {
    entries: HashMap<u64, Entry>,
    calendar: HashMap<u64, Vec<u64>>,
}

/// What the completion pump should do next for a `req_id` whose pending
/// sub-transaction count just reached zero.
pub enum Phase {
    /// Read phase just finished; schedule the write phase at `issue_at`.
    ReadsDone { issue_at: Cycle },
    /// Write phase just finished; the operation is terminal.
    WritesDone {
        op: CimOp,
        start_clk: Cycle,
        end_clk: Cycle,
    },
}

impl CimTracker {
    /// Register a newly submitted ADD/XOR/SWAP read phase (§4.2 "Submission").
    pub fn start(&mut self, req_id: u64, op: CimOp, target: WriteTarget, start_clk: Cycle) {
        self.entries.insert(
            req_id,
            Entry {
                op,
                target,
                pending_subtx: 2,
                total_callbacks: 2,
                start_clk,
                end_clk: None,
            },
        );
    }

    /// Decrement the pending sub-transaction count for `req_id`. Returns
    /// `Some(phase)` once the current phase's sub-transactions are all in.
    pub fn sub_tx_complete(&mut self, req_id: u64, clk: Cycle, delay: u64) -> Option<Phase> {
        let entry = self.entries.get_mut(&req_id)?;
        entry.pending_subtx -= 1;
        if entry.pending_subtx != 0 {
            return None;
        }
        if entry.total_callbacks == 2 {
            entry.total_callbacks = 1;
            let issue_at = clk + delay;
            self.calendar.entry(issue_at.get()).or_default().push(req_id);
            Some(Phase::ReadsDone { issue_at })
        } else {
            entry.total_callbacks = 0;
            entry.end_clk = Some(clk);
            Some(Phase::WritesDone {
                op: entry.op,
                start_clk: entry.start_clk,
                end_clk: clk,
            })
        }
    }

    /// Pop the `req_id`s whose deferred write phase is due at `clk`, along
    /// with their recorded write target, and arm `pending_subtx` for the
    /// write phase (§4.2 "Deferred issuer").
    pub fn due_at(&mut self, clk: Cycle) -> Vec<(u64, CimOp, WriteTarget)> {
        let Some(ids) = self.calendar.remove(&clk.get()) else {
            return Vec::new();
        };
        ids.into_iter()
            .filter_map(|req_id| {
                let entry = self.entries.get_mut(&req_id)?;
                entry.pending_subtx = match entry.target {
                    WriteTarget::Single(_) => 1,
                    WriteTarget::Pair(_, _) => 2,
                };
                Some((req_id, entry.op, entry.target))
            })
            .collect()
    }

    /// Remove a terminal `req_id`'s bookkeeping. Call after the operation's
    /// [`Phase::WritesDone`] has been reported.
    pub fn finish(&mut self, req_id: u64) {
        self.entries.remove(&req_id);
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }

    /// The CiM operation tracked under `req_id`, if any. Used to look up the
    /// configured compute delay before the phase transition is known.
    #[must_use]
    pub fn op_of(&self, req_id: u64) -> Option<CimOp> {
        self.entries.get(&req_id).map(|e| e.op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_schedules_write_after_both_reads() {
        let mut t = CimTracker::default();
        t.start(1, CimOp::Add, WriteTarget::Single(0x300), Cycle::new(0));
        assert!(t.sub_tx_complete(1, Cycle::new(10), 100).is_none());
        let phase = t.sub_tx_complete(1, Cycle::new(12), 100).expect("reads done");
        match phase {
            Phase::ReadsDone { issue_at } => assert_eq!(issue_at, Cycle::new(112)),
            Phase::WritesDone { .. } => panic!("expected ReadsDone"),
        }
        assert!(t.due_at(Cycle::new(111)).is_empty());
        let due = t.due_at(Cycle::new(112));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, 1);
    }

    #[test]
    fn swap_tracks_pair_target() {
        let mut t = CimTracker::default();
        t.start(7, CimOp::Swap, WriteTarget::Pair(0x100, 0x200), Cycle::new(0));
        t.sub_tx_complete(7, Cycle::new(5), 50);
        let phase = t.sub_tx_complete(7, Cycle::new(5), 50).expect("reads done");
        assert!(matches!(phase, Phase::ReadsDone { issue_at } if issue_at == Cycle::new(55)));
        let due = t.due_at(Cycle::new(55));
        assert!(matches!(due[0].2, WriteTarget::Pair(0x100, 0x200)));
    }

    #[test]
    fn write_phase_is_terminal() {
        let mut t = CimTracker::default();
        t.start(3, CimOp::Xor, WriteTarget::Single(0x9), Cycle::new(0));
        t.sub_tx_complete(3, Cycle::new(1), 0);
        t.sub_tx_complete(3, Cycle::new(1), 0);
        t.due_at(Cycle::new(1));
        let phase = t.sub_tx_complete(3, Cycle::new(1), 0).expect("writes done");
        assert!(matches!(phase, Phase::WritesDone { end_clk, .. } if end_clk == Cycle::new(1)));
        t.finish(3);
        assert_eq!(t.in_flight(), 0);
    }
}
