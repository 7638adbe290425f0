//! The ideal dispatcher (C6): a fixed-latency FIFO reference model with
//! infinite admission bandwidth (§4.4).
//!
//! Every transaction kind — plain or CiM — is treated uniformly: admitted
//! unconditionally, fires exactly one host callback after a fixed latency.
//! This dispatcher does not model CiM's read/compute/write staging; it
//! exists as the simplest possible implementation of the shared capability
//! set, for baselining and for tests that don't care about timing detail.

use std::collections::VecDeque;

use memsim_core::{Callbacks, Cycle, MemorySystem, Transaction};

struct Entry {
    key: u64,
    is_write: bool,
    added_cycle: Cycle,
}

/// Fixed-latency, unbounded-admission reference dispatcher (§4.4).
pub struct IdealDispatcher {
    latency: u64,
    clk: Cycle,
    buffer: VecDeque<Entry>,
    callbacks: Callbacks,
    completed_reads: u64,
    completed_writes: u64,
}

impl IdealDispatcher {
    #[must_use]
    pub fn new(latency: u64) -> Self {
        memsim_core::record_dispatcher_construction(1);
        Self {
            latency,
            clk: Cycle::ZERO,
            buffer: VecDeque::new(),
            callbacks: Callbacks::default(),
            completed_reads: 0,
            completed_writes: 0,
        }
    }
}

impl MemorySystem for IdealDispatcher {
    fn will_accept_addr(&self, _addr: u64, _is_write: bool) -> bool {
        true
    }

    fn add_addr(&mut self, addr: u64, is_write: bool) -> bool {
        self.buffer.push_back(Entry {
            key: addr,
            is_write,
            added_cycle: self.clk,
        });
        true
    }

    fn will_accept(&self, _t: &Transaction) -> bool {
        true
    }

    fn add(&mut self, t: Transaction) -> bool {
        self.add_addr(t.addr, t.is_write())
    }

    fn tick(&mut self) {
        let clk = self.clk;
        let latency = self.latency;
        // Safe-erase: retain() visits every entry once and fires the
        // callback for any whose latency has elapsed, without disturbing
        // FIFO order among the entries that remain (§4.4).
        let callbacks = &mut self.callbacks;
        let completed_reads = &mut self.completed_reads;
        let completed_writes = &mut self.completed_writes;
        self.buffer.retain(|e| {
            if clk.get() - e.added_cycle.get() < latency {
                return true;
            }
            if e.is_write {
                *completed_writes += 1;
                (callbacks.on_write)(e.key);
            } else {
                *completed_reads += 1;
                (callbacks.on_read)(e.key);
            }
            false
        });
        self.clk += 1;
    }

    fn register_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    fn print_stats(&self) {
        log::info!(
            "ideal stats: reads={} writes={} in_flight={}",
            self.completed_reads,
            self.completed_writes,
            self.buffer.len()
        );
    }

    fn reset_stats(&mut self) {
        self.completed_reads = 0;
        self.completed_writes = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn track() -> (Callbacks, Rc<RefCell<Vec<u64>>>, Rc<RefCell<Vec<u64>>>) {
        let reads = Rc::new(RefCell::new(Vec::new()));
        let writes = Rc::new(RefCell::new(Vec::new()));
        let r = reads.clone();
        let w = writes.clone();
        (
            Callbacks::new(move |addr| r.borrow_mut().push(addr), move |addr| w.borrow_mut().push(addr)),
            reads,
            writes,
        )
    }

    #[test]
    fn accepts_unconditionally() {
        let d = IdealDispatcher::new(5);
        assert!(d.will_accept_addr(0xAA, false));
        assert!(d.will_accept_addr(0xAA, true));
    }

    #[test]
    fn fires_read_callback_after_latency() {
        let mut d = IdealDispatcher::new(3);
        let (cb, reads, writes) = track();
        d.register_callbacks(cb);
        d.add_addr(0x40, false);
        for _ in 0..2 {
            d.tick();
        }
        assert!(reads.borrow().is_empty());
        d.tick();
        assert!(reads.borrow().is_empty());
        d.tick();
        assert_eq!(*reads.borrow(), vec![0x40]);
        assert!(writes.borrow().is_empty());
    }

    #[test]
    fn completion_order_matches_arrival_order() {
        let mut d = IdealDispatcher::new(2);
        let (cb, reads, _writes) = track();
        d.register_callbacks(cb);
        d.add_addr(1, false);
        d.tick();
        d.add_addr(2, false);
        for _ in 0..3 {
            d.tick();
        }
        assert_eq!(*reads.borrow(), vec![1, 2]);
    }
}
