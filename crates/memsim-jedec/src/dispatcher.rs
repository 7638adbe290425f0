//! JEDEC dispatcher (C4): plain R/W routed to a single controller, CiM
//! ADD/XOR/SWAP decomposed into staged read/compute/write sub-transactions.

use memsim_core::{
    decode_channel, AddressDecodeConfig, Callbacks, CimDelays, CompletionKind, Controller, Cycle,
    MemorySystem, Transaction, TransactionKind,
};

use crate::tracker::{CimOp, CimTracker, Phase, WriteTarget};

/// Routes plain reads/writes to a single channel controller and decomposes
/// CiM ADD/XOR/SWAP into ordered read/compute/write sub-transactions.
pub struct JedecDispatcher<C: Controller> {
    controllers: Vec<C>,
    addr_cfg: AddressDecodeConfig,
    delays: CimDelays,
    clk: Cycle,
    next_req_id: u64,
    tracker: CimTracker,
    callbacks: Callbacks,
    completed_reads: u64,
    completed_writes: u64,
    completed_cim: u64,
}

impl<C: Controller> JedecDispatcher<C> {
    #[must_use]
    pub fn new(controllers: Vec<C>, addr_cfg: AddressDecodeConfig, delays: CimDelays) -> Self {
        memsim_core::record_dispatcher_construction(controllers.len() as u64);
        Self {
            controllers,
            addr_cfg,
            delays,
            clk: Cycle::ZERO,
            next_req_id: 0,
            tracker: CimTracker::default(),
            callbacks: Callbacks::default(),
            completed_reads: 0,
            completed_writes: 0,
            completed_cim: 0,
        }
    }

    fn channel_of(&self, addr: u64) -> usize {
        decode_channel(addr, self.addr_cfg) as usize
    }

    fn ctrl(&self, addr: u64) -> &C {
        &self.controllers[self.channel_of(addr)]
    }

    fn ctrl_mut(&mut self, addr: u64) -> &mut C {
        let idx = self.channel_of(addr);
        &mut self.controllers[idx]
    }

    fn delay_for(&self, op: CimOp) -> u64 {
        match op {
            CimOp::Add => self.delays.add,
            CimOp::Xor => self.delays.xor,
            CimOp::Swap => self.delays.swap,
        }
    }

    fn assign_req_id(&mut self) -> u64 {
        let id = self.next_req_id;
        self.next_req_id = self.next_req_id.wrapping_add(1);
        id
    }

    fn submit_add_xor(&mut self, t: &Transaction, op: CimOp) {
        let req_id = self.assign_req_id();
        let a2 = t.addr2.expect("ADD/XOR transaction missing addr2");
        let a3 = t.addr3.expect("ADD/XOR transaction missing addr3");
        self.ctrl_mut(t.addr).add(req_id, CompletionKind::Cim, self.clk);
        self.ctrl_mut(a2).add(req_id, CompletionKind::Cim, self.clk);
        self.tracker.start(req_id, op, WriteTarget::Single(a3), self.clk);
    }

    fn submit_swap(&mut self, t: &Transaction) {
        let req_id = self.assign_req_id();
        let a2 = t.addr2.expect("SWAP transaction missing addr2");
        self.ctrl_mut(t.addr).add(req_id, CompletionKind::Cim, self.clk);
        self.ctrl_mut(a2).add(req_id, CompletionKind::Cim, self.clk);
        self.tracker
            .start(req_id, CimOp::Swap, WriteTarget::Pair(t.addr, a2), self.clk);
    }

    /// §4.2 "Deferred issuer (each tick, before controller ClockTick)".
    fn run_deferred_issuer(&mut self) {
        for (req_id, op, target) in self.tracker.due_at(self.clk) {
            let _ = op;
            match target {
                WriteTarget::Single(a3) => {
                    self.ctrl_mut(a3).add(req_id, CompletionKind::Cim, self.clk);
                }
                WriteTarget::Pair(a1, a2) => {
                    self.ctrl_mut(a1).add(req_id, CompletionKind::Cim, self.clk);
                    self.ctrl_mut(a2).add(req_id, CompletionKind::Cim, self.clk);
                }
            }
        }
    }

    /// §4.2 "Completion pump (each tick, per controller)".
    fn run_completion_pump(&mut self) {
        let clk = self.clk;
        for idx in 0..self.controllers.len() {
            loop {
                let Some((key, kind)) = self.controllers[idx].return_done(clk) else {
                    break;
                };
                match kind {
                    CompletionKind::Read => {
                        self.completed_reads += 1;
                        (self.callbacks.on_read)(key);
                    }
                    CompletionKind::Write => {
                        self.completed_writes += 1;
                        (self.callbacks.on_write)(key);
                    }
                    CompletionKind::Cim => match self.cim_complete(key, clk) {
                        CimOutcome::Continuing => {}
                        CimOutcome::StillPending => break,
                    },
                }
            }
        }
    }

    fn cim_complete(&mut self, req_id: u64, clk: Cycle) -> CimOutcome {
        let Some(op) = self.op_of(req_id) else {
            return CimOutcome::StillPending;
        };
        let delay = self.delay_for(op);
        match self.tracker.sub_tx_complete(req_id, clk, delay) {
            None => CimOutcome::StillPending,
            Some(Phase::ReadsDone { .. }) => CimOutcome::Continuing,
            Some(Phase::WritesDone { op, start_clk, end_clk }) => {
                self.completed_cim += 1;
                log::info!(
                    "req_id: {req_id}, type: {}, start: {}, end: {}, cycles: {}",
                    op.label(),
                    start_clk.get(),
                    end_clk.get(),
                    end_clk.get() - start_clk.get()
                );
                self.tracker.finish(req_id);
                CimOutcome::Continuing
            }
        }
    }

    fn op_of(&self, req_id: u64) -> Option<CimOp> {
        self.tracker.op_of(req_id)
    }

    /// Number of CiM operations whose read and/or write phase is still in
    /// flight. Zero means every submitted CiM operation has retired.
    #[must_use]
    pub fn cim_in_flight(&self) -> usize {
        self.tracker.in_flight()
    }

    /// Total CiM operations that have reached their terminal write phase.
    #[must_use]
    pub fn completed_cim(&self) -> u64 {
        self.completed_cim
    }
}

enum CimOutcome {
    Continuing,
    StillPending,
}

impl<C: Controller> MemorySystem for JedecDispatcher<C> {
    fn will_accept_addr(&self, addr: u64, is_write: bool) -> bool {
        self.ctrl(addr).will_accept(is_write)
    }

    fn add_addr(&mut self, addr: u64, is_write: bool) -> bool {
        if !self.will_accept_addr(addr, is_write) {
            let err = memsim_core::Error::AdmissionViolation { addr, cycle: self.clk.get() };
            panic!("{err}");
        }
        self.ctrl_mut(addr).add(
            addr,
            if is_write {
                CompletionKind::Write
            } else {
                CompletionKind::Read
            },
            self.clk,
        )
    }

    fn will_accept(&self, t: &Transaction) -> bool {
        match t.kind {
            TransactionKind::Read => self.ctrl(t.addr).will_accept(false),
            TransactionKind::Write => self.ctrl(t.addr).will_accept(true),
            TransactionKind::CimAdd | TransactionKind::CimXor => {
                let a2 = t.addr2.expect("ADD/XOR missing addr2");
                let a3 = t.addr3.expect("ADD/XOR missing addr3");
                self.ctrl(t.addr).will_accept(false)
                    && self.ctrl(a2).will_accept(false)
                    && self.ctrl(a3).will_accept(true)
            }
            TransactionKind::CimSwap => {
                let a2 = t.addr2.expect("SWAP missing addr2");
                self.ctrl(t.addr).will_accept(false)
                    && self.ctrl(t.addr).will_accept(true)
                    && self.ctrl(a2).will_accept(false)
                    && self.ctrl(a2).will_accept(true)
            }
            TransactionKind::CimFetch => self.ctrl(t.addr).will_accept(false),
            TransactionKind::CimStore => self.ctrl(t.addr).will_accept(true),
        }
    }

    fn add(&mut self, t: Transaction) -> bool {
        if !self.will_accept(&t) {
            let err = memsim_core::Error::AdmissionViolation { addr: t.addr, cycle: self.clk.get() };
            panic!("{err}");
        }
        match t.kind {
            TransactionKind::Read | TransactionKind::Write => {
                self.add_addr(t.addr, t.kind.is_write())
            }
            TransactionKind::CimAdd => {
                self.submit_add_xor(&t, CimOp::Add);
                true
            }
            TransactionKind::CimXor => {
                self.submit_add_xor(&t, CimOp::Xor);
                true
            }
            TransactionKind::CimSwap => {
                self.submit_swap(&t);
                true
            }
            TransactionKind::CimFetch | TransactionKind::CimStore => {
                self.add_addr(t.addr, t.kind.is_write())
            }
        }
    }

    fn tick(&mut self) {
        self.run_completion_pump();
        self.run_deferred_issuer();
        let clk = self.clk;
        for c in &mut self.controllers {
            c.clock_tick(clk);
        }
        self.clk += 1;
    }

    fn register_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    fn print_stats(&self) {
        log::info!(
            "jedec stats: reads={} writes={} cim_complete={} cim_in_flight={}",
            self.completed_reads,
            self.completed_writes,
            self.completed_cim,
            self.tracker.in_flight()
        );
    }

    fn reset_stats(&mut self) {
        self.completed_reads = 0;
        self.completed_writes = 0;
        self.completed_cim = 0;
    }
}
