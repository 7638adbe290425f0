//! HMC dispatcher (C5): two-level link/quad/vault crossbar with age-based
//! arbitration and a dual-clock-domain bridge (§4.3).

use std::collections::{HashMap, VecDeque};

use memsim_core::{
    decode_channel, AddressDecodeConfig, Callbacks, CompletionKind, Controller, Cycle, HmcConfig,
    HmcReqKind, HmcRequest, HmcRespKind, HmcResponse, MemorySystem, Transaction,
};

use crate::age_queue::build_age_queue;
use crate::cim::{CimTracker, Outcome};

const PS_PER_DRAM: u64 = 800;

/// Derive the logic-domain tick period from link width/speed, clamped to
/// never exceed the DRAM-domain period (§3 "picosecond accumulators").
///
/// Rounds to the nearest picosecond rather than truncating: e.g.
/// `link_speed=30000`, `link_width=16` gives a logic period of 267ps (not
/// 266), which is what makes `logic_clk` advance exactly 3 times per
/// 800ps DRAM tick (§8 S6) instead of 4.
fn derive_ps_per_logic(link_width: u32, link_speed_mhz: u64) -> u64 {
    let link_cycles_per_flit = (128 / link_width.max(1)).max(1);
    let logic_speed_mhz = (link_speed_mhz / u64::from(link_cycles_per_flit)).max(1);
    ((1_000_000 + logic_speed_mhz / 2) / logic_speed_mhz).clamp(1, PS_PER_DRAM)
}

struct QueuedRequest {
    id: u64,
    packet: HmcRequest,
}

fn fires_read_callback(kind: HmcRespKind) -> bool {
    matches!(kind, HmcRespKind::RdRs | HmcRespKind::CimFetchRs)
}

/// The HMC dispatcher. `vaults` is one [`Controller`] per vault; quad count
/// is fixed at 4 (`quad = vault % 4`, §3).
pub struct HmcDispatcher<C: Controller> {
    vaults: Vec<C>,
    vault_cfg: AddressDecodeConfig,
    num_links: usize,
    queue_depth: usize,
    xbar_bandwidth: u32,
    block_size: u32,

    link_req_q: Vec<VecDeque<QueuedRequest>>,
    link_resp_q: Vec<VecDeque<HmcResponse>>,
    quad_req_q: [VecDeque<QueuedRequest>; 4],
    quad_resp_q: [VecDeque<HmcResponse>; 4],

    link_busy: Vec<u32>,
    quad_busy: [u32; 4],
    link_age: Vec<u32>,
    quad_age: [u32; 4],
    next_link: usize,

    resp_lookup: HashMap<u64, HmcResponse>,
    cim: CimTracker,
    next_id: u64,

    dram_clk: Cycle,
    logic_clk: Cycle,
    clk_dram_ps: u64,
    clk_logic_ps: u64,
    ps_per_dram: u64,
    ps_per_logic: u64,

    callbacks: Callbacks,
    completed_reads: u64,
    completed_writes: u64,
    completed_cim: u64,
}

impl<C: Controller> HmcDispatcher<C> {
    #[must_use]
    pub fn new(vaults: Vec<C>, vault_cfg: AddressDecodeConfig, cfg: &HmcConfig) -> Self {
        memsim_core::record_dispatcher_construction(vaults.len() as u64);
        let num_links = cfg.num_links;
        let ps_per_logic = derive_ps_per_logic(cfg.link_width, cfg.link_speed_mhz);
        Self {
            vaults,
            vault_cfg,
            num_links,
            queue_depth: cfg.xbar_queue_depth,
            xbar_bandwidth: 2,
            block_size: cfg.block_size.0,
            link_req_q: (0..num_links).map(|_| VecDeque::new()).collect(),
            link_resp_q: (0..num_links).map(|_| VecDeque::new()).collect(),
            quad_req_q: Default::default(),
            quad_resp_q: Default::default(),
            link_busy: vec![0; num_links],
            quad_busy: [0; 4],
            link_age: vec![0; num_links],
            quad_age: [0; 4],
            next_link: 0,
            resp_lookup: HashMap::new(),
            cim: CimTracker::default(),
            next_id: 0,
            dram_clk: Cycle::ZERO,
            logic_clk: Cycle::ZERO,
            clk_dram_ps: 0,
            clk_logic_ps: 0,
            ps_per_dram: PS_PER_DRAM,
            ps_per_logic,
            callbacks: Callbacks::default(),
            completed_reads: 0,
            completed_writes: 0,
            completed_cim: 0,
        }
    }

    fn vault_of(&self, addr: u64) -> usize {
        decode_channel(addr, self.vault_cfg) as usize % self.vaults.len().max(1)
    }

    /// The logic-domain cycle counter (§3, §8 S6). Exposed for scenario
    /// tests that assert on the dual-clock advance ratio.
    #[must_use]
    pub fn logic_clk(&self) -> u64 {
        self.logic_clk.get()
    }

    /// The round-robin link-selection pointer used by [`Self::submit`]
    /// (§4.3 "Submission"). Exposed for scenario tests that assert on
    /// round-robin link assignment order.
    #[must_use]
    pub fn next_link(&self) -> usize {
        self.next_link
    }

    fn assign_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn find_link_with_room(&self) -> Option<usize> {
        (0..self.num_links)
            .map(|step| (self.next_link + step) % self.num_links)
            .find(|&l| self.link_req_q[l].len() < self.queue_depth)
    }

    fn submit(&mut self, t: &Transaction) -> bool {
        let Some(link) = self.find_link_with_room() else {
            return false;
        };
        let id = self.assign_id();
        let vault = self.vault_of(t.addr);
        let kind = if t.kind.is_cim() {
            HmcReqKind::from_cim(t.kind)
        } else {
            HmcReqKind::for_block_size(self.block_size, t.kind.is_write())
        };
        let packet = HmcRequest::new(kind, t.addr, t.addr2, t.addr3, vault, link);
        let resp_kind = HmcRespKind::for_request(kind, false);
        let resp = HmcResponse {
            resp_id: id,
            kind: resp_kind,
            link,
            quad: packet.quad,
            flits: resp_kind.flits_for(packet.flits),
            exit_time: Cycle::ZERO,
        };
        self.resp_lookup.insert(id, resp);
        let was_empty = self.link_req_q[link].is_empty();
        self.link_req_q[link].push_back(QueuedRequest { id, packet });
        if was_empty {
            self.link_age[link] = 1;
        }
        self.next_link = (link + 1) % self.num_links;
        true
    }

    /// §4.3 `InsertReqToDRAM`: decompose a drained packet into the vault
    /// controller sub-transactions it represents.
    fn insert_req_to_dram(&mut self, qreq: QueuedRequest) {
        let QueuedRequest { id, packet } = qreq;
        let vault = packet.vault;
        let clk = self.dram_clk;
        match packet.kind {
            HmcReqKind::CimFetch | HmcReqKind::CimStore => {
                let _ = self.vaults[vault].add(id, CompletionKind::Cim, clk);
                self.cim.start_flat(id, 1);
            }
            HmcReqKind::CimAdd | HmcReqKind::CimXor => {
                let _ = self.vaults[vault].add(id, CompletionKind::Cim, clk); // read A1
                let _ = self.vaults[vault].add(id, CompletionKind::Cim, clk); // read A2
                let _ = self.vaults[vault].add(id, CompletionKind::Cim, clk); // write A3
                self.cim.start_flat(id, 3);
            }
            HmcReqKind::CimSwap => {
                let _ = self.vaults[vault].add(id, CompletionKind::Cim, clk);
                let _ = self.vaults[vault].add(id, CompletionKind::Cim, clk);
                let a1 = packet.a1;
                let a2 = packet.a2.expect("SWAP packet missing a2");
                self.cim.start_swap(id, a1, a2);
            }
            _ => {
                let is_write = packet.kind.is_write();
                let kind = if is_write { CompletionKind::Write } else { CompletionKind::Read };
                let _ = self.vaults[vault].add(id, kind, clk);
            }
        }
    }

    fn push_quad_response(&mut self, resp: HmcResponse) {
        let q = resp.quad;
        let was_empty = self.quad_resp_q[q].is_empty();
        self.quad_resp_q[q].push_back(resp);
        if was_empty {
            self.quad_age[q] = 1;
        }
    }

    /// Pull completions off every vault controller (the "`VaultCallback`"
    /// pump, §4.3), routing ordinary responses into `resp_lookup`/quad
    /// queues and advancing CiM phase tracking.
    fn drain_vault_completions(&mut self) {
        let clk = self.dram_clk;
        for idx in 0..self.vaults.len() {
            loop {
                let Some((key, kind)) = self.vaults[idx].return_done(clk) else {
                    break;
                };
                match kind {
                    CompletionKind::Read => {
                        self.completed_reads += 1;
                        if let Some(resp) = self.resp_lookup.remove(&key) {
                            self.push_quad_response(resp);
                        }
                    }
                    CompletionKind::Write => {
                        self.completed_writes += 1;
                        if let Some(resp) = self.resp_lookup.remove(&key) {
                            self.push_quad_response(resp);
                        }
                    }
                    CompletionKind::Cim => match self.cim.complete_one(key) {
                        None => {}
                        Some(Outcome::IssueSwapWrites(_a1, _a2)) => {
                            let _ = self.vaults[idx].add(key, CompletionKind::Cim, clk);
                            let _ = self.vaults[idx].add(key, CompletionKind::Cim, clk);
                        }
                        Some(Outcome::Terminal) => {
                            self.completed_cim += 1;
                            if let Some(resp) = self.resp_lookup.remove(&key) {
                                self.push_quad_response(resp);
                            }
                        }
                    },
                }
            }
        }
    }

    /// §4.3 `DrainRequests`: quad -> vault admission, then link -> quad
    /// age-ordered movement.
    fn drain_requests(&mut self) {
        for q in 0..4 {
            let ready = self.quad_req_q[q].front().is_some_and(|head| {
                head.packet.exit_time <= self.logic_clk && self.vault_has_room(&head.packet)
            });
            if ready {
                let qreq = self.quad_req_q[q].pop_front().expect("checked front above");
                self.insert_req_to_dram(qreq);
            }
        }

        for busy in &mut self.quad_busy {
            *busy = busy.saturating_sub(self.xbar_bandwidth);
        }

        let offset = (self.logic_clk.get() % self.num_links.max(1) as u64) as usize;
        for link in build_age_queue(&self.link_age, offset) {
            let dest_quad = match self.link_req_q[link].front() {
                Some(head) => head.packet.quad,
                None => continue,
            };
            let has_room = self.quad_req_q[dest_quad].len() < self.queue_depth;
            if has_room && self.quad_busy[dest_quad] == 0 {
                let mut qreq = self.link_req_q[link].pop_front().expect("checked front above");
                self.quad_busy[dest_quad] = qreq.packet.flits;
                qreq.packet.exit_time = self.logic_clk + u64::from(qreq.packet.flits);
                self.quad_req_q[dest_quad].push_back(qreq);
                self.link_age[link] = u32::from(!self.link_req_q[link].is_empty());
            } else {
                self.link_age[link] += 1;
            }
        }
    }

    fn vault_has_room(&self, packet: &HmcRequest) -> bool {
        let (reads, writes) = packet.kind.required_accept();
        let ctrl = &self.vaults[packet.vault];
        (reads == 0 || ctrl.will_accept(false)) && (writes == 0 || ctrl.will_accept(true))
    }

    /// §4.3 `DrainResponses`: link -> host delivery, then quad -> link
    /// age-ordered movement.
    fn drain_responses(&mut self) {
        for l in 0..self.num_links {
            let ready = self.link_resp_q[l].front().is_some_and(|r| r.exit_time <= self.logic_clk);
            if ready {
                let resp = self.link_resp_q[l].pop_front().expect("checked front above");
                if fires_read_callback(resp.kind) {
                    (self.callbacks.on_read)(resp.resp_id);
                } else if resp.kind != HmcRespKind::None {
                    (self.callbacks.on_write)(resp.resp_id);
                }
            }
        }

        for busy in &mut self.link_busy {
            *busy = busy.saturating_sub(self.xbar_bandwidth);
        }

        let offset = (self.logic_clk.get() % 4) as usize;
        for quad in build_age_queue(&self.quad_age, offset) {
            let dest_link = match self.quad_resp_q[quad].front() {
                Some(head) => head.link,
                None => continue,
            };
            let has_room = self.link_resp_q[dest_link].len() < self.queue_depth;
            if has_room && self.link_busy[dest_link] == 0 {
                let mut resp = self.quad_resp_q[quad].pop_front().expect("checked front above");
                self.link_busy[dest_link] = resp.flits;
                resp.exit_time = self.logic_clk + u64::from(resp.flits);
                self.link_resp_q[dest_link].push_back(resp);
                self.quad_age[quad] = u32::from(!self.quad_resp_q[quad].is_empty());
            } else {
                self.quad_age[quad] += 1;
            }
        }
    }
}

impl<C: Controller> MemorySystem for HmcDispatcher<C> {
    fn will_accept_addr(&self, _addr: u64, _is_write: bool) -> bool {
        self.find_link_with_room().is_some()
    }

    fn add_addr(&mut self, addr: u64, is_write: bool) -> bool {
        let t = Transaction::plain(addr, is_write, self.dram_clk);
        self.submit(&t)
    }

    fn will_accept(&self, _t: &Transaction) -> bool {
        self.find_link_with_room().is_some()
    }

    fn add(&mut self, t: Transaction) -> bool {
        if !self.will_accept(&t) {
            let err = memsim_core::Error::AdmissionViolation { addr: t.addr, cycle: self.dram_clk.get() };
            panic!("{err}");
        }
        self.submit(&t)
    }

    fn tick(&mut self) {
        self.drain_vault_completions();
        for v in &mut self.vaults {
            v.clock_tick(self.dram_clk);
        }
        self.dram_clk += 1;

        self.clk_dram_ps += self.ps_per_dram;
        while self.clk_logic_ps < self.clk_dram_ps {
            self.drain_responses();
            self.drain_requests();
            self.clk_logic_ps += self.ps_per_logic;
            self.logic_clk += 1;
        }
    }

    fn register_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    fn print_stats(&self) {
        log::info!(
            "hmc stats: reads={} writes={} cim_complete={} cim_in_flight={} resp_in_flight={}",
            self.completed_reads,
            self.completed_writes,
            self.completed_cim,
            self.cim.in_flight(),
            self.resp_lookup.len()
        );
    }

    fn reset_stats(&mut self) {
        self.completed_reads = 0;
        self.completed_writes = 0;
        self.completed_cim = 0;
    }
}
