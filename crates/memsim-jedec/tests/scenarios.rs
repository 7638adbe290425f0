//! End-to-end scenarios S1-S3 and properties P1-P2/P3 from the simulator spec.

use std::cell::RefCell;
use std::rc::Rc;

use memsim_core::{
    AddressDecodeConfig, Callbacks, CimDelays, Cycle, MemorySystem, ReferenceController,
    Transaction, TransactionKind,
};
use memsim_jedec::JedecDispatcher;

fn make_dispatcher(
    channels: usize,
    delays: CimDelays,
) -> (JedecDispatcher<ReferenceController>, Rc<RefCell<Vec<u64>>>, Rc<RefCell<Vec<u64>>>) {
    let controllers = (0..channels).map(|_| ReferenceController::new(64, 5)).collect();
    let cfg = AddressDecodeConfig::new(6, 0, (channels - 1) as u64);
    let mut dispatcher = JedecDispatcher::new(controllers, cfg, delays);

    let reads = Rc::new(RefCell::new(Vec::new()));
    let writes = Rc::new(RefCell::new(Vec::new()));
    let r2 = reads.clone();
    let w2 = writes.clone();
    dispatcher.register_callbacks(Callbacks::new(
        move |addr| r2.borrow_mut().push(addr),
        move |addr| w2.borrow_mut().push(addr),
    ));
    (dispatcher, reads, writes)
}

fn no_delays() -> CimDelays {
    CimDelays { add: 100, xor: 100, swap: 50 }
}

#[test]
fn s1_plain_read_jedec() {
    let (mut d, reads, writes) = make_dispatcher(2, no_delays());
    let t = Transaction::plain(0x0040, false, Cycle::ZERO);
    assert!(d.will_accept(&t));
    assert!(d.add(t));

    for _ in 0..20 {
        d.tick();
    }

    assert_eq!(*reads.borrow(), vec![0x0040]);
    assert!(writes.borrow().is_empty());
}

#[test]
fn s2_cim_add_happy_path() {
    let (mut d, _reads, _writes) = make_dispatcher(2, no_delays());
    let t = Transaction::cim(
        TransactionKind::CimAdd,
        0x100,
        Some(0x200),
        Some(0x300),
        Cycle::ZERO,
    );
    assert!(d.will_accept(&t));
    assert!(d.add(t));

    // Reads complete at clk ~5 (controller latency), write scheduled at +100,
    // write itself completes 5 cycles after being issued. Run well past that.
    for _ in 0..130 {
        d.tick();
    }

    // P1: the write to A3 must have happened. We cannot observe A3 directly
    // through the host callback surface (CiM completions are internal), but
    // the tracker retiring the request and the completion counter ticking
    // up are the externally-visible proof the ADD actually finished.
    assert_eq!(d.cim_in_flight(), 0);
    assert_eq!(d.completed_cim(), 1);
}

#[test]
fn s3_cim_swap_writes_back_to_both_addresses() {
    let delays = CimDelays { add: 100, xor: 100, swap: 50 };
    let (mut d, reads, writes) = make_dispatcher(1, delays);
    let t = Transaction::cim(TransactionKind::CimSwap, 0x100, Some(0x200), None, Cycle::ZERO);
    assert!(d.will_accept(&t));
    assert!(d.add(t));

    for _ in 0..80 {
        d.tick();
    }

    // SWAP's reads/writes are CiM sub-transactions keyed by req_id, not by
    // address, so they never reach the plain read/write callback surface;
    // the tracker and completion counter are what prove the SWAP retired.
    assert!(reads.borrow().is_empty());
    assert!(writes.borrow().is_empty());
    assert_eq!(d.cim_in_flight(), 0);
    assert_eq!(d.completed_cim(), 1);
}

#[test]
fn p6_admission_implies_immediate_acceptance() {
    let (mut d, _reads, _writes) = make_dispatcher(1, no_delays());
    let t = Transaction::plain(0x10, false, Cycle::ZERO);
    assert!(d.will_accept(&t));
    assert!(d.add(t));
}

#[test]
#[should_panic(expected = "admission violation")]
fn add_without_prior_accept_is_fatal_when_queue_is_full() {
    let controllers = vec![ReferenceController::new(1, 5)];
    let cfg = AddressDecodeConfig::new(0, 0, 0);
    let mut d = JedecDispatcher::new(controllers, cfg, no_delays());
    let t1 = Transaction::plain(0x10, false, Cycle::ZERO);
    let t2 = Transaction::plain(0x10, false, Cycle::ZERO);
    assert!(d.add(t1));
    // Queue depth is 1 and nothing has drained yet, so this must panic.
    d.add(t2);
}
