//! Host-facing transaction model (§3 "Transaction (host-facing)").

use crate::cycle::Cycle;

/// The operation a [`Transaction`] performs. Exactly one kind is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Read,
    Write,
    CimFetch,
    CimStore,
    CimAdd,
    CimXor,
    CimSwap,
}

impl TransactionKind {
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::CimStore)
    }

    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::CimFetch)
    }

    #[must_use]
    pub const fn is_cim(self) -> bool {
        !matches!(self, Self::Read | Self::Write)
    }

    /// Whether this kind carries a second address (`A2`).
    #[must_use]
    pub const fn has_addr2(self) -> bool {
        matches!(self, Self::CimAdd | Self::CimXor | Self::CimSwap)
    }

    /// Whether this kind carries a third address (`A3`).
    #[must_use]
    pub const fn has_addr3(self) -> bool {
        matches!(self, Self::CimAdd | Self::CimXor)
    }
}

/// A host-facing memory transaction.
///
/// Invariant: `addr2` is `Some` iff `kind.has_addr2()`; `addr3` is `Some` iff
/// `kind.has_addr3()`. `req_id` is assigned by whichever dispatcher admits
/// the transaction (plain R/W dispatched to a single controller never need
/// one, but CiM operations always do); it starts `None` and is filled in on
/// admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub addr: u64,
    pub addr2: Option<u64>,
    pub addr3: Option<u64>,
    pub req_id: Option<u64>,
    pub added_cycle: Cycle,
    pub complete_cycle: Option<Cycle>,
}

impl Transaction {
    /// Construct a plain read or write.
    #[must_use]
    pub fn plain(addr: u64, is_write: bool, added_cycle: Cycle) -> Self {
        Self {
            kind: if is_write {
                TransactionKind::Write
            } else {
                TransactionKind::Read
            },
            addr,
            addr2: None,
            addr3: None,
            req_id: None,
            added_cycle,
            complete_cycle: None,
        }
    }

    /// Construct a CiM transaction, validating the address-arity invariant
    /// for the given `kind`.
    ///
    /// # Panics
    /// Panics if `addr2`/`addr3` are present/absent inconsistently with
    /// `kind` — this is a programming error in the caller, not a runtime
    /// condition a host can trigger through the public API.
    #[must_use]
    pub fn cim(
        kind: TransactionKind,
        addr: u64,
        addr2: Option<u64>,
        addr3: Option<u64>,
        added_cycle: Cycle,
    ) -> Self {
        assert_eq!(addr2.is_some(), kind.has_addr2(), "addr2 arity mismatch for {kind:?}");
        assert_eq!(addr3.is_some(), kind.has_addr3(), "addr3 arity mismatch for {kind:?}");
        Self {
            kind,
            addr,
            addr2,
            addr3,
            req_id: None,
            added_cycle,
            complete_cycle: None,
        }
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        self.kind.is_write()
    }

    #[must_use]
    pub const fn is_posted_write(&self) -> bool {
        // Plain writes in this model are always acknowledged; only the HMC
        // posted-write request subtypes (§6 flit table, P_WR*) are posted,
        // and those live entirely inside memsim-hmc's request decomposition.
        false
    }
}
