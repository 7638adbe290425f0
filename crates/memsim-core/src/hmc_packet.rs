//! HMC request/response packet types and the flit-count tables (§3, §6).

use crate::cycle::Cycle;
use crate::transaction::TransactionKind;

/// The wire-level request kind carried by an [`HmcRequest`].
///
/// Plain reads/writes are tagged with the variant selected by the
/// configured `block_size` (§6); CiM requests carry their own dedicated
/// kinds regardless of block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HmcReqKind {
    Rd0,
    Rd16,
    Rd32,
    Rd48,
    Rd64,
    Rd80,
    Rd96,
    Rd112,
    Rd128,
    Rd256,
    Wr0,
    Wr16,
    Wr32,
    Wr48,
    Wr64,
    Wr80,
    Wr96,
    Wr112,
    Wr128,
    Wr256,
    CimFetch,
    CimStore,
    CimAdd,
    CimXor,
    CimSwap,
}

impl HmcReqKind {
    /// Pick the plain-request wire kind for a given block size (§6 `block_size`).
    #[must_use]
    pub fn for_block_size(block_size: u32, is_write: bool) -> Self {
        match (block_size, is_write) {
            (0, false) => Self::Rd0,
            (0, true) => Self::Wr0,
            (16, false) => Self::Rd16,
            (16, true) => Self::Wr16,
            (32, false) => Self::Rd32,
            (32, true) => Self::Wr32,
            (48, false) => Self::Rd48,
            (48, true) => Self::Wr48,
            (64, false) => Self::Rd64,
            (64, true) => Self::Wr64,
            (80, false) => Self::Rd80,
            (80, true) => Self::Wr80,
            (96, false) => Self::Rd96,
            (96, true) => Self::Wr96,
            (112, false) => Self::Rd112,
            (112, true) => Self::Wr112,
            (128, false) => Self::Rd128,
            (128, true) => Self::Wr128,
            (256, false) => Self::Rd256,
            (256, true) => Self::Wr256,
            _ => if is_write { Self::Wr64 } else { Self::Rd64 },
        }
    }

    #[must_use]
    pub fn from_cim(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::CimFetch => Self::CimFetch,
            TransactionKind::CimStore => Self::CimStore,
            TransactionKind::CimAdd => Self::CimAdd,
            TransactionKind::CimXor => Self::CimXor,
            TransactionKind::CimSwap => Self::CimSwap,
            TransactionKind::Read | TransactionKind::Write => {
                unreachable!("from_cim called with a non-CiM transaction kind")
            }
        }
    }

    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            Self::Rd0
                | Self::Rd16
                | Self::Rd32
                | Self::Rd48
                | Self::Rd64
                | Self::Rd80
                | Self::Rd96
                | Self::Rd112
                | Self::Rd128
                | Self::Rd256
                | Self::CimFetch
        )
    }

    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Self::Wr0
                | Self::Wr16
                | Self::Wr32
                | Self::Wr48
                | Self::Wr64
                | Self::Wr80
                | Self::Wr96
                | Self::Wr112
                | Self::Wr128
                | Self::Wr256
                | Self::CimStore
        )
    }

    #[must_use]
    pub const fn is_cim(self) -> bool {
        matches!(
            self,
            Self::CimFetch | Self::CimStore | Self::CimAdd | Self::CimXor | Self::CimSwap
        )
    }

    /// Request -> flit count (§6 table).
    #[must_use]
    pub const fn flits(self) -> u32 {
        match self {
            Self::Rd0 | Self::Wr0 => 0,
            Self::Rd16 | Self::Rd32 | Self::Rd48 | Self::Rd64 | Self::Rd80 | Self::Rd96
            | Self::Rd112 | Self::Rd128 | Self::Rd256 => 1,
            Self::Wr16 => 2,
            Self::Wr32 => 3,
            Self::Wr48 => 4,
            Self::Wr64 => 5,
            Self::Wr80 => 6,
            Self::Wr96 => 7,
            Self::Wr112 => 8,
            Self::Wr128 => 9,
            Self::Wr256 => 17,
            Self::CimFetch | Self::CimStore | Self::CimAdd | Self::CimXor | Self::CimSwap => 2,
        }
    }

    /// Required `(reads, writes)` the destination vault controller must
    /// accept before a queued request can drain into `DRAMClockTick` (§4.3
    /// `DrainRequests`).
    #[must_use]
    pub const fn required_accept(self) -> (u32, u32) {
        match self {
            k if k.is_read() && !k.is_cim() => (1, 0),
            k if k.is_write() && !k.is_cim() => (0, 1),
            Self::CimFetch => (1, 0),
            Self::CimStore => (0, 1),
            Self::CimAdd | Self::CimXor => (2, 1),
            Self::CimSwap => (2, 2),
            _ => (0, 0),
        }
    }
}

/// The wire-level response kind carried by an [`HmcResponse`] (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HmcRespKind {
    RdRs,
    WrRs,
    None,
    CimFetchRs,
    CimStoreRs,
    CimAddRs,
    CimXorRs,
    CimSwapRs,
}

impl HmcRespKind {
    /// Response -> flit count. Non-CiM flit counts for `RD_RS` mirror the
    /// originating request's data payload; CiM response subtypes carry no
    /// payload of their own (flits=0), matching §6.
    #[must_use]
    pub const fn flits_for(self, req_flits: u32) -> u32 {
        match self {
            Self::RdRs => req_flits,
            Self::WrRs => 1,
            Self::None => 0,
            Self::CimFetchRs | Self::CimStoreRs | Self::CimAddRs | Self::CimXorRs | Self::CimSwapRs => 0,
        }
    }

    #[must_use]
    pub const fn for_request(req: HmcReqKind, posted: bool) -> Self {
        match req {
            _ if req.is_read() && !req.is_cim() => Self::RdRs,
            _ if req.is_write() && !req.is_cim() => {
                if posted {
                    Self::None
                } else {
                    Self::WrRs
                }
            }
            HmcReqKind::CimFetch => Self::CimFetchRs,
            HmcReqKind::CimStore => Self::CimStoreRs,
            HmcReqKind::CimAdd => Self::CimAddRs,
            HmcReqKind::CimXor => Self::CimXorRs,
            HmcReqKind::CimSwap => Self::CimSwapRs,
            _ => Self::None,
        }
    }
}

/// An in-flight HMC request packet (§3 "HMC request packet").
#[derive(Debug, Clone)]
pub struct HmcRequest {
    pub kind: HmcReqKind,
    pub a1: u64,
    pub a2: Option<u64>,
    pub a3: Option<u64>,
    pub link: usize,
    pub quad: usize,
    pub vault: usize,
    pub flits: u32,
    pub exit_time: Cycle,
}

impl HmcRequest {
    #[must_use]
    pub fn new(kind: HmcReqKind, a1: u64, a2: Option<u64>, a3: Option<u64>, vault: usize, link: usize) -> Self {
        Self {
            kind,
            a1,
            a2,
            a3,
            link,
            quad: vault % 4,
            vault,
            flits: kind.flits(),
            exit_time: Cycle::ZERO,
        }
    }
}

/// An in-flight HMC response packet (§3 "HMC response packet").
#[derive(Debug, Clone)]
pub struct HmcResponse {
    pub resp_id: u64,
    pub kind: HmcRespKind,
    pub link: usize,
    pub quad: usize,
    pub flits: u32,
    pub exit_time: Cycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flit_table_matches_spec() {
        assert_eq!(HmcReqKind::Rd0.flits(), 0);
        assert_eq!(HmcReqKind::Rd256.flits(), 1);
        assert_eq!(HmcReqKind::Wr16.flits(), 2);
        assert_eq!(HmcReqKind::Wr256.flits(), 17);
        assert_eq!(HmcReqKind::CimSwap.flits(), 2);
    }

    #[test]
    fn required_accept_matches_spec_table() {
        assert_eq!(HmcReqKind::Rd64.required_accept(), (1, 0));
        assert_eq!(HmcReqKind::Wr64.required_accept(), (0, 1));
        assert_eq!(HmcReqKind::CimAdd.required_accept(), (2, 1));
        assert_eq!(HmcReqKind::CimSwap.required_accept(), (2, 2));
    }

    #[test]
    fn quad_is_vault_mod_four() {
        let req = HmcRequest::new(HmcReqKind::Rd64, 0x1000, None, None, 9, 0);
        assert_eq!(req.quad, 1);
    }

    #[test]
    fn posted_write_response_has_no_flits() {
        let resp_kind = HmcRespKind::for_request(HmcReqKind::Wr64, true);
        assert_eq!(resp_kind, HmcRespKind::None);
        assert_eq!(resp_kind.flits_for(5), 0);
    }
}
