//! Crate-wide fatal error type (§7 "Error handling design").
//!
//! Recoverable backpressure (`will_accept` returning `false`) and silently
//! dropped unknown trace ops are *not* represented here — they are part of
//! the ordinary boolean-return control flow, not failures. IO and config
//! parsing errors are layered on top of this in `memsim-cli`, which is the
//! crate that actually touches the filesystem.
use thiserror::Error;

/// Fatal configuration or host-contract-violation conditions.
///
/// Every variant here is, per §7, a reason to abort the batch run rather
/// than to propagate a value the host could recover from.
#[derive(Debug, Error)]
pub enum Error {
    #[error("dispatcher variant requires an HMC configuration, but config selects {found}")]
    NotHmcConfig { found: &'static str },

    #[error("JEDEC CiM delays require a non-HMC configuration, but config selects {found}")]
    NotJedecConfig { found: &'static str },

    #[error("ideal dispatcher requires ideal_memory_latency, but config selects {found}")]
    NotIdealConfig { found: &'static str },

    #[error("unknown block_size {0}; expected one of 0, 32, 64, 128, 256")]
    UnknownBlockSize(u32),

    #[error(
        "admission violation: host called add() at cycle {cycle} without a preceding successful \
         will_accept() for the same transaction (addr {addr:#x})"
    )]
    AdmissionViolation { addr: u64, cycle: u64 },
}
