//! Core types and traits for the DRAM/CiM/HMC memory-system simulator.
//!
//! Everything here is pure data and contracts: address decoding, the
//! transaction and HMC packet models, the controller trait a dispatcher
//! relies on (plus one reference implementation), the shared dispatcher
//! capability set, configuration types, and the fatal error enum. The
//! JEDEC, HMC, and Ideal dispatchers themselves live in their own crates.

mod address;
mod config;
mod controller;
mod cycle;
mod dispatcher;
mod error;
mod global;
mod hmc_packet;
mod transaction;

pub use address::{decode_channel, Address, AddressDecodeConfig};
pub use config::{
    AddressConfig, BlockSize, CimDelays, Config, ControllerConfig, DispatcherKind, HmcConfig,
    OutputConfig,
};
pub use controller::{CompletionKind, Controller, ReferenceController};
pub use cycle::Cycle;
pub use dispatcher::{Callbacks, MemorySystem};
pub use error::Error;
pub use global::{record_dispatcher_construction, total_channels};
pub use hmc_packet::{HmcReqKind, HmcRequest, HmcRespKind, HmcResponse};
pub use transaction::{Transaction, TransactionKind};
