//! Shared configuration types (§6 "Configuration options").
//!
//! This module only defines the data; parsing the TOML file on disk is
//! `memsim-cli`'s job (it is the crate that touches the filesystem).

use serde::Deserialize;

use crate::address::AddressDecodeConfig;

/// Which dispatcher variant a [`Config`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatcherKind {
    Jedec,
    Hmc,
    Ideal,
}

impl DispatcherKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jedec => "jedec",
            Self::Hmc => "hmc",
            Self::Ideal => "ideal",
        }
    }
}

/// Block size options for HMC plain read/write requests (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub struct BlockSize(pub u32);

impl TryFrom<u32> for BlockSize {
    type Error = crate::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 | 32 | 64 | 128 | 256 => Ok(Self(value)),
            other => Err(crate::Error::UnknownBlockSize(other)),
        }
    }
}

/// Address decoding configuration (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AddressConfig {
    pub channels: u32,
    pub shift_bits: u32,
    pub ch_pos: u32,
    pub ch_mask: u64,
}

impl AddressConfig {
    #[must_use]
    pub const fn decode(self) -> AddressDecodeConfig {
        AddressDecodeConfig::new(self.shift_bits, self.ch_pos, self.ch_mask)
    }
}

/// HMC crossbar sizing (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HmcConfig {
    pub link_width: u32,
    pub link_speed_mhz: u64,
    pub num_links: usize,
    pub num_vaults: usize,
    pub xbar_queue_depth: usize,
    pub block_size: BlockSize,
}

/// JEDEC CiM compute delays, in cycles (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CimDelays {
    #[serde(rename = "CiM_Add_Delay")]
    pub add: u64,
    #[serde(rename = "CiM_Xor_Delay")]
    pub xor: u64,
    #[serde(rename = "CiM_Swap_Delay")]
    pub swap: u64,
}

/// Stats/epoch output paths (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub output_prefix: String,
    pub json_stats_name: String,
    pub json_epoch_name: String,
    pub epoch_period: u64,
}

/// Reference-controller sizing shared by every channel/vault (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ControllerConfig {
    pub queue_depth: usize,
    pub latency: u64,
}

/// Full simulator configuration, as loaded from the TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dispatcher: DispatcherKind,
    pub address: AddressConfig,
    pub controller: ControllerConfig,
    pub hmc: Option<HmcConfig>,
    pub cim_delays: Option<CimDelays>,
    pub ideal_memory_latency: Option<u64>,
    pub output: OutputConfig,
}

impl Config {
    /// Enforce that HMC-only fields are present for an HMC config and
    /// absent (or at least unused) otherwise, per §7 error kind 1.
    pub fn require_hmc(&self) -> Result<&HmcConfig, crate::Error> {
        if self.dispatcher != DispatcherKind::Hmc {
            return Err(crate::Error::NotHmcConfig {
                found: self.dispatcher.name(),
            });
        }
        self.hmc.as_ref().ok_or(crate::Error::NotHmcConfig {
            found: self.dispatcher.name(),
        })
    }

    pub fn require_jedec_delays(&self) -> Result<&CimDelays, crate::Error> {
        if self.dispatcher == DispatcherKind::Hmc {
            return Err(crate::Error::NotJedecConfig {
                found: self.dispatcher.name(),
            });
        }
        self.cim_delays.as_ref().ok_or(crate::Error::NotJedecConfig {
            found: self.dispatcher.name(),
        })
    }

    pub fn require_ideal_latency(&self) -> Result<u64, crate::Error> {
        if self.dispatcher != DispatcherKind::Ideal {
            return Err(crate::Error::NotIdealConfig {
                found: self.dispatcher.name(),
            });
        }
        self.ideal_memory_latency.ok_or(crate::Error::NotIdealConfig {
            found: self.dispatcher.name(),
        })
    }
}
