//! Builds the configured dispatcher variant behind a single trait object
//! (§9 "Polymorphic dispatcher").

use memsim_core::{Config, DispatcherKind, MemorySystem, ReferenceController};
use memsim_hmc::HmcDispatcher;
use memsim_ideal::IdealDispatcher;
use memsim_jedec::JedecDispatcher;

use crate::error::CliError;

pub fn build(config: &Config) -> Result<Box<dyn MemorySystem>, CliError> {
    match config.dispatcher {
        DispatcherKind::Jedec => {
            let delays = *config.require_jedec_delays()?;
            let controllers: Vec<ReferenceController> = (0..config.address.channels)
                .map(|_| ReferenceController::new(config.controller.queue_depth, config.controller.latency))
                .collect();
            let addr_cfg = config.address.decode();
            Ok(Box::new(JedecDispatcher::new(controllers, addr_cfg, delays)))
        }
        DispatcherKind::Hmc => {
            let hmc_cfg = config.require_hmc()?;
            let vaults: Vec<ReferenceController> = (0..hmc_cfg.num_vaults)
                .map(|_| ReferenceController::new(config.controller.queue_depth, config.controller.latency))
                .collect();
            let vault_cfg = config.address.decode();
            Ok(Box::new(HmcDispatcher::new(vaults, vault_cfg, hmc_cfg)))
        }
        DispatcherKind::Ideal => {
            let latency = config.require_ideal_latency()?;
            Ok(Box::new(IdealDispatcher::new(latency)))
        }
    }
}
