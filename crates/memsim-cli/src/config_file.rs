//! Loads a [`memsim_core::Config`] from a TOML file on disk.

use std::path::Path;

use memsim_core::Config;

use crate::error::CliError;

pub fn load(path: &Path) -> Result<Config, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| CliError::ConfigParse {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JEDEC_TOML: &str = r#"
        dispatcher = "jedec"

        [address]
        channels = 2
        shift_bits = 6
        ch_pos = 0
        ch_mask = 1

        [controller]
        queue_depth = 64
        latency = 5

        [cim_delays]
        CiM_Add_Delay = 100
        CiM_Xor_Delay = 100
        CiM_Swap_Delay = 50

        [output]
        output_prefix = "run"
        json_stats_name = "run.stats.json"
        json_epoch_name = "run.epoch.json"
        epoch_period = 1000
    "#;

    #[test]
    fn loads_a_well_formed_jedec_config() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("memsim-cli-test-config-{}.toml", std::process::id()));
        std::fs::write(&path, JEDEC_TOML).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.address.channels, 2);
        assert!(config.require_jedec_delays().is_ok());
        assert!(config.require_hmc().is_err());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_a_config_read_error() {
        let path = std::env::temp_dir().join("memsim-cli-test-config-does-not-exist.toml");
        assert!(matches!(load(&path), Err(CliError::ConfigRead { .. })));
    }
}
