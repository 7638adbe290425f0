//! CLI-level errors: config file I/O and parsing, layered on top of
//! [`memsim_core::Error`] for the fatal dispatcher-contract cases.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("reading config file {path}: {source}")]
    ConfigRead { path: String, source: std::io::Error },

    #[error("parsing config file {path}: {source}")]
    ConfigParse { path: String, source: Box<toml::de::Error> },

    #[error("opening trace file {path}: {source}")]
    TraceOpen { path: String, source: std::io::Error },

    #[error(transparent)]
    Sim(#[from] memsim_core::Error),

    #[error("writing output file {path}: {source}")]
    OutputWrite { path: String, source: std::io::Error },
}
