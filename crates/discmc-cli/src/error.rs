use discmc::core::forcefield::params::ParamLoadError;
use discmc::core::io::ConfigReadError;
use discmc::core::topology::TopologyLoadError;
use discmc::engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to load force field: {0}")]
    ForceField(#[from] ParamLoadError),

    #[error("Failed to load topology: {0}")]
    Topology(#[from] TopologyLoadError),

    #[error("Failed to read configuration '{path}': {source}", path = path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: ConfigReadError,
    },

    #[error("Failed to write configuration '{path}': {source}", path = path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
