use statemap_driver::DriverError;
use thiserror::Error;

/// Unrecoverable graph conditions. Everything else the engine handles
/// locally and keeps going.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("transition references unknown state '{id}'")]
    Integrity { id: String },

    #[error("seed graph could not be loaded: {reason}")]
    SeedLoad { reason: String },
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The driver could not produce an initial snapshot; there is nothing
    /// to explore.
    #[error("discovery aborted, initial snapshot failed: {0}")]
    Aborted(#[source] DriverError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, GraphError>;
