use thiserror::Error;

/// Errors raised by the simulation kernel.
///
/// Only `InvalidConfiguration` ever leaves `initialize`; the other two are
/// caught inside a tick and turned into "stay in place".
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimError {
    #[error("coordinate ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i64, y: i64 },
    #[error("cell ({x}, {y}) is already occupied")]
    OccupancyConflict { x: usize, y: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SimError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(message.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
