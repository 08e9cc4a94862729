use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl DashboardError {
    /// Whether the caller supplied bad input, as opposed to a server-side failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, DashboardError::InvalidIdentifier(_))
    }
}
