//! Collection errors
//!
//! Every failure inside a collection ends up as one of these variants before
//! it is flattened into the `{"error": ...}` result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    /// Missing or invalid cloud identity, clouds.yaml or endpoint setup
    #[error("configuration error: {0:#}")]
    Configuration(anyhow::Error),

    /// Authentication, network, HTTP status or malformed API response
    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),

    /// Fake-data document unreadable or malformed
    #[error("data error: {0:#}")]
    Data(anyhow::Error),
}

impl CollectError {
    pub fn configuration(msg: impl std::fmt::Display) -> Self {
        Self::Configuration(anyhow::anyhow!("{}", msg))
    }
}

pub type CollectResult<T> = std::result::Result<T, CollectError>;
