use thiserror::Error;

/// Error taxonomy shared across the platform.
///
/// Expected control outcomes of the claim flow (quota exhausted, already
/// claimed today) are not errors and live in `ClaimOutcome` instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid params: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// An external collaborator (provisioner, payment oracle, chain)
    /// reported a failure or could not be reached.
    #[error("gateway failure: {0}")]
    Gateway(String),

    /// An external call exceeded its bounded deadline.
    #[error("gateway call timed out: {0}")]
    GatewayTimeout(String),

    /// Storage failure. The message is for logs only and is never exposed
    /// verbatim to API callers.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    pub fn gateway(err: impl std::fmt::Display) -> Self {
        Self::Gateway(err.to_string())
    }
}
