/// Convenience result type used across the crate.
pub type TrailResult<T> = Result<T, TrailError>;

/// Top-level error taxonomy for a star-trail run.
///
/// Every failure is terminal for the run it occurs in; nothing is retried.
/// Cancellation is not an error and is reported through `RunState::Cancelled`.
#[derive(thiserror::Error, Debug)]
pub enum TrailError {
    /// Out-of-range or inconsistent pipeline parameters, rejected before a run starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The frame source could not be opened or probed.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The frame source failed after it was opened.
    #[error("source error: {0}")]
    Source(String),

    /// Opening, writing to, or finalizing the output stream failed.
    #[error("commit failure: {0}")]
    Commit(String),

    /// A caller broke an API contract (for example submitting after a stop request).
    #[error("contract violation: {0}")]
    Contract(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrailError {
    /// Build a [`TrailError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TrailError::SourceUnavailable`] value.
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Build a [`TrailError::Source`] value.
    pub fn source_error(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`TrailError::Commit`] value.
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::Commit(msg.into())
    }

    /// Build a [`TrailError::Contract`] value.
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
