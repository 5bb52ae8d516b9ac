//! Error types for the segmented LRU cache

use std::sync::Arc;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by user supplied loaders
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while configuring or using the cache
///
/// Internal invariant violations are not represented here: a corrupted queue
/// makes the segment panic.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// Invalid argument at a call site
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Stats snapshots taken from different caches (or cache lifetimes)
    #[error("Stats start times differ: {left} != {right}")]
    StartTimeMismatch { left: u64, right: u64 },

    /// The loader returned an error; shared by every caller waiting on it
    #[error("Loader failed: {0}")]
    Load(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// The loading thread unwound before producing a value
    #[error("Loader abandoned before completing")]
    LoadAbandoned,
}

impl Error {
    /// Wrap a loader error so it can be fanned out to all waiters
    pub(crate) fn load(err: impl Into<BoxError>) -> Self {
        Error::Load(Arc::from(err.into()))
    }

    /// True if the error came from (or instead of) a loader invocation
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Error::Load(_) | Error::LoadAbandoned)
    }
}

// =============================================================================
// Tests
// =============================================================================
