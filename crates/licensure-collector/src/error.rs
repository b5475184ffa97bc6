use crate::source::RawProviderRecord;
use licensure_core::SourceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    /// Retries exhausted on a network call or navigation. Carries the
    /// records collected before the failure.
    #[error("transient network failure on {source_id} after {attempts} attempts: {reason}")]
    TransientNetwork {
        source_id: SourceId,
        attempts: u32,
        reason: String,
        partial: Vec<RawProviderRecord>,
    },

    /// Bounded polling gave up on a UI element. Carries whatever was
    /// already on screen when polling stopped.
    #[error("{what} did not render after {attempts} polls")]
    RenderTimeout {
        what: String,
        attempts: u32,
        partial: Vec<RawProviderRecord>,
    },

    /// A whole response or page did not have the expected shape.
    #[error("unexpected response shape: {context}")]
    Parse {
        context: String,
        partial: Vec<RawProviderRecord>,
    },

    /// A single entry or row is unusable; it is skipped, never fatal.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("Browser error: {0}")]
    Browser(#[from] licensure_browser::BrowserError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CollectError {
    /// Records collected before the failure, if the variant carries any.
    pub fn partial(&self) -> &[RawProviderRecord] {
        match self {
            Self::TransientNetwork { partial, .. }
            | Self::RenderTimeout { partial, .. }
            | Self::Parse { partial, .. } => partial,
            _ => &[],
        }
    }

    /// Move the partial records out, leaving the error itself intact.
    pub fn take_partial(&mut self) -> Vec<RawProviderRecord> {
        match self {
            Self::TransientNetwork { partial, .. }
            | Self::RenderTimeout { partial, .. }
            | Self::Parse { partial, .. } => std::mem::take(partial),
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectError>;
