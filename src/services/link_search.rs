//! Purchase-link lookup for an identified product.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keywords appended to a label so results lean towards shops.
pub const INTENT_SUFFIX: &str = "buy OR shop OR store OR online";

pub const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API returned {status}: {body}")]
    Unavailable { status: u16, body: String },

    #[error("Search request timed out")]
    Timeout,

    #[error("Search request failed: {0}")]
    Transport(String),

    #[error("Search response could not be decoded: {0}")]
    Decode(String),
}

impl SearchError {
    /// Whether a later attempt could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout | Self::Transport(_) => true,
            Self::Decode(_) => false,
        }
    }
}

/// One result as the search API returned it, not yet validated for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
}

/// Builds the query sent for a detected label.
#[must_use]
pub fn build_query(label: &str) -> String {
    format!("{} {INTENT_SUFFIX}", label.trim())
}

/// Capability interface over the external web-search API.
///
/// Results come back in the API's order, without re-ranking or deduplication.
#[async_trait::async_trait]
pub trait LinkSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError>;
}
