use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 100;

/// A stored purchase link, as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub id: Uuid,

    pub title: String,

    pub link: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResultValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("title must be {MAX_TITLE_CHARS} characters or less (got {0})")]
    TitleTooLong(usize),

    #[error("link is not an absolute URL: {0}")]
    InvalidLink(String),
}

/// A validated `{title, link}` pair waiting to be persisted.
///
/// Construction goes through [`NewSearchResult::parse`], so every value of this
/// type already satisfies the stored-row rules: the title is trimmed and holds
/// 1 to 100 characters, the link parses as a URL with a scheme and a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSearchResult {
    title: String,
    link: Url,
}

impl NewSearchResult {
    pub fn parse(title: &str, link: &str) -> Result<Self, ResultValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ResultValidationError::EmptyTitle);
        }

        let chars = title.chars().count();
        if chars > MAX_TITLE_CHARS {
            return Err(ResultValidationError::TitleTooLong(chars));
        }

        let link = Url::parse(link.trim())
            .map_err(|_| ResultValidationError::InvalidLink(link.to_string()))?;
        if link.host_str().is_none_or(str::is_empty) {
            return Err(ResultValidationError::InvalidLink(link.to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            link,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn link(&self) -> &str {
        self.link.as_str()
    }
}
