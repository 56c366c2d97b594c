//! Domain service owning the persisted result set.
//!
//! The stored set is a single shared table that every successful search
//! replaces wholesale. There is no per-user history.

use crate::models::{NewSearchResult, SearchResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StorageError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain service trait for the result set.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Atomically discards every stored result and inserts `items`, returning
    /// the set this replacement committed.
    ///
    /// Either the previous set stays intact or the new set is entirely
    /// present; a failure never leaves a mixture behind. Overlapping
    /// replacements are serialized, so the last to commit is what remains.
    /// An empty `items` clears the store.
    async fn replace_all(
        &self,
        items: &[NewSearchResult],
    ) -> Result<Vec<SearchResult>, StorageError>;

    /// Returns every stored result in the storage engine's scan order.
    async fn list_all(&self) -> Result<Vec<SearchResult>, StorageError>;

    /// Returns every stored result ordered by creation time.
    async fn list_by_creation(&self) -> Result<Vec<SearchResult>, StorageError>;

    /// Removes all stored results, returning how many were removed.
    async fn clear(&self) -> Result<u64, StorageError>;
}
