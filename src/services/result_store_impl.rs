//! `SeaORM` implementation of the `ResultStore` trait.

use crate::db::Store;
use crate::models::{NewSearchResult, SearchResult};
use crate::services::result_store::{ResultStore, StorageError};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmResultStore {
    store: Store,
}

impl SeaOrmResultStore {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResultStore for SeaOrmResultStore {
    async fn replace_all(
        &self,
        items: &[NewSearchResult],
    ) -> Result<Vec<SearchResult>, StorageError> {
        let rows = self.store.results().replace_all(items).await?;
        info!(count = rows.len(), "Search results stored");
        Ok(rows.into_iter().map(SearchResult::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<SearchResult>, StorageError> {
        let rows = self.store.results().list_all().await?;
        Ok(rows.into_iter().map(SearchResult::from).collect())
    }

    async fn list_by_creation(&self) -> Result<Vec<SearchResult>, StorageError> {
        let rows = self.store.results().list_by_creation().await?;
        Ok(rows.into_iter().map(SearchResult::from).collect())
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        let removed = self.store.results().clear().await?;
        info!(removed, "Stored search results cleared");
        Ok(removed)
    }
}
