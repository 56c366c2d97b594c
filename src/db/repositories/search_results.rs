use crate::entities::{prelude::*, search_results};
use crate::models::NewSearchResult;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, PaginatorTrait,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Taken at the start of every writing transaction on Postgres. It conflicts with
/// itself, so a second writer waits for the first to commit and its DELETE then
/// sees the committed rows. Plain reads are not blocked.
const POSTGRES_WRITE_LOCK: &str = "LOCK TABLE search_results IN SHARE ROW EXCLUSIVE MODE";

pub struct ResultRepository {
    conn: DatabaseConnection,
}

impl ResultRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Replaces the whole table with `items` in one transaction and returns the
    /// rows that transaction committed.
    pub async fn replace_all(
        &self,
        items: &[NewSearchResult],
    ) -> Result<Vec<search_results::Model>, DbErr> {
        self.replace_with(|| Self::rows_for(items)).await
    }

    /// The replace-transaction with caller-built rows.
    pub async fn replace_rows(
        &self,
        rows: Vec<search_results::ActiveModel>,
    ) -> Result<Vec<search_results::Model>, DbErr> {
        self.replace_with(move || rows).await
    }

    /// Lock, delete every row, insert, read back, commit.
    ///
    /// Any failure rolls the transaction back explicitly, so readers only ever see
    /// the previous set or the complete new one.
    async fn replace_with<F>(&self, rows: F) -> Result<Vec<search_results::Model>, DbErr>
    where
        F: FnOnce() -> Vec<search_results::ActiveModel> + Send,
    {
        let txn = self.conn.begin().await?;

        match Self::swap_rows(&txn, rows).await {
            Ok(stored) => {
                txn.commit().await?;
                debug!(inserted = stored.len(), "Replaced stored search results");
                Ok(stored)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Rollback of result replacement failed");
                }
                Err(err)
            }
        }
    }

    async fn swap_rows<C, F>(conn: &C, rows: F) -> Result<Vec<search_results::Model>, DbErr>
    where
        C: ConnectionTrait,
        F: FnOnce() -> Vec<search_results::ActiveModel> + Send,
    {
        Self::lock_for_write(conn).await?;

        let deleted = SearchResults::delete_many().exec(conn).await?;
        debug!(deleted = deleted.rows_affected, "Cleared previous results");

        // Built under the lock, so creation times follow commit order.
        for row in rows() {
            SearchResults::insert(row)
                .exec_without_returning(conn)
                .await?;
        }

        SearchResults::find().all(conn).await
    }

    /// Serializes writers. SQLite already allows only one writer at a time.
    async fn lock_for_write<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
        if conn.get_database_backend() == DbBackend::Postgres {
            conn.execute_unprepared(POSTGRES_WRITE_LOCK).await?;
        }
        Ok(())
    }

    fn rows_for(items: &[NewSearchResult]) -> Vec<search_results::ActiveModel> {
        let mut last: Option<DateTime<Utc>> = None;

        items
            .iter()
            .map(|item| {
                // Wall clock may step backwards; keep the batch non-decreasing.
                let now = last.map_or_else(Utc::now, |prev| Utc::now().max(prev));
                last = Some(now);

                search_results::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    title: Set(item.title().to_string()),
                    link: Set(item.link().to_string()),
                    created_at: Set(now),
                }
            })
            .collect()
    }

    pub async fn clear(&self) -> Result<u64, DbErr> {
        let txn = self.conn.begin().await?;

        let cleared = async {
            Self::lock_for_write(&txn).await?;
            SearchResults::delete_many().exec(&txn).await
        }
        .await;

        match cleared {
            Ok(result) => {
                txn.commit().await?;
                Ok(result.rows_affected)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Rollback of result clear failed");
                }
                Err(err)
            }
        }
    }

    pub async fn list_all(&self) -> Result<Vec<search_results::Model>, DbErr> {
        SearchResults::find().all(&self.conn).await
    }

    pub async fn list_by_creation(&self) -> Result<Vec<search_results::Model>, DbErr> {
        SearchResults::find()
            .order_by_asc(search_results::Column::CreatedAt)
            .all(&self.conn)
            .await
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        SearchResults::find().count(&self.conn).await
    }
}
