//! services/api/src/adapters/store.rs
//!
//! This module contains the SQLite adapter, which is the concrete implementation
//! of the `ReadingListStore` port from the `core` crate. It owns the canonical
//! copy of the reading list and fans change notifications out to watchers.

use async_trait::async_trait;
use booktrack_core::domain::{ReadingEntry, ReadingStatus};
use booktrack_core::ports::{EntryStream, PortError, PortResult, ReadingListStore};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A reading-list store backed by SQLite.
///
/// Inserts are transactional; after a commit the fresh snapshot is broadcast
/// to every active watcher.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<Vec<ReadingEntry>>,
}

impl SqliteStore {
    /// Creates a new `SqliteStore`.
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self { pool, changes }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn snapshot(&self) -> PortResult<Vec<ReadingEntry>> {
        let records: Vec<ReadingEntryRecord> = sqlx::query_as(
            "SELECT id, title, authors, thumbnail, status, progress, review, added_date
             FROM reading_entries
             ORDER BY added_date DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(records.into_iter().map(ReadingEntryRecord::to_domain).collect())
    }
}

fn storage_err(err: sqlx::Error) -> PortError {
    PortError::Storage(err.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ReadingEntryRecord {
    id: String,
    title: String,
    authors: Option<String>,
    thumbnail: Option<String>,
    status: String,
    progress: f64,
    review: String,
    added_date: DateTime<Utc>,
}

impl ReadingEntryRecord {
    fn to_domain(self) -> ReadingEntry {
        ReadingEntry {
            id: self.id,
            title: self.title,
            authors: self.authors,
            thumbnail: self.thumbnail,
            // Rows are only ever written from a typed status, so this parse
            // can only miss if the file was edited out-of-band.
            status: ReadingStatus::parse(&self.status).unwrap_or_default(),
            progress: self.progress,
            review: self.review,
            added_date: self.added_date,
        }
    }
}

//=========================================================================================
// `ReadingListStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReadingListStore for SqliteStore {
    /// Inserts one entry inside a transaction: the full row or nothing.
    ///
    /// The surrogate `entry_id` is the primary key; the catalog `id` column
    /// is deliberately unconstrained, so repeated adds of the same book
    /// produce duplicate rows.
    async fn insert(&self, entry: &ReadingEntry) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query(
            "INSERT INTO reading_entries
                 (entry_id, id, title, authors, thumbnail, status, progress, review, added_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.id)
        .bind(&entry.title)
        .bind(&entry.authors)
        .bind(&entry.thumbnail)
        .bind(entry.status.as_str())
        .bind(entry.progress)
        .bind(&entry.review)
        .bind(entry.added_date)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;

        // Committed: notify watchers with the fresh snapshot. A failure to
        // re-read here only costs a notification, never the write.
        if self.changes.receiver_count() > 0 {
            match self.snapshot().await {
                Ok(snapshot) => {
                    let _ = self.changes.send(snapshot);
                }
                Err(err) => warn!("could not snapshot reading list for watchers: {err}"),
            }
        }

        Ok(())
    }

    async fn list_all(&self) -> PortResult<Vec<ReadingEntry>> {
        self.snapshot().await
    }

    /// Yields the current snapshot, then one snapshot per committed insert.
    /// A watcher that falls behind skips to the next snapshot rather than
    /// erroring; dropping the stream unsubscribes.
    async fn watch(&self) -> PortResult<EntryStream> {
        let mut rx = self.changes.subscribe();
        let initial = self.snapshot().await?;

        let stream = async_stream::stream! {
            yield initial;
            loop {
                match rx.recv().await {
                    Ok(snapshot) => yield snapshot,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
