//! crates/booktrack_core/src/reading_list.rs
//!
//! The reading-list coordinator: the one piece of real orchestration in the
//! application. It validates the session, builds a durable entry from a
//! catalog record plus user-entered metadata, writes it to the local store,
//! and then fires the best-effort push to the remote mirror.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tracing::{error, warn};

use crate::domain::{normalize_thumbnail, CatalogBook, ReadingEntry, ReadingStatus, StatusFilter};
use crate::ports::{EntryStream, PortError, PortResult, ReadingListStore, SessionService, SyncService};

//=========================================================================================
// The Coordinator
//=========================================================================================

/// Orchestrates the local store, the remote mirror, and the ambient session.
///
/// All collaborators are constructor-supplied; the coordinator holds no
/// ambient or global context. The local store owns the canonical copy of the
/// list; the remote mirror is a derived copy that may silently lag.
pub struct ReadingListCoordinator {
    store: Arc<dyn ReadingListStore>,
    sync: Arc<dyn SyncService>,
    session: Arc<dyn SessionService>,
    /// Advisory in-progress flag. It drives `is_submitting()` so a caller can
    /// disable its trigger control; it does not reject a second concurrent
    /// submission and the store makes no combined-atomicity promise for one.
    submitting: AtomicBool,
}

impl ReadingListCoordinator {
    pub fn new(
        store: Arc<dyn ReadingListStore>,
        sync: Arc<dyn SyncService>,
        session: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            store,
            sync,
            session,
            submitting: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Adds a catalog book to the reading list.
    ///
    /// The local insert is the only operation whose outcome the caller sees.
    /// The mirror push runs detached afterwards and its result is dropped by
    /// design; a stale mirror is an accepted condition.
    pub async fn add_book(
        &self,
        book: &CatalogBook,
        status: ReadingStatus,
        progress: f64,
        review: &str,
    ) -> PortResult<ReadingEntry> {
        // 1. A write needs an authenticated session. This is a precondition
        //    failure, not a retryable error: nothing has been touched yet.
        let Some(user_id) = self.session.current_user_id().await else {
            warn!("add_book rejected: no user signed in");
            return Err(PortError::Unauthorized);
        };

        // 2. Raise the advisory flag for the duration of the submission.
        self.submitting.store(true, Ordering::SeqCst);

        // 3. Build the durable entry from the catalog record.
        let entry = ReadingEntry {
            id: book.id.clone(),
            title: book.title.clone(),
            authors: book.authors.as_ref().map(|authors| authors.join(", ")),
            thumbnail: book.thumbnail_url.as_deref().map(normalize_thumbnail),
            status,
            progress,
            review: review.to_string(),
            added_date: Utc::now(),
        };

        // 4. Local write first. If it fails the mirror is never contacted.
        if let Err(err) = self.store.insert(&entry).await {
            error!("failed to store reading entry {}: {err}", entry.id);
            self.submitting.store(false, Ordering::SeqCst);
            return Err(err);
        }

        // 5. Mirror the committed entry. The task is detached and its outcome
        //    intentionally discarded: the local store is the source of truth.
        let sync = Arc::clone(&self.sync);
        let mirrored = entry.clone();
        let _mirror_task = tokio::spawn(async move {
            if let Err(err) = sync.push(user_id, &mirrored).await {
                warn!("mirror push for entry {} failed: {err}", mirrored.id);
            }
        });

        // 6. Done; back to idle on every path.
        self.submitting.store(false, Ordering::SeqCst);
        Ok(entry)
    }

    /// The reading list narrowed to a status filter, order preserved
    /// (`added_date` descending, as the store returns it).
    pub async fn list(&self, filter: StatusFilter) -> PortResult<Vec<ReadingEntry>> {
        let entries = self.store.list_all().await?;
        Ok(apply_filter(entries, filter))
    }

    /// A live, filtered view of the reading list: the current snapshot first,
    /// then a new snapshot after every committed insert.
    pub async fn watch(&self, filter: StatusFilter) -> PortResult<EntryStream> {
        let stream = self.store.watch().await?;
        Ok(Box::pin(
            stream.map(move |snapshot| apply_filter(snapshot, filter)),
        ))
    }

    /// How many books the user has added overall.
    pub async fn book_count(&self) -> PortResult<usize> {
        Ok(self.store.list_all().await?.len())
    }
}

fn apply_filter(entries: Vec<ReadingEntry>, filter: StatusFilter) -> Vec<ReadingEntry> {
    entries
        .into_iter()
        .filter(|entry| filter.matches(entry.status))
        .collect()
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockReadingListStore, MockSessionService, MockSyncService};
    use chrono::{Duration, Utc};
    use std::time::Duration as StdDuration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn dune() -> CatalogBook {
        CatalogBook {
            id: "abc123".to_string(),
            title: "Dune".to_string(),
            authors: Some(vec!["Frank Herbert".to_string()]),
            thumbnail_url: Some("http://img/x.jpg".to_string()),
        }
    }

    fn entry(id: &str, status: ReadingStatus, age_minutes: i64) -> ReadingEntry {
        ReadingEntry {
            id: id.to_string(),
            title: id.to_string(),
            authors: None,
            thumbnail: None,
            status,
            progress: 0.0,
            review: String::new(),
            added_date: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn coordinator(
        store: MockReadingListStore,
        sync: MockSyncService,
        session: MockSessionService,
    ) -> ReadingListCoordinator {
        ReadingListCoordinator::new(Arc::new(store), Arc::new(sync), Arc::new(session))
    }

    #[tokio::test]
    async fn add_book_without_session_touches_nothing() {
        let mut session = MockSessionService::new();
        session.expect_current_user_id().returning(|| None);

        let mut store = MockReadingListStore::new();
        store.expect_insert().times(0);
        let mut sync = MockSyncService::new();
        sync.expect_push().times(0);

        let coordinator = coordinator(store, sync, session);
        let result = coordinator
            .add_book(&dune(), ReadingStatus::Reading, 0.3, "")
            .await;

        assert!(matches!(result, Err(PortError::Unauthorized)));
        assert!(!coordinator.is_submitting());
    }

    #[tokio::test]
    async fn add_book_stores_normalized_entry_and_mirrors_it() {
        let user_id = Uuid::new_v4();
        let mut session = MockSessionService::new();
        session
            .expect_current_user_id()
            .returning(move || Some(user_id));

        let (inserted_tx, mut inserted_rx) = mpsc::unbounded_channel();
        let mut store = MockReadingListStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(move |entry| {
                inserted_tx.send(entry.clone()).unwrap();
                Ok(())
            });

        let (pushed_tx, mut pushed_rx) = mpsc::unbounded_channel();
        let mut sync = MockSyncService::new();
        sync.expect_push()
            .times(1)
            .returning(move |uid, entry| {
                pushed_tx.send((uid, entry.clone())).unwrap();
                Ok(())
            });

        let coordinator = coordinator(store, sync, session);
        let returned = coordinator
            .add_book(&dune(), ReadingStatus::Reading, 0.3, "slow start")
            .await
            .unwrap();

        let stored = inserted_rx.recv().await.unwrap();
        assert_eq!(stored.id, "abc123");
        assert_eq!(stored.title, "Dune");
        assert_eq!(stored.authors.as_deref(), Some("Frank Herbert"));
        assert_eq!(stored.thumbnail.as_deref(), Some("https://img/x.jpg"));
        assert_eq!(stored.status, ReadingStatus::Reading);
        assert_eq!(stored.progress, 0.3);
        assert_eq!(stored.review, "slow start");
        assert_eq!(returned, stored);

        // The mirror receives the committed entry verbatim.
        let (pushed_uid, pushed_entry) = tokio::time::timeout(
            StdDuration::from_secs(1),
            pushed_rx.recv(),
        )
        .await
        .expect("mirror push never happened")
        .unwrap();
        assert_eq!(pushed_uid, user_id);
        assert_eq!(pushed_entry, stored);

        assert!(!coordinator.is_submitting());
    }

    #[tokio::test]
    async fn add_book_joins_multiple_authors_with_commas() {
        let mut session = MockSessionService::new();
        session
            .expect_current_user_id()
            .returning(|| Some(Uuid::new_v4()));

        let (inserted_tx, mut inserted_rx) = mpsc::unbounded_channel();
        let mut store = MockReadingListStore::new();
        store.expect_insert().returning(move |entry| {
            inserted_tx.send(entry.clone()).unwrap();
            Ok(())
        });
        let mut sync = MockSyncService::new();
        sync.expect_push().returning(|_, _| Ok(()));

        let book = CatalogBook {
            id: "xyz".to_string(),
            title: "Good Omens".to_string(),
            authors: Some(vec!["Terry Pratchett".to_string(), "Neil Gaiman".to_string()]),
            thumbnail_url: None,
        };

        let coordinator = coordinator(store, sync, session);
        coordinator
            .add_book(&book, ReadingStatus::ToRead, 0.0, "")
            .await
            .unwrap();

        let stored = inserted_rx.recv().await.unwrap();
        assert_eq!(stored.authors.as_deref(), Some("Terry Pratchett, Neil Gaiman"));
        // Absent thumbnail stays absent; no normalization is invented.
        assert_eq!(stored.thumbnail, None);
    }

    #[tokio::test]
    async fn persistence_failure_aborts_before_the_mirror() {
        let mut session = MockSessionService::new();
        session
            .expect_current_user_id()
            .returning(|| Some(Uuid::new_v4()));

        let mut store = MockReadingListStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(PortError::Storage("disk full".to_string())));
        let mut sync = MockSyncService::new();
        sync.expect_push().times(0);

        let coordinator = coordinator(store, sync, session);
        let result = coordinator
            .add_book(&dune(), ReadingStatus::Finished, 1.0, "")
            .await;

        assert!(matches!(result, Err(PortError::Storage(_))));
        assert!(!coordinator.is_submitting());
    }

    #[tokio::test]
    async fn list_filters_in_memory_and_preserves_order() {
        let entries = vec![
            entry("newest", ReadingStatus::Reading, 0),
            entry("middle", ReadingStatus::Finished, 5),
            entry("oldest", ReadingStatus::Reading, 10),
        ];

        let mut store = MockReadingListStore::new();
        let all = entries.clone();
        store
            .expect_list_all()
            .returning(move || Ok(all.clone()));

        let coordinator = coordinator(store, MockSyncService::new(), MockSessionService::new());

        let everything = coordinator.list(StatusFilter::All).await.unwrap();
        assert_eq!(everything, entries);

        let reading = coordinator
            .list(StatusFilter::Only(ReadingStatus::Reading))
            .await
            .unwrap();
        let ids: Vec<&str> = reading.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "oldest"]);

        assert_eq!(coordinator.book_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn watch_applies_the_filter_to_every_snapshot() {
        let first = vec![entry("a", ReadingStatus::Reading, 1)];
        let second = vec![
            entry("b", ReadingStatus::Finished, 0),
            entry("a", ReadingStatus::Reading, 1),
        ];

        let mut store = MockReadingListStore::new();
        let snapshots = vec![first, second];
        store.expect_watch().returning(move || {
            let stream: EntryStream = Box::pin(futures::stream::iter(snapshots.clone()));
            Ok(stream)
        });

        let coordinator = coordinator(store, MockSyncService::new(), MockSessionService::new());
        let stream = coordinator
            .watch(StatusFilter::Only(ReadingStatus::Finished))
            .await
            .unwrap();

        let seen: Vec<Vec<ReadingEntry>> = stream.collect().await;
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_empty());
        assert_eq!(seen[1].len(), 1);
        assert_eq!(seen[1][0].id, "b");
    }
}
