//! crates/booktrack_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{CatalogBook, ReadingEntry, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Could not decode response: {0}")]
    Decode(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A live view of the reading list: each item is a full snapshot, newest
/// entry first. Dropping the stream is the unsubscribe.
pub type EntryStream = Pin<Box<dyn Stream<Item = Vec<ReadingEntry>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Searches the external book catalog for the given free-text query.
    ///
    /// A blank query returns an empty list immediately, without touching the
    /// network. No retry, no caching, no pagination.
    async fn search(&self, query: &str) -> PortResult<Vec<CatalogBook>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingListStore: Send + Sync {
    /// Durably records one entry. Atomic: either the full entry is stored or
    /// nothing is.
    async fn insert(&self, entry: &ReadingEntry) -> PortResult<()>;

    /// Every stored entry, `added_date` descending.
    async fn list_all(&self) -> PortResult<Vec<ReadingEntry>>;

    /// Subscribes to the reading list. Yields the current snapshot first,
    /// then a fresh snapshot after every committed insert. Any number of
    /// watchers may be active at once; each sees the same ordered snapshots.
    async fn watch(&self) -> PortResult<EntryStream>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncService: Send + Sync {
    /// Writes (or overwrites) the remote mirror document addressed by
    /// `(user_id, entry.id)` with the full entry payload.
    ///
    /// Best-effort by contract: callers fire this and discard the outcome.
    /// An entry with an empty id is skipped entirely and only logged.
    async fn push(&self, user_id: Uuid, entry: &ReadingEntry) -> PortResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionService: Send + Sync {
    /// The ambient authenticated user id, if any. Pure read.
    async fn current_user_id(&self) -> Option<Uuid>;

    /// The ambient authenticated user, if any. Pure read.
    async fn current_user(&self) -> Option<User>;

    /// Creates an account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<User>;

    /// Signs an existing account in.
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<User>;

    /// Clears the ambient session.
    async fn sign_out(&self) -> PortResult<()>;
}
