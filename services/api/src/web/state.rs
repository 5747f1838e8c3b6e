//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use booktrack_core::ports::{CatalogService, SessionService};
use booktrack_core::reading_list::ReadingListCoordinator;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogService>,
    pub reading_list: Arc<ReadingListCoordinator>,
    pub session: Arc<dyn SessionService>,
    pub config: Arc<Config>,
}
