//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::status_for_port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
};
use booktrack_core::domain::{CatalogBook, ReadingEntry, ReadingStatus, StatusFilter};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        search_handler,
        add_book_handler,
        list_books_handler,
        profile_handler,
    ),
    components(
        schemas(CatalogBookResponse, AddBookRequest, ReadingEntryResponse, ProfileResponse)
    ),
    tags(
        (name = "BookTrack API", description = "API endpoints for the reading-list tracker.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// One catalog search result, not yet tracked by the user.
#[derive(Serialize, ToSchema)]
pub struct CatalogBookResponse {
    id: String,
    title: String,
    authors: Option<Vec<String>>,
    thumbnail: Option<String>,
}

impl From<CatalogBook> for CatalogBookResponse {
    fn from(book: CatalogBook) -> Self {
        Self {
            id: book.id,
            title: book.title,
            authors: book.authors,
            thumbnail: book.thumbnail_url,
        }
    }
}

/// The payload for adding a catalog book to the reading list.
#[derive(Deserialize, ToSchema)]
pub struct AddBookRequest {
    pub id: String,
    pub title: String,
    pub authors: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    /// Accepted in any casing; stored lowercase.
    pub status: String,
    /// Fraction read, 0.0 through 1.0.
    pub progress: f64,
    #[serde(default)]
    pub review: String,
}

/// A stored reading-list entry as returned to clients.
#[derive(Serialize, ToSchema)]
pub struct ReadingEntryResponse {
    id: String,
    title: String,
    authors: Option<String>,
    thumbnail: Option<String>,
    status: String,
    progress: f64,
    review: String,
    added_date: DateTime<Utc>,
}

impl From<ReadingEntry> for ReadingEntryResponse {
    fn from(entry: ReadingEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            authors: entry.authors,
            thumbnail: entry.thumbnail,
            status: entry.status.as_str().to_string(),
            progress: entry.progress,
            review: entry.review,
            added_date: entry.added_date,
        }
    }
}

/// The signed-in user's profile summary.
#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    user_id: Uuid,
    email: Option<String>,
    books_added: usize,
}

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

#[derive(Deserialize)]
pub struct ListParams {
    status: Option<String>,
}

fn parse_filter(params: &ListParams) -> Result<StatusFilter, (StatusCode, String)> {
    match &params.status {
        None => Ok(StatusFilter::All),
        Some(raw) => StatusFilter::parse(raw).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("'{raw}' is not a status filter"),
            )
        }),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Search the public book catalog.
///
/// A missing or blank `q` returns an empty list without a catalog request.
#[utoipa::path(
    get,
    path = "/search",
    params(
        ("q" = Option<String>, Query, description = "Free-text search query.")
    ),
    responses(
        (status = 200, description = "Search results", body = [CatalogBookResponse]),
        (status = 502, description = "The catalog could not be reached or decoded")
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let query = params.q.unwrap_or_default();
    let books = app_state.catalog.search(&query).await.map_err(|err| {
        error!("catalog search failed: {err}");
        (status_for_port_error(&err), format!("Search failed: {err}"))
    })?;

    let results: Vec<CatalogBookResponse> =
        books.into_iter().map(CatalogBookResponse::from).collect();
    Ok(Json(results))
}

/// Add a book from the catalog to the reading list.
///
/// Requires a signed-in session. The local write decides the response; the
/// remote mirror push happens afterwards and cannot fail the request.
#[utoipa::path(
    post,
    path = "/books",
    request_body = AddBookRequest,
    responses(
        (status = 201, description = "Book added to the reading list", body = ReadingEntryResponse),
        (status = 400, description = "Bad status or progress value"),
        (status = 401, description = "No user is signed in"),
        (status = 500, description = "The entry could not be stored")
    )
)]
pub async fn add_book_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<AddBookRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(status) = ReadingStatus::parse(&req.status) else {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a reading status", req.status),
        ));
    };
    if !(0.0..=1.0).contains(&req.progress) {
        return Err((
            StatusCode::BAD_REQUEST,
            "progress must be between 0.0 and 1.0".to_string(),
        ));
    }

    let book = CatalogBook {
        id: req.id,
        title: req.title,
        authors: req.authors,
        thumbnail_url: req.thumbnail,
    };

    let entry = app_state
        .reading_list
        .add_book(&book, status, req.progress, &req.review)
        .await
        .map_err(|err| {
            error!("failed to add book: {err}");
            let message = match &err {
                booktrack_core::ports::PortError::Unauthorized => {
                    "sign in to add books".to_string()
                }
                _ => "failed to add the book".to_string(),
            };
            (status_for_port_error(&err), message)
        })?;

    Ok((StatusCode::CREATED, Json(ReadingEntryResponse::from(entry))))
}

/// The reading list, newest first, optionally narrowed to one status.
#[utoipa::path(
    get,
    path = "/books",
    params(
        ("status" = Option<String>, Query, description = "`all` (default), `to-read`, `reading` or `finished`; any casing.")
    ),
    responses(
        (status = 200, description = "The filtered reading list", body = [ReadingEntryResponse]),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "The reading list could not be read")
    )
)]
pub async fn list_books_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let filter = parse_filter(&params)?;
    let entries = app_state.reading_list.list(filter).await.map_err(|err| {
        error!("failed to list reading entries: {err}");
        (
            status_for_port_error(&err),
            "failed to load the reading list".to_string(),
        )
    })?;

    let results: Vec<ReadingEntryResponse> =
        entries.into_iter().map(ReadingEntryResponse::from).collect();
    Ok(Json(results))
}

/// A live Server-Sent-Events view of the (filtered) reading list: the current
/// snapshot immediately, then a fresh snapshot after every committed insert.
pub async fn watch_books_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, (StatusCode, String)> {
    let filter = parse_filter(&params)?;
    let snapshots = app_state.reading_list.watch(filter).await.map_err(|err| {
        error!("failed to open reading-list watch: {err}");
        (
            status_for_port_error(&err),
            "failed to open the live reading list".to_string(),
        )
    })?;

    let events = snapshots.map(|snapshot| {
        let payload: Vec<ReadingEntryResponse> =
            snapshot.into_iter().map(ReadingEntryResponse::from).collect();
        Event::default().json_data(&payload)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// The signed-in user and how many books they have added.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The current profile", body = ProfileResponse),
        (status = 401, description = "No user is signed in")
    )
)]
pub async fn profile_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(user) = app_state.session.current_user().await else {
        return Err((StatusCode::UNAUTHORIZED, "no user signed in".to_string()));
    };

    let books_added = app_state.reading_list.book_count().await.map_err(|err| {
        error!("failed to count reading entries: {err}");
        (
            status_for_port_error(&err),
            "failed to load the profile".to_string(),
        )
    })?;

    Ok(Json(ProfileResponse {
        user_id: user.user_id,
        email: user.email,
        books_added,
    }))
}
