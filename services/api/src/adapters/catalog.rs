//! services/api/src/adapters/catalog.rs
//!
//! This module contains the adapter for the public book-catalog search API.
//! It implements the `CatalogService` port from the `core` crate.

use async_trait::async_trait;
use booktrack_core::domain::CatalogBook;
use booktrack_core::ports::{CatalogService, PortError, PortResult};
use serde::Deserialize;

//=========================================================================================
// Wire Format
//=========================================================================================

// The catalog's response shape: `items` is absent when nothing matched.

#[derive(Deserialize)]
struct VolumeList {
    items: Option<Vec<Volume>>,
}

#[derive(Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Deserialize)]
struct VolumeInfo {
    title: String,
    authors: Option<Vec<String>>,
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

#[derive(Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl Volume {
    fn into_domain(self) -> CatalogBook {
        CatalogBook {
            id: self.id,
            title: self.volume_info.title,
            authors: self.volume_info.authors,
            thumbnail_url: self.volume_info.image_links.and_then(|links| links.thumbnail),
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CatalogService` port against a
/// Google-Books-style volumes endpoint.
#[derive(Clone)]
pub struct GoogleBooksAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleBooksAdapter {
    /// Creates a new `GoogleBooksAdapter`.
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogService for GoogleBooksAdapter {
    /// Issues a single search request and maps the response into domain records.
    ///
    /// A blank query never touches the network. Transport failures map to
    /// `PortError::Network`, an undecodable body to `PortError::Decode`.
    /// There is no retry, caching, or pagination.
    async fn search(&self, query: &str) -> PortResult<Vec<CatalogBook>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/volumes", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Network(e.to_string()))?;

        let page: VolumeList = response
            .json()
            .await
            .map_err(|e| PortError::Decode(e.to_string()))?;

        // A record without a catalog id cannot be tracked; drop it.
        Ok(page
            .items
            .unwrap_or_default()
            .into_iter()
            .filter(|volume| !volume.id.is_empty())
            .map(Volume::into_domain)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_query_short_circuits_without_a_network_call() {
        // The base URL is unroutable; an attempted request would error out.
        let adapter = GoogleBooksAdapter::new(
            reqwest::Client::new(),
            "http://127.0.0.1:0".to_string(),
        );

        assert!(adapter.search("").await.unwrap().is_empty());
        assert!(adapter.search("   ").await.unwrap().is_empty());
    }

    #[test]
    fn decodes_a_full_volume_list() {
        let body = r#"{
            "items": [
                {
                    "id": "abc123",
                    "volumeInfo": {
                        "title": "Dune",
                        "authors": ["Frank Herbert"],
                        "imageLinks": { "thumbnail": "http://img/x.jpg" }
                    }
                }
            ]
        }"#;

        let page: VolumeList = serde_json::from_str(body).unwrap();
        let books: Vec<CatalogBook> = page
            .items
            .unwrap()
            .into_iter()
            .map(Volume::into_domain)
            .collect();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "abc123");
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[0].authors.as_deref(), Some(&["Frank Herbert".to_string()][..]));
        assert_eq!(books[0].thumbnail_url.as_deref(), Some("http://img/x.jpg"));
    }

    #[test]
    fn absent_items_field_is_an_empty_result() {
        let page: VolumeList = serde_json::from_str(r#"{ "kind": "books#volumes" }"#).unwrap();
        assert!(page.items.is_none());
    }

    #[test]
    fn absent_authors_and_image_links_stay_absent() {
        let body = r#"{
            "items": [
                { "id": "xyz", "volumeInfo": { "title": "Anonymous Work" } }
            ]
        }"#;

        let page: VolumeList = serde_json::from_str(body).unwrap();
        let book = page.items.unwrap().remove(0).into_domain();
        assert_eq!(book.authors, None);
        assert_eq!(book.thumbnail_url, None);
    }

    #[test]
    fn malformed_body_fails_to_decode() {
        let result: Result<VolumeList, _> = serde_json::from_str(r#"{ "items": "nope" }"#);
        assert!(result.is_err());
    }
}
