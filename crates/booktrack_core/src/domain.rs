//! crates/booktrack_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A single result from the external book catalog. Ephemeral: it only lives
/// for the duration of a search and is never persisted as-is.
#[derive(Debug, Clone)]
pub struct CatalogBook {
    pub id: String,
    pub title: String,
    pub authors: Option<Vec<String>>,
    pub thumbnail_url: Option<String>,
}

// The catalog assigns stable ids, so identity is the id alone.
impl PartialEq for CatalogBook {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CatalogBook {}

/// Where a tracked book sits in the user's reading life.
///
/// The canonical text form is lowercase (`to-read`, `reading`, `finished`)
/// and is what goes into the store and the remote mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingStatus {
    #[default]
    ToRead,
    Reading,
    Finished,
}

impl ReadingStatus {
    /// Parses a status regardless of input casing ("Reading" -> `Reading`).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "to-read" => Some(Self::ToRead),
            "reading" => Some(Self::Reading),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }

    /// The canonical lowercase form used for storage and the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToRead => "to-read",
            Self::Reading => "reading",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A display-side filter over the reading list. `All` is the identity filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReadingStatus),
}

impl StatusFilter {
    /// Parses `"all"` or any status, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        if input.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        ReadingStatus::parse(input).map(Self::Only)
    }

    pub fn matches(&self, status: ReadingStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

/// The durable, user-owned record of a tracked book.
///
/// Created exactly once by the coordinator from a `CatalogBook` plus the
/// user-entered status/progress/review. There is no update or delete path;
/// `added_date` is stamped at creation and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingEntry {
    pub id: String,
    pub title: String,
    /// Authors flattened to a single display string at creation time
    /// ("Frank Herbert, Brian Herbert"). Absent stays absent; the "Unknown"
    /// fallback is a display concern.
    pub authors: Option<String>,
    pub thumbnail: Option<String>,
    pub status: ReadingStatus,
    /// Fraction read, in [0.0, 1.0]. Quantization is left to the input control.
    pub progress: f64,
    pub review: String,
    pub added_date: DateTime<Utc>,
}

/// Rewrites a plain `http://` thumbnail URL to `https://`.
///
/// Idempotent: an already-secure URL (or anything else) passes through
/// untouched.
pub fn normalize_thumbnail(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(ReadingStatus::parse("Reading"), Some(ReadingStatus::Reading));
        assert_eq!(ReadingStatus::parse("TO-READ"), Some(ReadingStatus::ToRead));
        assert_eq!(ReadingStatus::parse("finished"), Some(ReadingStatus::Finished));
        assert_eq!(ReadingStatus::parse("  Finished "), Some(ReadingStatus::Finished));
        assert_eq!(ReadingStatus::parse("abandoned"), None);
    }

    #[test]
    fn status_canonical_form_is_lowercase() {
        for input in ["Reading", "reading", "READING"] {
            let status = ReadingStatus::parse(input).unwrap();
            assert_eq!(status.as_str(), "reading");
        }
    }

    #[test]
    fn filter_all_matches_everything() {
        let filter = StatusFilter::parse("All").unwrap();
        assert_eq!(filter, StatusFilter::All);
        assert!(filter.matches(ReadingStatus::ToRead));
        assert!(filter.matches(ReadingStatus::Reading));
        assert!(filter.matches(ReadingStatus::Finished));
    }

    #[test]
    fn filter_only_matches_its_status() {
        let filter = StatusFilter::parse("reading").unwrap();
        assert!(filter.matches(ReadingStatus::Reading));
        assert!(!filter.matches(ReadingStatus::Finished));
        assert_eq!(StatusFilter::parse("shelved"), None);
    }

    #[test]
    fn thumbnail_normalization_is_idempotent() {
        assert_eq!(normalize_thumbnail("http://img/x.jpg"), "https://img/x.jpg");
        assert_eq!(normalize_thumbnail("https://img/x.jpg"), "https://img/x.jpg");
        assert_eq!(
            normalize_thumbnail(&normalize_thumbnail("http://img/x.jpg")),
            "https://img/x.jpg"
        );
        // Not a URL we recognize: leave it alone.
        assert_eq!(normalize_thumbnail("ftp://img/x.jpg"), "ftp://img/x.jpg");
    }

    #[test]
    fn catalog_books_compare_by_id_alone() {
        let a = CatalogBook {
            id: "abc123".to_string(),
            title: "Dune".to_string(),
            authors: Some(vec!["Frank Herbert".to_string()]),
            thumbnail_url: None,
        };
        let b = CatalogBook {
            id: "abc123".to_string(),
            title: "Dune (Anniversary Edition)".to_string(),
            authors: None,
            thumbnail_url: Some("https://img/x.jpg".to_string()),
        };
        assert_eq!(a, b);
    }
}
