//! Client for the remote book catalog service.
//!
//! The catalog is read-only to us: fetch by id, fetch by curated status
//! rail, and author-or-title search, all plain JSON over HTTPS. Network and
//! parse failures collapse to empty results so views degrade to an empty
//! state instead of crashing; nothing here is fatal.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A catalog book as served by the remote API. Immutable from our side;
/// fetched, never written back. Field names stay camelCase on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub sub_title: String,
    pub book_description: String,
    pub author_description: String,
    pub image_link: String,
    pub audio_link: String,
    pub average_rating: f64,
    pub total_rating: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub key_points: Vec<String>,
    pub tags: Vec<String>,
    pub subscription_required: bool,
    /// Audio length in seconds.
    pub audio_length: f64,
    pub summary: String,
}

/// Curated status rails the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Selected,
    Recommended,
    Suggested,
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_query_str())
    }
}

impl BookStatus {
    /// Value of the `status` query parameter for this rail.
    pub fn as_query_str(self) -> &'static str {
        match self {
            BookStatus::Selected => "selected",
            BookStatus::Recommended => "recommended",
            BookStatus::Suggested => "suggested",
        }
    }
}

/// Read access to the catalog. Views depend on this trait so tests can
/// substitute a canned catalog without a socket.
pub trait Catalog: Send + Sync {
    /// Single book by id; `None` means not found (or unreachable).
    fn book(&self, id: &str) -> Option<Book>;
    /// All books on one status rail, in service order.
    fn books_by_status(&self, status: BookStatus) -> Vec<Book>;
    /// Author-or-title search; matching semantics live on the service.
    fn search(&self, query: &str) -> Vec<Book>;
}

/// HTTP implementation against the cloud-function endpoints.
pub struct HttpCatalog {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("Failed to build the catalog HTTP client")?;
        let base_url = base_url.into();
        Ok(HttpCatalog {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn fetch(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .with_context(|| format!("Request to {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("Request to {endpoint} was rejected"))?;
        let body = response
            .text()
            .with_context(|| format!("Reading the {endpoint} response failed"))?;
        debug!(endpoint, bytes = body.len(), "Fetched catalog payload");
        Ok(body)
    }
}

impl Catalog for HttpCatalog {
    fn book(&self, id: &str) -> Option<Book> {
        let raw = match self.fetch("getBook", &[("id", id)]) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(id, "Book lookup failed: {err:#}");
                return None;
            }
        };
        match decode_book(&raw) {
            Ok(book) => Some(book),
            Err(err) => {
                warn!(id, "Book payload unreadable: {err:#}");
                None
            }
        }
    }

    fn books_by_status(&self, status: BookStatus) -> Vec<Book> {
        let raw = match self.fetch("getBooks", &[("status", status.as_query_str())]) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%status, "Status rail fetch failed: {err:#}");
                return Vec::new();
            }
        };
        match decode_book_list(&raw) {
            Ok(books) => books,
            Err(err) => {
                warn!(%status, "Status rail payload unreadable: {err:#}");
                Vec::new()
            }
        }
    }

    fn search(&self, query: &str) -> Vec<Book> {
        let raw = match self.fetch("getBooksByAuthorOrTitle", &[("search", query)]) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(query, "Search failed: {err:#}");
                return Vec::new();
            }
        };
        match decode_book_list(&raw) {
            Ok(books) => books,
            Err(err) => {
                warn!(query, "Search payload unreadable: {err:#}");
                Vec::new()
            }
        }
    }
}

fn decode_book(raw: &str) -> Result<Book> {
    serde_json::from_str(raw).context("Not a book object")
}

fn decode_book_list(raw: &str) -> Result<Vec<Book>> {
    serde_json::from_str(raw).context("Not a book array")
}
