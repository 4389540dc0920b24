//! Saved-books and finished-books collections.
//!
//! Both shelves share one contract: insertion-ordered, at most one entry per
//! book id, `add` is idempotent and `remove` is a no-op when absent. The two
//! are independent; a book may sit on both at once.

use crate::catalog::Book;
use crate::storage::{self, FINISHED_KEY, LIBRARY_KEY, Storage};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Projection of a catalog book kept in the saved-books list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub image_link: String,
    pub sub_title: String,
    pub average_rating: f64,
}

impl From<&Book> for LibraryEntry {
    fn from(book: &Book) -> Self {
        LibraryEntry {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            image_link: book.image_link.clone(),
            sub_title: book.sub_title.clone(),
            average_rating: book.average_rating,
        }
    }
}

/// Same projection plus the moment playback naturally completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub image_link: String,
    pub sub_title: String,
    pub average_rating: f64,
    pub finished_at: DateTime<Utc>,
}

impl FinishedEntry {
    pub fn new(book: &Book, finished_at: DateTime<Utc>) -> Self {
        FinishedEntry {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            image_link: book.image_link.clone(),
            sub_title: book.sub_title.clone(),
            average_rating: book.average_rating,
            finished_at,
        }
    }
}

/// Anything a shelf can hold; entries are keyed by book id.
pub trait ShelfEntry {
    fn id(&self) -> &str;
}

impl ShelfEntry for LibraryEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ShelfEntry for FinishedEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A persisted, insertion-ordered collection keyed by book id. Every
/// operation is read-modify-write against one storage key.
pub struct Shelf<T> {
    storage: Arc<dyn Storage>,
    key: &'static str,
    _entry: PhantomData<T>,
}

pub type LibraryStore = Shelf<LibraryEntry>;
pub type FinishedStore = Shelf<FinishedEntry>;

impl Shelf<LibraryEntry> {
    pub fn library(storage: Arc<dyn Storage>) -> Self {
        Shelf::new(storage, LIBRARY_KEY)
    }
}

impl Shelf<FinishedEntry> {
    pub fn finished(storage: Arc<dyn Storage>) -> Self {
        Shelf::new(storage, FINISHED_KEY)
    }
}

impl<T> Shelf<T>
where
    T: ShelfEntry + Serialize + DeserializeOwned,
{
    fn new(storage: Arc<dyn Storage>, key: &'static str) -> Self {
        Shelf {
            storage,
            key,
            _entry: PhantomData,
        }
    }

    /// Entries in insertion order. An absent or unreadable document is an
    /// empty shelf.
    pub fn list(&self) -> Vec<T> {
        storage::read_json(self.storage.as_ref(), self.key).unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.list().iter().any(|entry| entry.id() == id)
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Appends unless an entry with the same id already exists. Returns
    /// whether the shelf changed.
    pub fn add(&self, entry: T) -> bool {
        let mut entries = self.list();
        if entries.iter().any(|existing| existing.id() == entry.id()) {
            debug!(key = self.key, id = entry.id(), "Already shelved; skipping");
            return false;
        }
        debug!(key = self.key, id = entry.id(), "Shelving");
        entries.push(entry);
        storage::write_json(self.storage.as_ref(), self.key, &entries);
        true
    }

    /// Removes the entry with `id` if present. Returns whether the shelf
    /// changed.
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|entry| entry.id() != id);
        if entries.len() == before {
            return false;
        }
        debug!(key = self.key, id, "Unshelved");
        storage::write_json(self.storage.as_ref(), self.key, &entries);
        true
    }
}
