//! Per-view application facade.
//!
//! Each page view maps to one method here: the method gates on the session,
//! performs that view's fetches, and returns a typed view model for the
//! rendering layer. Auth, shelf, and playback wiring shared by several views
//! lives here once instead of being repeated per page.

use crate::catalog::{Book, BookStatus, Catalog};
use crate::library::{FinishedEntry, FinishedStore, LibraryEntry, LibraryStore};
use crate::player::{PlaybackController, PlaybackEvent, PlaybackSnapshot};
use crate::session::{SessionStore, User};
use crate::storage::Storage;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Number of skeleton cards the recommended rail shows instead of nothing.
pub const RECOMMENDED_PLACEHOLDER_COUNT: usize = 6;

/// Errors a view method can surface. The rendering layer maps
/// `NotSignedIn` to a redirect to the landing view.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Book not found")]
    BookNotFound,
}

/// Plans offered on the pricing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Yearly,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
        };
        write!(f, "{}", label)
    }
}

/// Home rails: one spotlight pick plus the two list rails.
#[derive(Debug, Clone, Serialize)]
pub struct ForYouView {
    pub selected: Option<Book>,
    pub recommended: Vec<Book>,
    pub suggested: Vec<Book>,
    /// Skeleton-card count for an empty recommended rail; zero when the
    /// rail has books.
    pub recommended_placeholders: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetailView {
    pub book: Book,
    pub in_library: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryView {
    pub saved: Vec<LibraryEntry>,
    pub finished: Vec<FinishedEntry>,
}

/// Settings is prompt-gated: signed out renders the sign-in prompt rather
/// than redirecting.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub user: Option<User>,
}

impl SettingsView {
    pub fn plan_label(&self) -> Option<&'static str> {
        self.user.as_ref().map(User::plan_label)
    }
}

/// Pricing is browsable signed out; subscribing is not.
#[derive(Debug, Clone, Serialize)]
pub struct PricingView {
    pub signed_in: bool,
    pub already_premium: bool,
}

/// The client application: stores plus catalog behind the view methods.
pub struct App {
    storage: Arc<dyn Storage>,
    session: SessionStore,
    library: LibraryStore,
    finished: FinishedStore,
    catalog: Box<dyn Catalog>,
}

impl App {
    pub fn new(storage: Arc<dyn Storage>, catalog: Box<dyn Catalog>) -> Self {
        App {
            session: SessionStore::new(storage.clone()),
            library: LibraryStore::library(storage.clone()),
            finished: FinishedStore::finished(storage.clone()),
            storage,
            catalog,
        }
    }

    /// Auth entry points for the landing view live on the session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn require_session(&self) -> Result<User, ViewError> {
        self.session.current_user().ok_or(ViewError::NotSignedIn)
    }

    /// Home rails. Gated; no fetch is issued when signed out.
    pub fn for_you(&self) -> Result<ForYouView, ViewError> {
        self.require_session()?;
        let selected = self
            .catalog
            .books_by_status(BookStatus::Selected)
            .into_iter()
            .next();
        let recommended = self.catalog.books_by_status(BookStatus::Recommended);
        let suggested = self.catalog.books_by_status(BookStatus::Suggested);
        let recommended_placeholders = if recommended.is_empty() {
            RECOMMENDED_PLACEHOLDER_COUNT
        } else {
            0
        };
        Ok(ForYouView {
            selected,
            recommended,
            suggested,
            recommended_placeholders,
        })
    }

    /// Author-or-title search. Blank queries resolve empty without touching
    /// the network.
    pub fn search(&self, query: &str) -> Result<Vec<Book>, ViewError> {
        self.require_session()?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.catalog.search(query))
    }

    pub fn book_detail(&self, id: &str) -> Result<BookDetailView, ViewError> {
        self.require_session()?;
        let book = self.catalog.book(id).ok_or(ViewError::BookNotFound)?;
        let in_library = self.library.contains(&book.id);
        Ok(BookDetailView { book, in_library })
    }

    /// Save to the library; true when the shelf changed.
    pub fn save_book(&self, book: &Book) -> Result<bool, ViewError> {
        self.require_session()?;
        Ok(self.library.add(LibraryEntry::from(book)))
    }

    pub fn remove_saved(&self, id: &str) -> Result<bool, ViewError> {
        self.require_session()?;
        Ok(self.library.remove(id))
    }

    /// Drop a book from the finished shelf; true when the shelf changed.
    pub fn remove_finished(&self, id: &str) -> Result<bool, ViewError> {
        self.require_session()?;
        Ok(self.finished.remove(id))
    }

    /// Open the player for a book. The suggested rail is scanned before the
    /// by-id endpoint.
    pub fn player(&self, id: &str) -> Result<PlayerSession, ViewError> {
        self.require_session()?;
        let book = self
            .catalog
            .books_by_status(BookStatus::Suggested)
            .into_iter()
            .find(|book| book.id == id)
            .or_else(|| self.catalog.book(id))
            .ok_or(ViewError::BookNotFound)?;
        let mut controller = PlaybackController::new();
        controller.load(book.audio_link.clone());
        Ok(PlayerSession {
            book,
            controller,
            finished: FinishedStore::finished(self.storage.clone()),
        })
    }

    pub fn library_view(&self) -> Result<LibraryView, ViewError> {
        self.require_session()?;
        Ok(LibraryView {
            saved: self.library.list(),
            finished: self.finished.list(),
        })
    }

    pub fn settings(&self) -> SettingsView {
        SettingsView {
            user: self.session.current_user(),
        }
    }

    pub fn pricing(&self) -> PricingView {
        let user = self.session.current_user();
        PricingView {
            signed_in: user.is_some(),
            already_premium: user.map(|user| user.is_premium).unwrap_or(false),
        }
    }

    pub fn subscribe(&self, plan: Plan) -> Result<User, ViewError> {
        let user = self
            .session
            .upgrade_to_premium()
            .ok_or(ViewError::NotSignedIn)?;
        info!(%plan, email = %user.email, "Subscribed");
        Ok(user)
    }

    pub fn logout(&self) {
        self.session.logout();
    }
}

/// One open player view: the resolved book, its transport, and the wiring
/// that files the book as finished when playback completes naturally.
pub struct PlayerSession {
    book: Book,
    controller: PlaybackController,
    finished: FinishedStore,
}

impl PlayerSession {
    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn play(&mut self) {
        self.controller.play();
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn seek(&mut self, target: f64) {
        self.controller.seek(target);
    }

    pub fn skip(&mut self, delta: f64) {
        self.controller.skip(delta);
    }

    pub fn metadata_loaded(&mut self, duration: f64) {
        self.controller.metadata_loaded(duration);
    }

    /// Media notification: natural end of the audio.
    pub fn ended(&mut self) {
        let event = self.controller.ended();
        self.apply(event);
    }

    /// Clock observation; files completion if the end was played through.
    pub fn poll(&mut self) {
        let event = self.controller.poll();
        self.apply(event);
    }

    fn apply(&mut self, event: Option<PlaybackEvent>) {
        if let Some(PlaybackEvent::Completed) = event {
            let filed = self
                .finished
                .add(FinishedEntry::new(&self.book, Utc::now()));
            if filed {
                info!(id = %self.book.id, title = %self.book.title, "Marked finished");
            }
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.controller.snapshot()
    }
}
