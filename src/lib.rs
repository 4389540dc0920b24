//! Briefcast client core: mock local auth, a remote book-summary catalog,
//! persisted library and finished shelves, and playback transport state,
//! composed into per-view facade methods.
//!
//! The binary in `main.rs` drives [`app::App`] from a line-oriented shell;
//! a richer front end would consume the same facade.

pub mod app;
pub mod catalog;
pub mod config;
pub mod library;
pub mod player;
pub mod session;
pub mod storage;

pub use app::{App, Plan, PlayerSession, ViewError};
pub use catalog::{Book, BookStatus, Catalog, HttpCatalog};
pub use config::{AppConfig, LogLevel, load_config};
pub use library::{FinishedEntry, FinishedStore, LibraryEntry, LibraryStore};
pub use player::{PlaybackController, PlaybackPhase, PlaybackSnapshot, format_time};
pub use session::{AuthError, Credentials, SessionStore, User};
pub use storage::{DiskStorage, MemoryStorage, Storage};
