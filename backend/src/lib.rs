//! In-memory trivia question store and the small web frontend around it.

pub mod colors;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod loader;
pub mod question_store;
pub mod record;
pub mod reload;
pub mod render;
pub mod watcher;

pub use colors::{Color, ColorResolver};
pub use error::{Diagnostic, DiagnosticSink, TriviaError};
pub use loader::LoadOptions;
pub use question_store::{QuestionStore, ReloadSummary, Snapshot};
pub use record::{Category, Record, RecordId};
