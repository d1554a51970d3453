pub mod config;
mod editor;
pub mod persistence;

pub use config::EditorConfig;
pub use editor::EditorContext;
pub use persistence::{DraftFile, PersistenceError, PersistenceResult};
