mod commands;
mod history;

use thiserror::Error;

use crate::id_generator::ElementId;

pub use commands::Command;
pub use history::{ChangeOrigin, HistoryManager, HistoryState};

/// `Ok(true)` when the command changed the document.
pub type CommandResult = Result<bool, CommandError>;

/// Reasons a command is refused. A refused command leaves the document untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("element {0} is held by an active gesture")]
    ElementBusy(ElementId),

    #[error("page {page} does not exist (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },
}
