//! Find & redact: text search over extracted page runs, mapped to redaction boxes.

pub mod search;

pub use search::{
    MATCH_PADDING, SearchOptions, TextExtractor, TextMatch, TextRun, compile, find_matches, redactions_for,
    search_document,
};
