//! Element drafts saved as JSON, so an annotation session survives a restart.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Document;
use crate::element::Element;
use crate::util::time;

pub const DRAFT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to (de)serialize draft: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to access draft file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid draft: {0}")]
    InvalidState(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Saved elements of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFile {
    pub version: u32,
    /// Seconds since the UNIX epoch.
    pub timestamp: u64,
    pub elements: Vec<Element>,
}

impl DraftFile {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            version: DRAFT_VERSION,
            timestamp: time::timestamp_secs(),
            elements,
        }
    }

    pub fn from_document(document: &Document) -> Self {
        Self::new(document.elements().to_vec())
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let draft: Self = serde_json::from_str(json)?;
        if draft.version > DRAFT_VERSION {
            return Err(PersistenceError::InvalidState(format!(
                "draft version {} is newer than supported version {DRAFT_VERSION}",
                draft.version
            )));
        }
        Ok(draft)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_json()?)?;
        info!("saved {} element(s) to {}", self.elements.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Check every element against the document's pages and hand back the elements.
    pub fn validated_for(self, document: &Document) -> PersistenceResult<Vec<Element>> {
        if let Some(orphan) = self.elements.iter().find(|e| !document.accepts(e)) {
            warn!("draft element {} is bound to a missing page", orphan.id);
            return Err(PersistenceError::InvalidState(format!(
                "element {} is bound to page {:?} but the document has {} page(s)",
                orphan.id,
                orphan.page,
                document.page_count()
            )));
        }
        Ok(self.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ImageBytes, TextStyle, factory};
    use crate::geometry::{PageSize, Position};

    fn sample() -> DraftFile {
        DraftFile::new(vec![
            factory::create_text(1, Position::new(10.0, 20.0), "hello", TextStyle::default()),
            factory::create_image(2, Position::ZERO, Some(ImageBytes::new(vec![137, 80, 78, 71]))),
        ])
    }

    #[test]
    fn test_json_round_trip() {
        let draft = sample();
        let back = DraftFile::from_json(&draft.to_json().unwrap()).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut draft = sample();
        draft.version = DRAFT_VERSION + 1;
        let err = DraftFile::from_json(&draft.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidState(_)));
    }

    #[test]
    fn test_page_bounds_validated() {
        let one_page = Document::new(vec![PageSize::LETTER]);
        assert!(matches!(sample().validated_for(&one_page), Err(PersistenceError::InvalidState(_))));

        let two_pages = Document::new(vec![PageSize::LETTER; 2]);
        assert_eq!(sample().validated_for(&two_pages).unwrap().len(), 2);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("pdf_overlay_draft_{}.json", std::process::id()));
        let draft = sample();
        draft.save(&path).unwrap();
        assert_eq!(DraftFile::load(&path).unwrap(), draft);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_garbage_is_a_serialization_error() {
        assert!(matches!(DraftFile::from_json("{"), Err(PersistenceError::Serialization(_))));
    }
}
