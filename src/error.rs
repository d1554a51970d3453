use thiserror::Error;

/// Why a PDF could not be opened. Each category points the user at a different fix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("the PDF file appears to be corrupted: {0}")]
    Corrupted(String),

    #[error("the PDF is password protected: {0}")]
    PasswordProtected(String),

    #[error("the PDF is encrypted: {0}")]
    Encrypted(String),

    #[error("failed to load PDF: {0}")]
    Other(String),
}

/// A companion tool that can fix the input before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remedy {
    Repair,
    Unlock,
}

impl LoadError {
    /// Sort a loader message into a category.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("corrupted") || lower.contains("invalid pdf structure") {
            LoadError::Corrupted(message)
        } else if lower.contains("password") {
            LoadError::PasswordProtected(message)
        } else if lower.contains("encrypted") {
            LoadError::Encrypted(message)
        } else {
            LoadError::Other(message)
        }
    }

    pub fn remedy(&self) -> Option<Remedy> {
        match self {
            LoadError::Corrupted(_) => Some(Remedy::Repair),
            LoadError::PasswordProtected(_) | LoadError::Encrypted(_) => Some(Remedy::Unlock),
            LoadError::Other(_) => None,
        }
    }

    /// Hint shown next to the error.
    pub fn hint(&self) -> &'static str {
        match self.remedy() {
            Some(Remedy::Repair) => "Try using the Repair PDF tool first.",
            Some(Remedy::Unlock) => "Please use the Unlock PDF tool first.",
            None => "Please try again.",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid search pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("text extraction failed on page {page}: {reason}")]
    Extraction { page: u32, reason: String },
}

/// Failure of an export. The element model is never touched by an export; retryable
/// failures can be resubmitted with the same plan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("backend failed: {0}")]
    Backend(String),

    #[error("page {0} is missing from the source document")]
    MissingPage(u32),

    #[error("unsupported embedded image")]
    UnsupportedImage,

    #[error("could not encode instructions: {0}")]
    Encode(String),
}

impl ExportError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ExportError::Backend(_) => true,
            ExportError::MissingPage(_) | ExportError::UnsupportedImage | ExportError::Encode(_) => false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("page {0} does not exist")]
    PageOutOfRange(u32),

    #[error("rasterizer failed: {0}")]
    Backend(String),
}

/// Errors that can occur while turning element content into a texture.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextureGenerationError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("invalid texture dimensions")]
    InvalidDimensions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_classification() {
        let corrupted = LoadError::classify("Invalid PDF structure at offset 12");
        assert!(matches!(corrupted, LoadError::Corrupted(_)));
        assert_eq!(corrupted.remedy(), Some(Remedy::Repair));

        let locked = LoadError::classify("Document requires a password");
        assert!(matches!(locked, LoadError::PasswordProtected(_)));
        assert_eq!(locked.remedy(), Some(Remedy::Unlock));

        let encrypted = LoadError::classify("Input document is encrypted");
        assert!(matches!(encrypted, LoadError::Encrypted(_)));
        assert_eq!(encrypted.remedy(), Some(Remedy::Unlock));

        let other = LoadError::classify("network down");
        assert_eq!(other.remedy(), None);
        assert_eq!(other.to_string(), "failed to load PDF: network down");
    }

    #[test]
    fn test_export_retry() {
        assert!(ExportError::Backend("io".into()).is_retryable());
        assert!(!ExportError::UnsupportedImage.is_retryable());
        assert!(!ExportError::MissingPage(4).is_retryable());
    }
}
