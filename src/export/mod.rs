//! Translating the element model into instructions for a PDF mutation backend.

mod plan;

use futures::future::BoxFuture;
use log::{info, warn};

use crate::document::Document;
use crate::error::ExportError;
use crate::state::EditorConfig;

pub use plan::{DrawOp, ExportInstruction, ExportPlan, PageInstructions, PageTarget, TextAttributes};

/// Applies an export plan to the original PDF bytes.
pub trait PdfMutator {
    fn apply(&self, original: Vec<u8>, plan: ExportPlan) -> BoxFuture<'static, Result<Vec<u8>, ExportError>>;
}

/// Build the plan for `document` and hand it to `mutator`. The document is only
/// read; on failure it is exactly as before and the call can be repeated.
pub async fn export(
    document: &Document,
    config: &EditorConfig,
    original: &[u8],
    mutator: &dyn PdfMutator,
) -> Result<Vec<u8>, ExportError> {
    let plan = ExportPlan::build(document, config)?;
    let count = plan.instruction_count();
    match mutator.apply(original.to_vec(), plan).await {
        Ok(bytes) => {
            info!("exported {count} instruction(s), {} bytes", bytes.len());
            Ok(bytes)
        }
        Err(err) => {
            warn!("export failed (retryable: {}): {err}", err.is_retryable());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{TextStyle, factory};
    use crate::geometry::{PageSize, Position};
    use futures::FutureExt;
    use futures::executor::block_on;
    use parking_lot::Mutex;

    /// Records the plans it receives and fails the first call.
    struct Flaky {
        calls: Mutex<Vec<ExportPlan>>,
    }

    impl PdfMutator for Flaky {
        fn apply(&self, original: Vec<u8>, plan: ExportPlan) -> BoxFuture<'static, Result<Vec<u8>, ExportError>> {
            let mut calls = self.calls.lock();
            calls.push(plan);
            let result = if calls.len() == 1 {
                Err(ExportError::Backend("timeout".into()))
            } else {
                Ok([original, b"%%EOF".to_vec()].concat())
            };
            futures::future::ready(result).boxed()
        }
    }

    #[test]
    fn test_failed_export_can_be_retried() {
        let mut doc = Document::new(vec![PageSize::LETTER]);
        doc.elements_mut()
            .add(factory::create_text(1, Position::new(5.0, 5.0), "hi", TextStyle::default()));
        let before = doc.clone();
        let config = EditorConfig::default();
        let mutator = Flaky {
            calls: Mutex::new(Vec::new()),
        };

        let err = block_on(export(&doc, &config, b"%PDF", &mutator)).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(doc, before);

        let bytes = block_on(export(&doc, &config, b"%PDF", &mutator)).unwrap();
        assert_eq!(bytes, b"%PDF%%EOF".to_vec());

        let calls = mutator.calls.lock();
        assert_eq!(calls[0], calls[1]);
    }
}
