use egui::{Color32, ColorImage};
use futures::FutureExt;
use futures::executor::block_on;
use futures::future::BoxFuture;
use pdf_overlay::element::{Element, TextStyle, factory};
use pdf_overlay::error::{ExportError, RasterError, SearchError};
use pdf_overlay::export::{DrawOp, ExportPlan, PageTarget, PdfMutator, export};
use pdf_overlay::raster::{RasterScheduler, Rasterizer};
use pdf_overlay::redaction::{SearchOptions, TextExtractor, TextRun, redactions_for, search_document};
use pdf_overlay::state::DraftFile;
use pdf_overlay::{Document, EditorConfig, EditorContext, PageSize, Position, Size, ToolSettings};

fn annotated() -> Document {
    let mut doc = Document::new(vec![PageSize::LETTER, PageSize::LETTER]);
    let store = doc.elements_mut();
    store.add(factory::create_text(1, Position::new(10.0, 10.0), "note", TextStyle::default()));
    store.add(factory::create_arrow(2, Position::new(10.0, 10.0), Position::new(50.0, 10.0), Color32::RED, 2.0));
    store.add(factory::create_watermark(
        None,
        Position::new(30.0, 40.0),
        Size::new(40.0, 20.0),
        "CONFIDENTIAL",
        TextStyle::default(),
        false,
    ));
    store.add(factory::create_redaction(2, Position::new(0.0, 0.0), Size::new(10.0, 5.0), Color32::BLACK));
    doc
}

#[test]
fn elements_survive_a_json_round_trip() {
    let elements = annotated().elements().to_vec();
    let json = serde_json::to_string(&elements).unwrap();
    let back: Vec<Element> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, elements);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["type"], "text");
    assert_eq!(value[0]["fontSize"], 24.0);
    assert!(value[2].get("page").is_none());
}

#[test]
fn drafts_restore_into_a_matching_document() {
    let doc = annotated();
    let json = DraftFile::from_document(&doc).to_json().unwrap();
    let restored = DraftFile::from_json(&json).unwrap().validated_for(&doc).unwrap();
    assert_eq!(restored, doc.elements().to_vec());

    let single = Document::new(vec![PageSize::LETTER]);
    assert!(DraftFile::from_json(&json).unwrap().validated_for(&single).is_err());
}

#[test]
fn export_groups_page_less_elements_separately() {
    let plan = ExportPlan::build(&annotated(), &EditorConfig::default()).unwrap();
    let targets: Vec<_> = plan.groups.iter().map(|g| g.target).collect();
    assert_eq!(targets, vec![PageTarget::All, PageTarget::Page(1), PageTarget::Page(2)]);

    let page2 = plan.group(PageTarget::Page(2)).unwrap();
    assert!(matches!(page2.instructions[0].op, DrawOp::Arrow { .. }));
    let DrawOp::Redaction { rect, .. } = &page2.instructions[1].op else {
        panic!("expected a redaction");
    };
    // Top edge of the page: y + height = 792.
    assert!((rect.y + rect.height - 792.0).abs() < 1e-3);
}

struct Echo;

impl PdfMutator for Echo {
    fn apply(&self, original: Vec<u8>, plan: ExportPlan) -> BoxFuture<'static, Result<Vec<u8>, ExportError>> {
        let result = plan
            .to_json()
            .map(|json| [original, json.into_bytes()].concat());
        futures::future::ready(result).boxed()
    }
}

#[test]
fn export_hands_the_plan_to_the_backend() {
    let doc = annotated();
    let bytes = block_on(export(&doc, &EditorConfig::default(), b"%PDF-1.7", &Echo)).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7{"));
}

struct Pending;

impl Rasterizer for Pending {
    fn rasterize(&self, _page: u32, _scale: f32) -> BoxFuture<'static, Result<ColorImage, RasterError>> {
        futures::future::pending().boxed()
    }
}

#[test]
fn superseded_rasters_resolve_as_cancelled() {
    let scheduler = RasterScheduler::new(2);
    let first = scheduler.request(1, 1.0, &Pending);
    let _second = scheduler.request(1, 1.5, &Pending);
    assert!(matches!(block_on(first), Ok(None)));

    let third = scheduler.request(2, 1.0, &Pending);
    assert_eq!(scheduler.set_page_count(4), 2);
    assert!(matches!(block_on(third), Ok(None)));
    assert_eq!(scheduler.outstanding(), 0);
}

struct Lines(Vec<TextRun>);

impl TextExtractor for Lines {
    fn extract(&self, _page: u32) -> BoxFuture<'static, Result<Vec<TextRun>, SearchError>> {
        futures::future::ready(Ok(self.0.clone())).boxed()
    }
}

#[test]
fn find_and_redact_adds_one_undo_step() {
    let extractor = Lines(vec![TextRun {
        text: "Account 1234-5678 closed".to_owned(),
        transform: [1.0, 0.0, 0.0, 12.0, 72.0, 700.0],
        width: 144.0,
        height: 12.0,
    }]);
    let mut editor = EditorContext::new(
        Document::new(vec![PageSize::LETTER]),
        EditorConfig::default(),
        ToolSettings::default(),
    );
    let options = SearchOptions {
        regex: true,
        ..Default::default()
    };
    let pages = [(1, PageSize::LETTER)];

    let err = block_on(search_document(&extractor, &pages, "[0-9", &options)).unwrap_err();
    assert!(matches!(err, SearchError::InvalidPattern { .. }));
    assert!(editor.document().elements().is_empty());

    let matches = block_on(search_document(&extractor, &pages, r"\d{4}-\d{4}", &options)).unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].approximate);

    let added = editor.add_elements(redactions_for(&matches, Color32::BLACK)).unwrap();
    assert_eq!(added, 1);
    assert!(editor.undo());
    assert!(editor.document().elements().is_empty());
}
