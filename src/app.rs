use std::path::PathBuf;
use std::task::{Context, Poll};

use egui::{Color32, ColorImage};
use futures::FutureExt;
use futures::future::BoxFuture;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::document::{Document, PageSource};
use crate::error::{LoadError, RasterError, SearchError};
use crate::geometry::PageSize;
use crate::id_generator::ElementId;
use crate::input::{InputHandler, ShortcutAction, collect_shortcuts};
use crate::panels::{central_panel, tools_panel};
use crate::raster::{RasterQueue, Rasterizer, raster_scale};
use crate::redaction::{SearchOptions, TextExtractor, TextRun};
use crate::renderer::OverlayRenderer;
use crate::state::{EditorConfig, EditorContext};
use crate::tools::ToolSettings;

type PendingLoad = BoxFuture<'static, Result<Vec<PageSize>, LoadError>>;

/// What survives a restart: the editor tunables and the tool style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub config: EditorConfig,
    pub settings: ToolSettings,
}

/// Stand-in page backend for the demo: blank white pages with no text.
pub struct BlankPages {
    sizes: Vec<PageSize>,
}

impl BlankPages {
    pub fn new(sizes: Vec<PageSize>) -> Self {
        Self { sizes }
    }
}

impl PageSource for BlankPages {
    fn page_sizes(&self) -> BoxFuture<'static, Result<Vec<PageSize>, LoadError>> {
        let result = if self.sizes.is_empty() {
            Err(LoadError::Corrupted("document has no pages".to_owned()))
        } else {
            Ok(self.sizes.clone())
        };
        futures::future::ready(result).boxed()
    }
}

impl Rasterizer for BlankPages {
    fn rasterize(&self, page: u32, scale: f32) -> BoxFuture<'static, Result<ColorImage, RasterError>> {
        let result = page
            .checked_sub(1)
            .and_then(|index| self.sizes.get(index as usize))
            .map(|size| {
                let width = (size.width * scale).round().max(1.0) as usize;
                let height = (size.height * scale).round().max(1.0) as usize;
                ColorImage::new([width, height], Color32::WHITE)
            })
            .ok_or(RasterError::PageOutOfRange(page));
        futures::future::ready(result).boxed()
    }
}

impl TextExtractor for BlankPages {
    fn extract(&self, _page: u32) -> BoxFuture<'static, Result<Vec<TextRun>, SearchError>> {
        futures::future::ready(Ok(Vec::new())).boxed()
    }
}

/// Page geometry read from a JSON list of `{"width": .., "height": ..}` in points.
pub struct PageListFile {
    path: PathBuf,
}

impl PageListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageSource for PageListFile {
    fn page_sizes(&self) -> BoxFuture<'static, Result<Vec<PageSize>, LoadError>> {
        let result = std::fs::read_to_string(&self.path)
            .map_err(|err| LoadError::classify(format!("{}: {err}", self.path.display())))
            .and_then(|json| {
                serde_json::from_str::<Vec<PageSize>>(&json).map_err(|err| LoadError::Corrupted(err.to_string()))
            })
            .and_then(|sizes| {
                if sizes.is_empty() {
                    Err(LoadError::Corrupted("document has no pages".to_owned()))
                } else {
                    Ok(sizes)
                }
            });
        futures::future::ready(result).boxed()
    }
}

/// Find & redact form state.
#[derive(Debug, Default)]
pub struct SearchForm {
    pub query: String,
    pub options: SearchOptions,
    pub status: Option<String>,
}

pub struct PdfOverlayApp {
    pub(crate) editor: EditorContext,
    pub(crate) renderer: OverlayRenderer,
    pub(crate) input: InputHandler,
    pub(crate) pages: BlankPages,
    pub(crate) search: SearchForm,
    pub(crate) status: Option<String>,
    /// Why the last document failed to open; cleared by the next successful open.
    pub(crate) load_error: Option<LoadError>,
    /// Text being edited for the selected text element; committed on focus loss.
    pub(crate) text_draft: Option<(ElementId, String)>,
    rasters: RasterQueue,
    loading: Option<PendingLoad>,
}

impl Default for PdfOverlayApp {
    fn default() -> Self {
        Self::with_settings(PersistedSettings::default())
    }
}

impl PdfOverlayApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let persisted = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        Self::with_settings(persisted)
    }

    pub fn with_settings(persisted: PersistedSettings) -> Self {
        let sizes = vec![PageSize::LETTER, PageSize::A4, PageSize::LETTER];
        let editor = EditorContext::new(Document::new(sizes.clone()), persisted.config, persisted.settings);
        Self {
            rasters: RasterQueue::new(sizes.len() as u32),
            pages: BlankPages::new(sizes),
            editor,
            renderer: OverlayRenderer::new(),
            input: InputHandler::new(),
            search: SearchForm::default(),
            status: None,
            load_error: None,
            text_draft: None,
            loading: None,
        }
    }

    pub fn editor(&self) -> &EditorContext {
        &self.editor
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    /// Start opening a document. The current one stays until the geometry arrives;
    /// a failure leaves it untouched.
    pub fn open(&mut self, source: &dyn PageSource) {
        if self.loading.is_some() {
            info!("superseding a document load in progress");
        }
        self.loading = Some(source.page_sizes());
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    fn poll_loading(&mut self) {
        let Some(loading) = self.loading.as_mut() else {
            return;
        };
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let Poll::Ready(result) = loading.poll_unpin(&mut cx) else {
            return;
        };
        self.loading = None;
        match result {
            Ok(sizes) => {
                self.load_error = None;
                self.status = Some(format!("Opened {} page(s)", sizes.len()));
                self.open_pages(sizes);
            }
            Err(err) => {
                warn!("document load failed: {err}");
                self.status = Some(format!("{err}. {}", err.hint()));
                self.load_error = Some(err);
            }
        }
    }

    /// Swap in the geometry of another document; rasters in flight are abandoned.
    fn open_pages(&mut self, sizes: Vec<PageSize>) {
        let cancelled = self.rasters.reset(sizes.len() as u32);
        if cancelled > 0 {
            info!("cancelled {cancelled} raster(s) of the previous document");
        }
        self.pages = BlankPages::new(sizes.clone());
        self.editor.load_pages(sizes);
        self.renderer.surfaces_mut().clear();
    }

    /// Ask for a raster of `page` unless one at this scale is bound or on its way.
    pub(crate) fn ensure_raster(&mut self, page: u32, pixels_per_point: f32) {
        let scale = raster_scale(self.editor.document().zoom_percent(), pixels_per_point);
        self.rasters.ensure(page, scale, &self.pages);
    }

    /// Free the raster of a page scrolled out of view.
    pub(crate) fn release_raster(&mut self, page: u32) {
        self.rasters.forget(page);
        self.renderer.unbind_page(page);
    }

    fn poll_rasters(&mut self, ctx: &egui::Context) {
        for raster in self.rasters.poll() {
            self.renderer.bind_raster(ctx, raster);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        for action in collect_shortcuts(ctx) {
            let result = match action {
                ShortcutAction::Undo => Ok(self.editor.undo()),
                ShortcutAction::Redo => Ok(self.editor.redo()),
                ShortcutAction::DeleteSelection => self.editor.delete_selected(),
            };
            if let Err(err) = result {
                self.status = Some(err.to_string());
            }
        }
    }
}

impl eframe::App for PdfOverlayApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let persisted = PersistedSettings {
            config: self.editor.config().clone(),
            settings: self.editor.settings().clone(),
        };
        eframe::set_value(storage, eframe::APP_KEY, &persisted);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.renderer.begin_frame();
        self.input.begin_frame();
        self.poll_loading();
        self.poll_rasters(ctx);
        self.renderer.sync_elements(self.editor.document().elements());

        tools_panel(self, ctx);
        central_panel(self, ctx);

        // Page rects are known now; route this frame's pointer input against them.
        for event in self.input.process_input(ctx) {
            // Painting happens in points, so the pointer maps at one pixel per point.
            self.editor.handle_input(&event, &self.input, 1.0);
        }
        self.handle_shortcuts(ctx);

        if self.loading.is_some() || !self.rasters.is_idle() {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_blank_pages_rasterize_at_scale() {
        let pages = BlankPages::new(vec![PageSize::new(100.0, 50.0)]);
        let image = block_on(pages.rasterize(1, 2.0)).unwrap();
        assert_eq!(image.size, [200, 100]);
        assert_eq!(block_on(pages.rasterize(2, 1.0)).unwrap_err(), RasterError::PageOutOfRange(2));
    }

    #[test]
    fn test_open_resets_editor() {
        let mut app = PdfOverlayApp::default();
        app.open(&BlankPages::new(vec![PageSize::A4]));
        assert!(app.is_loading());
        app.poll_loading();
        assert!(!app.is_loading());
        assert_eq!(app.editor().document().page_count(), 1);
        assert_eq!(app.rasters.scheduler().page_count(), 1);
        assert!(app.load_error().is_none());
    }

    struct Refusing(&'static str);

    impl PageSource for Refusing {
        fn page_sizes(&self) -> BoxFuture<'static, Result<Vec<PageSize>, LoadError>> {
            futures::future::ready(Err(LoadError::classify(self.0))).boxed()
        }
    }

    #[test]
    fn test_failed_open_keeps_document_and_shows_hint() {
        let mut app = PdfOverlayApp::default();
        app.open(&Refusing("Document requires a password"));
        app.poll_loading();

        assert!(matches!(app.load_error(), Some(LoadError::PasswordProtected(_))));
        assert_eq!(app.editor().document().page_count(), 3);
        let status = app.status.clone().unwrap_or_default();
        assert!(status.contains("Unlock PDF"), "{status}");

        app.open(&Refusing("invalid PDF structure"));
        app.poll_loading();
        assert!(matches!(app.load_error(), Some(LoadError::Corrupted(_))));
        assert!(app.status.as_deref().is_some_and(|s| s.contains("Repair PDF")));

        app.open(&BlankPages::new(vec![PageSize::LETTER]));
        app.poll_loading();
        assert!(app.load_error().is_none());
        assert_eq!(app.editor().document().page_count(), 1);
    }

    #[test]
    fn test_page_list_file_errors_are_classified() {
        let missing = PageListFile::new("/nonexistent/pages.json");
        assert!(matches!(block_on(missing.page_sizes()), Err(LoadError::Other(_))));

        let path = std::env::temp_dir().join(format!("pdf_overlay_pages_{}.json", std::process::id()));
        std::fs::write(&path, "[{\"width\": 612").unwrap();
        let broken = PageListFile::new(&path);
        assert!(matches!(block_on(broken.page_sizes()), Err(LoadError::Corrupted(_))));

        std::fs::write(&path, r#"[{"width": 612, "height": 792}, {"width": 595, "height": 842}]"#).unwrap();
        let sizes = block_on(PageListFile::new(&path).page_sizes()).unwrap();
        assert_eq!(sizes, vec![PageSize::LETTER, PageSize::A4]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_released_page_is_rasterized_again() {
        let ctx = egui::Context::default();
        let mut app = PdfOverlayApp::default();
        app.ensure_raster(1, 1.0);
        app.poll_rasters(&ctx);
        assert!(app.renderer.surfaces().get_surface(1).is_some());

        app.release_raster(1);
        assert!(app.renderer.surfaces().get_surface(1).is_none());
        app.ensure_raster(1, 1.0);
        app.poll_rasters(&ctx);
        assert!(app.renderer.surfaces().get_surface(1).is_some());
    }

    #[test]
    fn test_persisted_settings_tolerate_missing_fields() {
        let persisted: PersistedSettings = serde_json::from_str(r#"{"config": {"show_grid": true}}"#).unwrap();
        assert!(persisted.config.show_grid);
        assert_eq!(persisted.settings, ToolSettings::default());
    }
}
