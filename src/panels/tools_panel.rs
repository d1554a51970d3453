use egui::{Slider, Ui};
use futures::FutureExt;
use log::{info, warn};

use crate::app::{BlankPages, PdfOverlayApp};
use crate::components::ToolButton;
use crate::element::{ElementKind, ElementPatch, ReorderDirection};
use crate::export::ExportPlan;
use crate::geometry::PageSize;
use crate::redaction::{redactions_for, search_document};
use crate::tools::ToolKind;

#[cfg(not(target_arch = "wasm32"))]
const DRAFT_PATH: &str = "annotations.draft.json";
#[cfg(not(target_arch = "wasm32"))]
const PAGES_PATH: &str = "pages.json";

pub fn tools_panel(app: &mut PdfOverlayApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                document_section(app, ui);
                ui.separator();
                ui.heading("Tools");
                tool_grid(app, ui);
                ui.separator();
                history_section(app, ui);
                ui.separator();
                style_section(app, ui);
                ui.separator();
                selection_section(app, ui);
                ui.separator();
                view_section(app, ui);
                ui.separator();
                search_section(app, ui);
                ui.separator();
                output_section(app, ui, ctx);

                if let Some(status) = &app.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
}

fn document_section(app: &mut PdfOverlayApp, ui: &mut Ui) {
    ui.strong("Document");
    ui.horizontal(|ui| {
        if ui.button("Sample pages").clicked() {
            app.open(&BlankPages::new(vec![PageSize::LETTER, PageSize::A4, PageSize::LETTER]));
        }
        #[cfg(not(target_arch = "wasm32"))]
        if ui.button(format!("Open {PAGES_PATH}")).clicked() {
            app.open(&crate::app::PageListFile::new(PAGES_PATH));
        }
    });
    if app.is_loading() {
        ui.spinner();
    }
    if let Some(err) = app.load_error() {
        ui.colored_label(ui.visuals().error_fg_color, err.to_string());
        ui.label(err.hint());
    }
}

fn tool_grid(app: &mut PdfOverlayApp, ui: &mut Ui) {
    let active = app.editor.controller().tool();
    ui.horizontal_wrapped(|ui| {
        for tool in ToolKind::all() {
            if ToolButton::new(tool, tool == active).show(ui).clicked() {
                info!("Tool selected from UI: {}", tool.name());
                app.editor.set_tool(tool);
            }
        }
    });
}

fn history_section(app: &mut PdfOverlayApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        if ui.add_enabled(app.editor.can_undo(), egui::Button::new("Undo")).clicked() {
            app.editor.undo();
        }
        if ui.add_enabled(app.editor.can_redo(), egui::Button::new("Redo")).clicked() {
            app.editor.redo();
        }
    });
    let history = app.editor.history();
    ui.label(format!("Snapshot {} of {}", history.cursor() + 1, history.len()));
}

fn style_section(app: &mut PdfOverlayApp, ui: &mut Ui) {
    ui.strong("Style");
    let settings = app.editor.settings_mut();
    ui.horizontal(|ui| {
        ui.label("Color");
        ui.color_edit_button_srgba(&mut settings.color);
        ui.label("Redaction");
        ui.color_edit_button_srgba(&mut settings.redaction_color);
    });
    ui.add(Slider::new(&mut settings.stroke_width, 1.0..=20.0).text("Stroke"));
    ui.add(Slider::new(&mut settings.opacity, 0.1..=1.0).text("Opacity"));
    ui.add(Slider::new(&mut settings.font_size, 6.0..=96.0).text("Font size"));
    ui.horizontal(|ui| {
        ui.checkbox(&mut settings.bold, "Bold");
        ui.checkbox(&mut settings.italic, "Italic");
        ui.checkbox(&mut settings.underline, "Underline");
    });
}

fn selection_section(app: &mut PdfOverlayApp, ui: &mut Ui) {
    let Some(element) = app.editor.selected_element().cloned() else {
        app.text_draft = None;
        ui.weak("Nothing selected");
        return;
    };
    ui.strong(format!("Selected {}", element.type_name()));

    let mut patch = ElementPatch::default();

    let mut color = element.color();
    if ui.color_edit_button_srgba(&mut color).changed() {
        patch.color = Some(color);
    }

    let mut opacity = element.opacity;
    let response = ui.add(Slider::new(&mut opacity, 0.1..=1.0).text("Opacity"));
    if response.drag_stopped() || (response.changed() && !response.dragged()) {
        patch.opacity = Some(opacity);
    }

    let mut rotation = element.rotation;
    let response = ui.add(Slider::new(&mut rotation, -180.0..=180.0).text("Rotation"));
    if response.drag_stopped() || (response.changed() && !response.dragged()) {
        patch.rotation = Some(rotation);
    }

    let mut locked = element.locked;
    if ui.checkbox(&mut locked, "Locked").changed() {
        patch.locked = Some(locked);
    }

    if let ElementKind::Text(text) = &element.kind {
        if app.text_draft.as_ref().is_some_and(|(id, _)| *id != element.id) {
            app.text_draft = None;
        }
        let (_, draft) = app.text_draft.get_or_insert_with(|| (element.id, text.content.clone()));
        let response = ui.text_edit_multiline(draft);
        if response.lost_focus() {
            if *draft != text.content {
                patch.text = Some(draft.clone());
            }
            app.text_draft = None;
        }
    }

    if let Err(err) = app.editor.update_selected(patch) {
        app.status = Some(err.to_string());
    }

    ui.horizontal(|ui| {
        let mut result = Ok(false);
        if ui.button("Duplicate").clicked() {
            result = app.editor.duplicate_selected();
        }
        if ui.button("Delete").clicked() {
            result = app.editor.delete_selected();
        }
        if let Err(err) = result {
            app.status = Some(err.to_string());
        }
    });
    ui.horizontal(|ui| {
        for (label, direction) in [
            ("Front", ReorderDirection::ToFront),
            ("Forward", ReorderDirection::Forward),
            ("Backward", ReorderDirection::Backward),
            ("Back", ReorderDirection::ToBack),
        ] {
            if ui.small_button(label).clicked() {
                if let Err(err) = app.editor.reorder_selected(direction) {
                    app.status = Some(err.to_string());
                }
            }
        }
    });
}

fn view_section(app: &mut PdfOverlayApp, ui: &mut Ui) {
    ui.strong("View");
    ui.horizontal(|ui| {
        if ui.button("−").clicked() {
            app.editor.zoom_out();
        }
        ui.label(format!("{:.0}%", app.editor.document().zoom_percent()));
        if ui.button("+").clicked() {
            app.editor.zoom_in();
        }
    });

    let page = app.editor.document().current_page();
    let count = app.editor.document().page_count();
    ui.horizontal(|ui| {
        let mut target = None;
        if ui.add_enabled(page > 1, egui::Button::new("◀")).clicked() {
            target = Some(page - 1);
        }
        ui.label(format!("Page {page} / {count}"));
        if ui.add_enabled(page < count, egui::Button::new("▶")).clicked() {
            target = Some(page + 1);
        }
        if let Some(target) = target {
            if let Err(err) = app.editor.set_page(target) {
                warn!("could not switch to page {target}: {err}");
                app.status = Some(err.to_string());
            }
        }
    });

    let mut config = app.editor.config().clone();
    ui.checkbox(&mut config.show_grid, "Show grid");
    ui.checkbox(&mut config.snap_to_grid, "Snap to grid");
    ui.add(Slider::new(&mut config.grid_size, 1.0..=25.0).text("Grid %"));
    if &config != app.editor.config() {
        app.editor.set_config(config);
    }
}

fn search_section(app: &mut PdfOverlayApp, ui: &mut Ui) {
    ui.strong("Find & redact");
    ui.text_edit_singleline(&mut app.search.query);
    ui.horizontal(|ui| {
        ui.checkbox(&mut app.search.options.regex, "Regex");
        ui.checkbox(&mut app.search.options.case_sensitive, "Match case");
    });
    if !ui.button("Redact matches").clicked() {
        if let Some(status) = &app.search.status {
            ui.label(status);
        }
        return;
    }

    let pages: Vec<_> = app
        .editor
        .document()
        .page_sizes()
        .iter()
        .enumerate()
        .map(|(index, size)| (index as u32 + 1, *size))
        .collect();
    let search = search_document(&app.pages, &pages, &app.search.query, &app.search.options).now_or_never();
    app.search.status = Some(match search {
        None => "Text extraction is still running".to_owned(),
        Some(Err(err)) => err.to_string(),
        Some(Ok(matches)) => {
            let redactions = redactions_for(&matches, app.editor.settings().redaction_color);
            match app.editor.add_elements(redactions) {
                Ok(count) => format!("Added {count} redaction(s); boxes are approximate, review before export"),
                Err(err) => err.to_string(),
            }
        }
    });
}

fn output_section(app: &mut PdfOverlayApp, ui: &mut Ui, ctx: &egui::Context) {
    ui.strong("Output");
    if ui.button("Copy export plan").clicked() {
        let plan = ExportPlan::build(app.editor.document(), app.editor.config()).and_then(|plan| plan.to_json());
        app.status = Some(match plan {
            Ok(json) => {
                ctx.copy_text(json);
                "Export plan copied to the clipboard".to_owned()
            }
            Err(err) => format!("Export failed: {err}"),
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    ui.horizontal(|ui| {
        use crate::state::DraftFile;

        if ui.button("Save draft").clicked() {
            app.status = Some(match DraftFile::from_document(app.editor.document()).save(DRAFT_PATH) {
                Ok(()) => format!("Saved {DRAFT_PATH}"),
                Err(err) => err.to_string(),
            });
        }
        if ui.button("Load draft").clicked() {
            let loaded = DraftFile::load(DRAFT_PATH).and_then(|draft| draft.validated_for(app.editor.document()));
            app.status = Some(match loaded {
                Ok(elements) => {
                    let count = elements.len();
                    let mut state = app.editor.document().history_state();
                    state.elements = elements;
                    app.editor.apply_state(&state, crate::command::ChangeOrigin::User);
                    format!("Loaded {count} element(s)")
                }
                Err(err) => err.to_string(),
            });
        }
    });
}
