use egui::{Color32, Sense, Stroke};

use crate::app::PdfOverlayApp;
use crate::renderer::OverlayFrame;

const PAGE_GAP: f32 = 16.0;

pub fn central_panel(app: &mut PdfOverlayApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::central_panel(&ctx.style()).fill(Color32::from_gray(60)))
        .show(ctx, |ui| {
            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .drag_to_scroll(false)
                .show(ui, |ui| {
                    let pan = app.editor.take_pan();
                    if pan != egui::Vec2::ZERO {
                        ui.scroll_with_delta(pan);
                    }

                    ui.spacing_mut().item_spacing.y = PAGE_GAP;
                    let mut hovered_page = false;
                    for page in 1..=app.editor.document().page_count() {
                        // Pages are laid out in points; the raster itself is rendered at device resolution.
                        let Some(mapper) = app.editor.document().mapper(page, 1.0) else {
                            continue;
                        };
                        let (rect, response) = ui.allocate_exact_size(mapper.viewport(), Sense::click_and_drag());
                        app.input.set_page_rect(page, rect);
                        hovered_page |= response.hovered() || response.dragged();

                        if !ui.is_rect_visible(rect) {
                            app.release_raster(page);
                            continue;
                        }
                        app.ensure_raster(page, ctx.pixels_per_point());

                        let controller = app.editor.controller();
                        let gesture_here = controller.active_page() == Some(page);
                        let preview = gesture_here
                            .then(|| controller.preview(app.editor.settings()))
                            .flatten();
                        let frame = OverlayFrame {
                            page,
                            mapper: &mapper,
                            config: app.editor.config(),
                            selected: app.editor.selected(),
                            preview: preview.as_ref(),
                            marquee: gesture_here.then(|| controller.marquee()).flatten(),
                        };
                        let elements = app.editor.document().elements().find_by_page(page);
                        app.renderer.render_page(ui.painter(), rect, elements, &frame);

                        let border = if page == app.editor.document().current_page() {
                            Stroke::new(2.0, Color32::from_rgb(59, 130, 246))
                        } else {
                            Stroke::new(1.0, Color32::from_gray(120))
                        };
                        ui.painter().rect_stroke(rect, 0.0, border);
                    }

                    if hovered_page {
                        ctx.set_cursor_icon(app.editor.hover_cursor());
                    }
                });
        });
}
