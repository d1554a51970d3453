use futures::future::BoxFuture;
use log::warn;

use crate::command::HistoryState;
use crate::element::{Element, ElementStore};
use crate::error::LoadError;
use crate::geometry::{CoordinateMapper, PageSize};

pub const MIN_ZOOM: f32 = 25.0;
pub const MAX_ZOOM: f32 = 200.0;
pub const ZOOM_STEP: f32 = 25.0;

/// Opens a PDF and reports its page geometry. Backend messages are sorted with
/// [`LoadError::classify`] so the user sees which tool fixes the input.
pub trait PageSource {
    fn page_sizes(&self) -> BoxFuture<'static, Result<Vec<PageSize>, LoadError>>;
}

/// An opened PDF as the overlay engine sees it: page geometry, the element model,
/// the page being viewed and the zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    page_sizes: Vec<PageSize>,
    elements: ElementStore,
    current_page: u32,
    zoom_percent: f32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    pub fn new(page_sizes: Vec<PageSize>) -> Self {
        Self {
            page_sizes,
            elements: ElementStore::new(),
            current_page: 1,
            zoom_percent: 100.0,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    /// Size of a 1-based page.
    pub fn page_size(&self, page: u32) -> Option<PageSize> {
        let index = page.checked_sub(1)?;
        self.page_sizes.get(index as usize).copied()
    }

    pub fn contains_page(&self, page: u32) -> bool {
        (1..=self.page_count()).contains(&page)
    }

    /// A page binding is valid when it names an existing page or none at all.
    pub fn accepts(&self, element: &Element) -> bool {
        element.page.is_none_or(|page| self.contains_page(page))
    }

    pub fn elements(&self) -> &ElementStore {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut ElementStore {
        &mut self.elements
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Clamp into `[1, page_count]`; returns whether the page changed.
    pub fn set_current_page(&mut self, page: u32) -> bool {
        let page = page.clamp(1, self.page_count().max(1));
        let changed = page != self.current_page;
        self.current_page = page;
        changed
    }

    pub fn zoom_percent(&self) -> f32 {
        self.zoom_percent
    }

    pub fn set_zoom(&mut self, zoom_percent: f32) -> f32 {
        self.zoom_percent = zoom_percent.clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom_percent
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom_percent + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom_percent - ZOOM_STEP)
    }

    /// Mapper for `page` at the current zoom.
    pub fn mapper(&self, page: u32, pixels_per_point: f32) -> Option<CoordinateMapper> {
        let size = self.page_size(page)?;
        Some(CoordinateMapper::for_zoom(size, self.zoom_percent, pixels_per_point))
    }

    /// Replace the page geometry, e.g. after the PDF was reloaded. Elements bound to
    /// pages that no longer exist are dropped. Returns whether the page count changed.
    pub fn set_pages(&mut self, page_sizes: Vec<PageSize>) -> bool {
        let count_changed = page_sizes.len() != self.page_sizes.len();
        self.page_sizes = page_sizes;

        let (kept, dropped): (Vec<_>, Vec<_>) =
            self.elements.to_vec().into_iter().partition(|e| self.accepts(e));
        if !dropped.is_empty() {
            warn!("dropping {} element(s) bound to removed pages", dropped.len());
            self.elements.replace_all(kept);
        }
        self.set_current_page(self.current_page);
        count_changed
    }

    pub fn history_state(&self) -> HistoryState {
        HistoryState {
            elements: self.elements.to_vec(),
            current_page: self.current_page,
        }
    }

    /// Replace the elements and current page wholesale.
    pub fn restore(&mut self, state: &HistoryState) {
        self.elements.replace_all(state.elements.clone());
        self.set_current_page(state.current_page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{TextStyle, factory};
    use crate::geometry::Position;

    fn three_pages() -> Document {
        Document::new(vec![PageSize::LETTER, PageSize::A4, PageSize::LETTER])
    }

    #[test]
    fn test_current_page_is_clamped() {
        let mut doc = three_pages();
        assert!(doc.set_current_page(3));
        assert!(!doc.set_current_page(9));
        assert_eq!(doc.current_page(), 3);
        doc.set_current_page(0);
        assert_eq!(doc.current_page(), 1);
    }

    #[test]
    fn test_zoom_bounds() {
        let mut doc = three_pages();
        assert_eq!(doc.set_zoom(10.0), MIN_ZOOM);
        assert_eq!(doc.set_zoom(1000.0), MAX_ZOOM);
        doc.set_zoom(100.0);
        assert_eq!(doc.zoom_in(), 125.0);
        assert_eq!(doc.zoom_out(), 100.0);
    }

    #[test]
    fn test_page_sizes_are_one_based() {
        let doc = three_pages();
        assert_eq!(doc.page_size(2), Some(PageSize::A4));
        assert_eq!(doc.page_size(0), None);
        assert_eq!(doc.page_size(4), None);
        let mapper = doc.mapper(2, 2.0).unwrap();
        assert_eq!(mapper.viewport().x, 595.0 * 2.0);
    }

    #[test]
    fn test_set_pages_drops_orphans() {
        let mut doc = three_pages();
        doc.elements_mut().add(factory::create_text(3, Position::ZERO, "x", TextStyle::default()));
        doc.elements_mut().add(factory::create_text(1, Position::ZERO, "y", TextStyle::default()));
        doc.set_current_page(3);

        assert!(doc.set_pages(vec![PageSize::LETTER]));
        assert_eq!(doc.elements().len(), 1);
        assert_eq!(doc.current_page(), 1);
    }
}
