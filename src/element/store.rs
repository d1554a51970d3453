use egui::Pos2;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{Element, ElementPatch};
use crate::geometry::{CoordinateMapper, Position};
use crate::id_generator::{ElementId, generate_id};

/// Z-order moves. Later elements paint on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorderDirection {
    Forward,
    Backward,
    ToFront,
    ToBack,
}

/// The authoritative, ordered element collection of a document.
///
/// Order is z-order. Operations on unknown ids are no-ops and report `false` / `None`.
/// Every effective mutation bumps [`ElementStore::revision`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStore {
    elements: Vec<Element>,
    revision: u64,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self { elements, revision: 0 }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Monotonic change counter for dirty tracking.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Append on top of the z-order.
    pub fn add(&mut self, element: Element) -> ElementId {
        let id = element.id;
        self.elements.push(element);
        self.touch();
        id
    }

    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        self.update_with(id, |element| patch.apply(element))
    }

    /// Run `f` on the element; `f` reports whether it changed anything.
    pub fn update_with(&mut self, id: ElementId, f: impl FnOnce(&mut Element) -> bool) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            debug!("update: unknown element {id}");
            return false;
        };
        let changed = f(element);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn set_position(&mut self, id: ElementId, position: Position) -> bool {
        self.update_with(id, |element| {
            let changed = element.position != position;
            element.position = position;
            changed
        })
    }

    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let index = self.index_of(id)?;
        let removed = self.elements.remove(index);
        self.touch();
        Some(removed)
    }

    /// Copy an element with a fresh id, shifted by `offset` percent on both axes, and
    /// put the copy on top.
    pub fn duplicate(&mut self, id: ElementId, offset: f32) -> Option<ElementId> {
        let mut copy = self.get(id)?.clone();
        copy.id = generate_id();
        copy.position = copy.position.offset(offset, offset);
        Some(self.add(copy))
    }

    pub fn reorder(&mut self, id: ElementId, direction: ReorderDirection) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let last = self.elements.len() - 1;
        let target = match direction {
            ReorderDirection::Forward => (index + 1).min(last),
            ReorderDirection::Backward => index.saturating_sub(1),
            ReorderDirection::ToFront => last,
            ReorderDirection::ToBack => 0,
        };
        if target == index {
            return false;
        }
        let element = self.elements.remove(index);
        self.elements.insert(target, element);
        self.touch();
        true
    }

    /// Elements drawn on `page` in z-order, including those bound to every page.
    pub fn find_by_page(&self, page: u32) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.on_page(page))
    }

    /// Topmost element on `page` under the device point.
    pub fn hit_test(&self, page: u32, mapper: &CoordinateMapper, pos: Pos2, tolerance: f32) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .filter(|e| e.on_page(page))
            .find(|e| e.hit_test(mapper, pos, tolerance))
            .map(|e| e.id)
    }

    /// Swap in a whole collection, e.g. a history snapshot or a loaded draft.
    pub fn replace_all(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        self.touch();
    }

    pub fn to_vec(&self) -> Vec<Element> {
        self.elements.clone()
    }
}
