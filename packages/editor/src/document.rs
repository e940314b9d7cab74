//! # Slide Document
//!
//! The ordered slide collection for one presentation plus the selected
//! slide. A document always holds at least one slide, and the selection
//! always names a slide that exists.
//!
//! ## Lifecycle
//!
//! ```text
//! Hydrate → Mutate → (History push) → Persist
//!    ↓        ↓            ↓              ↓
//! remote/  Mutation   HistoryStack   PersistenceAdapter
//!  local
//! ```

use crate::errors::EditorError;
use crate::slide::Slide;
use slidedeck_common::SlideId;

/// In-memory slide collection owned by one editing session
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDocument {
    slides: Vec<Slide>,
    selected: SlideId,
}

impl SlideDocument {
    /// Document with one blank slide
    pub fn new() -> Self {
        Self::with_slides(Vec::new())
    }

    /// Build from existing slides, in the given order
    ///
    /// An empty input yields a single blank slide. Every slide passes through
    /// `ensure_defaults`.
    pub fn with_slides(slides: Vec<Slide>) -> Self {
        let slides = Self::prepare(slides);
        let selected = slides[0].id.clone();
        Self { slides, selected }
    }

    fn prepare(slides: Vec<Slide>) -> Vec<Slide> {
        let mut prepared: Vec<Slide> = slides.into_iter().map(Slide::ensure_defaults).collect();
        if prepared.is_empty() {
            prepared.push(Slide::new(SlideId::generate(), 1));
        }
        prepared
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub(crate) fn slides_mut(&mut self) -> &mut Vec<Slide> {
        &mut self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Never true once constructed
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slide(&self, id: &SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| &s.id == id)
    }

    pub(crate) fn slide_mut(&mut self, id: &SlideId) -> Option<&mut Slide> {
        self.slides.iter_mut().find(|s| &s.id == id)
    }

    pub fn index_of(&self, id: &SlideId) -> Option<usize> {
        self.slides.iter().position(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SlideId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn selected_id(&self) -> &SlideId {
        &self.selected
    }

    pub fn selected_slide(&self) -> &Slide {
        self.slide(&self.selected).unwrap_or(&self.slides[0])
    }

    pub fn selected_index(&self) -> usize {
        self.index_of(&self.selected).unwrap_or(0)
    }

    /// Select a slide; unknown ids are ignored
    pub fn select(&mut self, id: &SlideId) -> bool {
        if self.contains(id) {
            self.selected = id.clone();
            true
        } else {
            false
        }
    }

    pub(crate) fn select_index(&mut self, index: usize) {
        let index = index.min(self.slides.len() - 1);
        self.selected = self.slides[index].id.clone();
    }

    /// Replace every slide, keeping the selection when it still exists
    pub fn replace_slides(&mut self, slides: Vec<Slide>) {
        self.slides = Self::prepare(slides);
        if !self.contains(&self.selected) {
            self.selected = self.slides[0].id.clone();
        }
    }

    /// Renumber `order` densely as 1..=N following the current sequence
    ///
    /// Returns true if any slide's order changed.
    pub fn renumber(&mut self) -> bool {
        let mut changed = false;
        for (index, slide) in self.slides.iter_mut().enumerate() {
            let order = index as u32 + 1;
            if slide.order != order {
                slide.order = order;
                changed = true;
            }
        }
        changed
    }

    /// Deep copy of the slide sequence
    pub fn snapshot(&self) -> Vec<Slide> {
        self.slides.clone()
    }

    /// Next dense order value for an appended slide
    pub fn next_order(&self) -> u32 {
        self.slides.iter().map(|s| s.order).max().unwrap_or(0) + 1
    }
}

/// Serialize full slide objects as a JSON array
pub fn slides_to_json(slides: &[Slide]) -> Result<String, EditorError> {
    Ok(serde_json::to_string(slides)?)
}

/// Parse a JSON array of slide objects, sorted by `order` (stable)
pub fn slides_from_json(json: &str) -> Result<Vec<Slide>, EditorError> {
    let mut slides: Vec<Slide> = serde_json::from_str(json)?;
    if slides.is_empty() {
        return Err(EditorError::EmptyDocument);
    }
    slides.sort_by_key(|s| s.order);
    Ok(slides.into_iter().map(Slide::ensure_defaults).collect())
}

impl Default for SlideDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(id: &str, order: u32) -> Slide {
        Slide::new(SlideId::new(id), order)
    }

    #[test]
    fn test_new_document_has_one_selected_slide() {
        let doc = SlideDocument::new();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.selected_id(), &doc.slides()[0].id);
        assert_eq!(doc.slides()[0].order, 1);
    }

    #[test]
    fn test_select_unknown_is_noop() {
        let mut doc = SlideDocument::with_slides(vec![slide("a", 1), slide("b", 2)]);
        assert!(doc.select(&SlideId::new("b")));
        assert!(!doc.select(&SlideId::new("zzz")));
        assert_eq!(doc.selected_id().as_str(), "b");
    }

    #[test]
    fn test_replace_keeps_selection_when_present() {
        let mut doc = SlideDocument::with_slides(vec![slide("a", 1), slide("b", 2)]);
        doc.select(&SlideId::new("b"));

        doc.replace_slides(vec![slide("b", 1), slide("c", 2)]);
        assert_eq!(doc.selected_id().as_str(), "b");

        doc.replace_slides(vec![slide("x", 1)]);
        assert_eq!(doc.selected_id().as_str(), "x");

        doc.replace_slides(Vec::new());
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.selected_id(), &doc.slides()[0].id);
    }

    #[test]
    fn test_renumber_is_dense() {
        let mut doc = SlideDocument::with_slides(vec![slide("a", 4), slide("b", 9), slide("c", 2)]);
        assert!(doc.renumber());
        let orders: Vec<u32> = doc.slides().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert!(!doc.renumber());
    }

    #[test]
    fn test_json_roundtrip_sorts_by_order() {
        let mut b = slide("b", 2);
        b.notes = "speaker notes".into();
        let json = slides_to_json(&[b, slide("a", 1)]).unwrap();

        let slides = slides_from_json(&json).unwrap();
        let ids: Vec<&str> = slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(slides[1].notes, "speaker notes");

        assert!(matches!(slides_from_json("[]"), Err(EditorError::EmptyDocument)));
        assert!(matches!(slides_from_json("{"), Err(EditorError::Serialization(_))));
    }

    #[test]
    fn test_snapshot_does_not_alias() {
        let mut doc = SlideDocument::with_slides(vec![slide("a", 1)]);
        let snapshot = doc.snapshot();
        doc.slides_mut()[0].title = "changed".into();
        assert_eq!(snapshot[0].title, "");
    }
}
