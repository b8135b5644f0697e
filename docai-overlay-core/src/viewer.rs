//! Owned state of an interactive document viewer
//!
//! A rendering front-end keeps one [`ViewerState`] per open document and
//! calls its update methods from its event handlers. Viewport changes go
//! through a [`ResizeDebouncer`] so a burst of resize events produces a
//! single re-layout once the window has settled.

use crate::error::{OverlayError, Result};
use crate::geometry::Size;
use crate::highlight::Highlight;
use crate::model::Document;
use crate::ordering::order_document;
use crate::overlay::{layout_page, OverlayOptions, PageOverlay};
use std::time::{Duration, Instant};

/// Coalesces rapid updates into one after a quiet period
#[derive(Debug, Clone)]
pub struct ResizeDebouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for ResizeDebouncer<T> {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl<T> ResizeDebouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Record a new value; restarts the quiet period
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the last pushed value once `quiet` has passed since it was pushed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.quiet => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    document: Option<Document>,
    page: usize,
    highlight: Highlight,
    viewport: Size,
    resize: ResizeDebouncer<Size>,
    options: OverlayOptions,
}

impl ViewerState {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: OverlayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resize_quiet_period(mut self, quiet: Duration) -> Self {
        self.resize = ResizeDebouncer::new(quiet);
        self
    }

    /// Replace the document; selection and highlight are reset
    pub fn load(&mut self, document: Document) {
        tracing::debug!(
            "viewer loaded document with {} pages and {} entities",
            document.page_count(),
            document.entities().len()
        );
        self.document = Some(order_document(&document));
        self.page = 0;
        self.highlight = Highlight::None;
    }

    pub fn clear(&mut self) {
        self.document = None;
        self.page = 0;
        self.highlight = Highlight::None;
    }

    /// The loaded document, entities in reading order
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn select_page(&mut self, page: usize) -> Result<()> {
        let count = self.document.as_ref().map(Document::page_count).unwrap_or(0);
        if page >= count {
            return Err(OverlayError::InvalidPageNumber(page, count));
        }
        self.page = page;
        Ok(())
    }

    pub fn set_highlight(&mut self, highlight: Highlight) {
        self.highlight = highlight;
    }

    /// Record a viewport change; applied by [`ViewerState::tick`]
    pub fn resize(&mut self, viewport: Size, now: Instant) {
        self.resize.push(viewport, now);
    }

    /// Apply a settled viewport change. Returns true when the viewport changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.resize.poll(now) {
            Some(viewport) if viewport != self.viewport => {
                tracing::debug!(
                    "viewport resized to {}x{}",
                    viewport.width,
                    viewport.height
                );
                self.viewport = viewport;
                true
            }
            _ => false,
        }
    }

    /// Overlay for the selected page, `None` when no document is loaded
    pub fn layout(&self) -> Result<Option<PageOverlay>> {
        let Some(document) = &self.document else {
            return Ok(None);
        };
        if document.pages.is_empty() {
            return Ok(None);
        }
        layout_page(
            document,
            self.page,
            self.viewport,
            &self.highlight,
            &self.options,
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, Page, PageImage};

    fn document() -> Document {
        Document::new()
            .with_page(Page::new(1).with_image(PageImage::new("").with_size(100, 100)))
            .with_page(Page::new(2).with_image(PageImage::new("").with_size(100, 200)))
            .with_entity(Entity::new("b", "total").with_box(0, 0.0, 0.5, 1.0, 0.6))
            .with_entity(Entity::new("a", "supplier").with_box(0, 0.0, 0.1, 1.0, 0.2))
    }

    #[test]
    fn test_debouncer_coalesces() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(100));

        debouncer.push(1, start);
        debouncer.push(2, start + Duration::from_millis(50));
        assert_eq!(debouncer.poll(start + Duration::from_millis(120)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(150)), Some(2));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_debouncer_default_quiet_period() {
        let debouncer: ResizeDebouncer<Size> = ResizeDebouncer::default();
        assert_eq!(debouncer.quiet_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_orders_entities() {
        let mut viewer = ViewerState::new(Size::new(100.0, 100.0));
        viewer.load(document());

        let ids: Vec<_> = viewer
            .document()
            .unwrap()
            .entities()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_load_resets_selection() {
        let mut viewer = ViewerState::new(Size::new(100.0, 100.0));
        viewer.load(document());
        viewer.select_page(1).unwrap();
        viewer.set_highlight(Highlight::id("a"));

        viewer.load(document());
        assert_eq!(viewer.page(), 0);
        assert_eq!(viewer.highlight(), &Highlight::None);
    }

    #[test]
    fn test_select_page_bounds() {
        let mut viewer = ViewerState::new(Size::new(100.0, 100.0));
        assert!(matches!(
            viewer.select_page(0),
            Err(OverlayError::InvalidPageNumber(0, 0))
        ));

        viewer.load(document());
        assert!(viewer.select_page(1).is_ok());
        assert!(viewer.select_page(2).is_err());
        assert_eq!(viewer.page(), 1);
    }

    #[test]
    fn test_resize_applies_after_quiet_period() {
        let start = Instant::now();
        let mut viewer = ViewerState::new(Size::new(100.0, 100.0))
            .with_resize_quiet_period(Duration::from_millis(10));
        viewer.load(document());

        viewer.resize(Size::new(300.0, 300.0), start);
        viewer.resize(Size::new(200.0, 200.0), start + Duration::from_millis(5));
        assert!(!viewer.tick(start + Duration::from_millis(8)));
        assert_eq!(viewer.viewport(), Size::new(100.0, 100.0));

        assert!(viewer.tick(start + Duration::from_millis(20)));
        assert_eq!(viewer.viewport(), Size::new(200.0, 200.0));

        let overlay = viewer.layout().unwrap().unwrap();
        assert_eq!(overlay.placement.width, 200.0);
    }

    #[test]
    fn test_resize_to_same_size_is_not_a_change() {
        let start = Instant::now();
        let mut viewer = ViewerState::new(Size::new(100.0, 100.0));
        viewer.resize(Size::new(100.0, 100.0), start);
        assert!(!viewer.tick(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_layout() {
        let mut viewer = ViewerState::new(Size::new(100.0, 100.0));
        assert!(viewer.layout().unwrap().is_none());

        viewer.load(document());
        viewer.set_highlight(Highlight::id("b"));
        let overlay = viewer.layout().unwrap().unwrap();
        assert_eq!(overlay.entities.len(), 2);
        assert!(overlay.entities[1].highlighted);

        viewer.select_page(1).unwrap();
        let overlay = viewer.layout().unwrap().unwrap();
        assert_eq!(overlay.page_number, 2);
        assert!(overlay.entities.is_empty());

        viewer.clear();
        assert!(viewer.layout().unwrap().is_none());
    }
}
