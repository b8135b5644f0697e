//! # docai-overlay
//!
//! Reading order and overlay geometry for Document AI processing results.
//!
//! A Document AI processor returns a `Document` JSON with the page images and
//! a flat list of detected entities, each anchored to a page by a normalized
//! bounding polygon. This crate turns that result into something a viewer can
//! draw.
//!
//! ## Features
//!
//! - **Typed model**: load processor responses or saved `.json` exports
//!   without losing fields this crate does not interpret
//! - **Reading order**: group entities by page, sort top-to-bottom, sort the
//!   properties of composite entities left-to-right
//! - **Coordinate mapping**: fit a page image into a viewport and map
//!   normalized vertices to pixels
//! - **Overlays**: per-page polygon layout with highlight state, optionally
//!   with OCR blocks and form fields, rendered to JSON or SVG
//! - **Viewer state**: one owned state object with debounced resizing
//!
//! ## Quick Start
//!
//! ```rust
//! use docai_overlay::{layout_page, order_document, Document, Highlight, OverlayOptions, Size};
//!
//! # fn main() -> docai_overlay::Result<()> {
//! let json = r#"{
//!     "pages": [{"pageNumber": 1, "image": {"content": "", "width": 600, "height": 800}}],
//!     "entities": [
//!         {"id": "1", "type": "total_amount", "mentionText": "10.00", "confidence": 0.97,
//!          "pageAnchor": {"pageRefs": [{"boundingPoly": {"normalizedVertices": [
//!             {"x": 0.6, "y": 0.9}, {"x": 0.8, "y": 0.9}, {"x": 0.8, "y": 0.95}, {"x": 0.6, "y": 0.95}
//!          ]}}]}},
//!         {"id": "2", "type": "supplier_name", "mentionText": "ACME", "confidence": 0.91,
//!          "pageAnchor": {"pageRefs": [{"boundingPoly": {"normalizedVertices": [
//!             {"x": 0.1, "y": 0.05}, {"x": 0.4, "y": 0.05}, {"x": 0.4, "y": 0.1}, {"x": 0.1, "y": 0.1}
//!          ]}}]}}
//!     ]
//! }"#;
//!
//! let document = order_document(&Document::from_json_str(json)?);
//! assert_eq!(document.entities()[0].id, "2");
//!
//! let overlay = layout_page(
//!     &document,
//!     0,
//!     Size::new(100.0, 100.0),
//!     &Highlight::id("1"),
//!     &OverlayOptions::default(),
//! )?;
//! assert_eq!(overlay.placement.width, 75.0);
//! assert!(overlay.entities[1].highlighted);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`model`] - Document, page, layout element and entity types
//! - [`ordering`] - Reading-order sorting
//! - [`geometry`] - Viewport fitting and coordinate mapping
//! - [`overlay`] - Per-page polygon layout and SVG rendering
//! - [`highlight`] - Highlight selection
//! - [`viewer`] - Viewer state and resize debouncing
//! - [`summary`] - Document details
//! - [`page_image`] - Page image sizes

pub mod error;
pub mod geometry;
pub mod highlight;
pub mod model;
pub mod ordering;
pub mod overlay;
pub mod page_image;
pub mod summary;
pub mod viewer;

pub use error::{OverlayError, Result};
pub use geometry::{fit, to_pixels, PlacedRect, Point, Size};
pub use highlight::Highlight;
pub use model::{Document, Entity, Page, PageImage};
pub use ordering::{group_by_page, order_document, order_entities, sort_by_type};
pub use overlay::{
    layout_page, render_svg, EntityOverlay, LayoutKind, LayoutOverlay, OverlayOptions, PageOverlay,
};
pub use page_image::{page_image_data, page_image_size};
pub use summary::{DocumentSummary, PageSummary};
pub use viewer::{ResizeDebouncer, ViewerState};

/// Current version of docai-overlay
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
