//! Viewport fitting and normalized-to-pixel coordinate mapping
//!
//! Document AI reports bounding polygons as normalized vertices in `[0, 1]`
//! relative to the page image. To draw them, the page image is first fitted
//! into the viewport with [`fit`], and the vertices are then mapped into the
//! resulting [`PlacedRect`] with [`to_pixels`].
//!
//! ```rust
//! use docai_overlay::geometry::{fit, to_pixels, Point, Size};
//!
//! let placement = fit(Size::new(100.0, 100.0), Size::new(600.0, 800.0));
//! assert_eq!(placement.width, 75.0);
//! assert_eq!(placement.x, 12.5);
//!
//! let pixels = to_pixels(&placement, &[Point::new(0.0, 1.0)]);
//! assert_eq!(pixels[0], Point::new(12.5, 100.0));
//! ```

use serde::{Deserialize, Serialize};

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    #[serde(default)]
    pub x: f64,
    /// Y coordinate
    #[serde(default)]
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0)
    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Width and height of a viewport or an image
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// True when either dimension is zero (or not a positive number)
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A scaled rectangle placed inside a viewport
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacedRect {
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

impl PlacedRect {
    pub fn new(width: f64, height: f64, x: f64, y: f64) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }

    /// The placement used while the image size is not yet known
    pub fn zero() -> Self {
        Self::default()
    }

    /// A zero-sized placement must not be drawn
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Shrink the rectangle by `margin` on every side.
    ///
    /// The size never goes below zero; the origin always moves by `margin`.
    pub fn inset(&self, margin: f64) -> Self {
        Self {
            width: (self.width - 2.0 * margin).max(0.0),
            height: (self.height - 2.0 * margin).max(0.0),
            x: self.x + margin,
            y: self.y + margin,
        }
    }
}

/// Fit an image into a viewport, preserving the aspect ratio.
///
/// Images taller than they are wide fill the viewport height, everything
/// else fills the viewport width. The result is centered horizontally and
/// aligned to the top of the viewport. An image with a zero dimension yields
/// [`PlacedRect::zero`].
pub fn fit(viewport: Size, image: Size) -> PlacedRect {
    if image.width == 0.0 || image.height == 0.0 {
        return PlacedRect::zero();
    }

    let (width, height) = if image.height > image.width {
        let height = viewport.height;
        (image.width * height / image.height, height)
    } else {
        let width = viewport.width;
        (width, image.height * width / image.width)
    };

    PlacedRect {
        width,
        height,
        x: viewport.width / 2.0 - width / 2.0,
        y: 0.0,
    }
}

/// Map normalized vertices into the pixel space of `rect`.
///
/// Vertices are not clamped, so values outside `[0, 1]` land outside the
/// rectangle.
pub fn to_pixels(rect: &PlacedRect, vertices: &[Point]) -> Vec<Point> {
    vertices
        .iter()
        .map(|v| Point::new(v.x * rect.width + rect.x, v.y * rect.height + rect.y))
        .collect()
}

/// Format points as an SVG `points` attribute value
pub fn svg_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}
