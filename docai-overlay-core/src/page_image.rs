//! Natural size of page images

use crate::error::{OverlayError, Result};
use crate::geometry::Size;
use crate::model::Page;

/// Natural pixel size of a page image.
///
/// Explicit `image.width`/`image.height` win, then a page `dimension`
/// measured in pixels, and finally the size decoded from the image header.
/// A page with no image content has size zero, which callers treat as
/// "not yet known".
pub fn page_image_size(page: &Page) -> Result<Size> {
    if let Some(image) = &page.image {
        if let (Some(width), Some(height)) = (image.width, image.height) {
            if width > 0 && height > 0 {
                return Ok(Size::new(f64::from(width), f64::from(height)));
            }
        }
    }

    if let Some(dimension) = &page.dimension {
        let size = Size::new(dimension.width, dimension.height);
        if dimension.unit.eq_ignore_ascii_case("pixels") && !size.is_empty() {
            return Ok(size);
        }
    }

    match page.image_content() {
        Some(content) => decode_size(content),
        None => Ok(Size::zero()),
    }
}

/// Base64 content and MIME type of the image of the page at `page_index`,
/// for embedding into rendered output
pub fn page_image_data(page: &Page, page_index: usize) -> Result<(&str, &str)> {
    page.image_content()
        .map(|content| (content, page.image_mime_type()))
        .ok_or(OverlayError::MissingPageImage(page_index))
}

/// Read the dimensions from base64 image content without decoding pixels
#[cfg(feature = "image-decode")]
pub fn decode_size(content: &str) -> Result<Size> {
    use base64::Engine;
    use std::io::Cursor;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(strip_data_url(content).trim())
        .map_err(|e| OverlayError::Base64(e.to_string()))?;

    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| OverlayError::InvalidImage(e.to_string()))?;

    tracing::debug!("decoded page image size {width}x{height}");
    Ok(Size::new(f64::from(width), f64::from(height)))
}

#[cfg(not(feature = "image-decode"))]
pub fn decode_size(_content: &str) -> Result<Size> {
    Err(OverlayError::InvalidImage(
        "image size is not set and the `image-decode` feature is disabled".to_string(),
    ))
}

/// Drop a `data:<mime>;base64,` prefix if present
pub fn strip_data_url(content: &str) -> &str {
    match content.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => content,
    }
}
