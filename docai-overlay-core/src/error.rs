use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 image content: {0}")]
    Base64(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPageNumber(usize, usize),

    #[error("Page {0} has no image")]
    MissingPageImage(usize),

    #[error("SVG write error: {0}")]
    Svg(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
