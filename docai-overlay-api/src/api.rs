use axum::{
    extract::{rejection::JsonRejection, Json},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use docai_overlay::model::Document;
use docai_overlay::{
    layout_page, order_document, page_image_data, render_svg, DocumentSummary, Highlight,
    OverlayError, OverlayOptions, PageOverlay, Size,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Request payload for the layout and SVG endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    /// Document AI document, or a response envelope holding one
    pub document: Value,
    /// Size of the drawing area in pixels
    pub viewport: Size,
    /// Zero-based page index (defaults to the first page)
    #[serde(default)]
    pub page: usize,
    /// Entity id, `true`/`false`, or an entity object
    #[serde(default)]
    pub highlight: Highlight,
    /// Margin around the page image in pixels
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub include_properties: bool,
    /// Also lay out the page's OCR blocks
    #[serde(default)]
    pub include_blocks: bool,
    /// Also lay out form field names and values
    #[serde(default)]
    pub include_form_fields: bool,
    /// Embed the page image into the SVG (SVG endpoint only)
    #[serde(default)]
    pub embed_image: bool,
}

impl LayoutRequest {
    fn options(&self) -> OverlayOptions {
        OverlayOptions {
            image_margin: self.margin,
            include_properties: self.include_properties,
            include_blocks: self.include_blocks,
            include_form_fields: self.include_form_fields,
        }
    }
}

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
}

/// Application-specific error types for the API
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body is not valid JSON or has the wrong shape
    #[error("Invalid request body: {0}")]
    BadRequest(String),
    /// Errors from the overlay library
    #[error(transparent)]
    Overlay(#[from] OverlayError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Overlay(
                OverlayError::Json(_)
                | OverlayError::InvalidPageNumber(..)
                | OverlayError::MissingPageImage(_),
            ) => StatusCode::BAD_REQUEST,
            AppError::Overlay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        } else {
            tracing::debug!("rejected request: {self}");
        }

        let error_response = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Build the application router with all routes configured
pub fn app() -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/order", post(order_handler))
        .route("/api/layout", post(layout_handler))
        .route("/api/svg", post(svg_handler))
        .route("/api/summary", post(summary_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "docai-overlay API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Return the document with its entities in reading order
pub async fn order_handler(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Document>, AppError> {
    let Json(value) = payload?;
    let document = Document::from_value(value)?;
    Ok(Json(order_document(&document)))
}

fn layout(request: &LayoutRequest) -> Result<(Document, PageOverlay), AppError> {
    let document = order_document(&Document::from_value(request.document.clone())?);
    let overlay = layout_page(
        &document,
        request.page,
        request.viewport,
        &request.highlight,
        &request.options(),
    )?;
    Ok((document, overlay))
}

/// Lay out the entity polygons of one page in viewport pixels
pub async fn layout_handler(
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Result<Json<PageOverlay>, AppError> {
    let Json(request) = payload?;
    let (_, overlay) = layout(&request)?;
    Ok(Json(overlay))
}

/// Render one page and its entity polygons as an SVG document
pub async fn svg_handler(
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let (document, overlay) = layout(&request)?;

    let image = if request.embed_image {
        Some(page_image_data(document.page(request.page)?, request.page)?)
    } else {
        None
    };
    let svg = render_svg(&overlay, image)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    )
        .into_response())
}

/// Page statistics and entity counts
pub async fn summary_handler(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DocumentSummary>, AppError> {
    let Json(value) = payload?;
    let document = Document::from_value(value)?;
    Ok(Json(DocumentSummary::from_document(&document)))
}
