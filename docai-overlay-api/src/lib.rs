//! # docai-overlay-api
//!
//! REST API server for the docai-overlay library
//!

mod api;
pub use api::{
    app, health_check, layout_handler, order_handler, summary_handler, svg_handler, AppError,
    ErrorResponse, LayoutRequest,
};
