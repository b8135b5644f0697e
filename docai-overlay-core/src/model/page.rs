//! Pages and page images

use super::layout::{Block, FormField};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based display number
    #[serde(default)]
    pub page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PageImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<PageDimension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_languages: Vec<DetectedLanguage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    // Finer layout collections are only counted, never interpreted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_fields: Vec<FormField>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rendered raster of a page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageImage {
    /// Base64 encoded image bytes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDimension {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLanguage {
    #[serde(default)]
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Page {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: PageImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_dimension(mut self, width: f64, height: f64, unit: impl Into<String>) -> Self {
        self.dimension = Some(PageDimension {
            width,
            height,
            unit: unit.into(),
        });
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_form_field(mut self, field: FormField) -> Self {
        self.form_fields.push(field);
        self
    }

    /// Base64 image content, if the page carries any
    pub fn image_content(&self) -> Option<&str> {
        self.image
            .as_ref()
            .map(|image| image.content.as_str())
            .filter(|content| !content.is_empty())
    }

    /// Image MIME type, PNG unless stated otherwise
    pub fn image_mime_type(&self) -> &str {
        self.image
            .as_ref()
            .and_then(|image| image.mime_type.as_deref())
            .unwrap_or("image/png")
    }
}

impl PageImage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}
