//! Typed model of the Document AI `Document` JSON
//!
//! Only the fields the overlay pipeline reads are typed. Everything else is
//! captured in the `extra` maps, so a loaded document serializes back to the
//! same JSON after its entities have been reordered.

mod entity;
mod layout;
mod page;

pub use entity::{BoundingPoly, Entity, NormalizedValue, PageAnchor, PageRef, MAX_PAGE_INDEX};
pub use layout::{Block, FormField, Layout, TextAnchor, TextSegment};
pub use page::{DetectedLanguage, Page, PageDimension, PageImage};

use crate::error::{OverlayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,
    /// `None` when the source had no `entities` key at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.get_or_insert_with(Vec::new).push(entity);
        self
    }

    /// Parse a document, or a processor response wrapping one in `document`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(unwrap_envelope(value))?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    /// Load a saved `.json` export
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        tracing::debug!("loading document from {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file))
    }

    /// Export to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export to compact JSON string
    pub fn to_json_compact(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Top-level entities, empty when the document has none
    pub fn entities(&self) -> &[Entity] {
        self.entities.as_deref().unwrap_or(&[])
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by zero-based index
    pub fn page(&self, index: usize) -> Result<&Page> {
        self.pages
            .get(index)
            .ok_or(OverlayError::InvalidPageNumber(index, self.pages.len()))
    }
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if !map.contains_key("pages")
                && !map.contains_key("entities")
                && map.get("document").is_some_and(Value::is_object) =>
        {
            map.remove("document").unwrap_or_default()
        }
        other => other,
    }
}
