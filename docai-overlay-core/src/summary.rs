//! Document details: page statistics and entity counts

use crate::model::{Document, Entity, Page};
use crate::page_image::page_image_size;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub page_count: usize,
    /// Top-level entities
    pub entity_count: usize,
    /// Top-level entities plus all nested properties
    pub total_entity_count: usize,
    /// Drawable top-level entities (4-vertex polygon)
    pub drawable_count: usize,
    pub entities_by_type: BTreeMap<String, usize>,
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub page_number: u32,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub unit: Option<String>,
    /// Pixel size of the page image, if it could be determined
    pub image_width: Option<f64>,
    pub image_height: Option<f64>,
    pub languages: Vec<String>,
    pub blocks: usize,
    pub paragraphs: usize,
    pub lines: usize,
    pub tokens: usize,
    pub tables: usize,
    pub form_fields: usize,
}

impl DocumentSummary {
    pub fn from_document(document: &Document) -> Self {
        let entities = document.entities();
        let mut entities_by_type = BTreeMap::new();
        for entity in entities {
            *entities_by_type
                .entry(entity.entity_type.clone())
                .or_insert(0) += 1;
        }

        Self {
            uri: document.uri.clone(),
            mime_type: document.mime_type.clone(),
            page_count: document.page_count(),
            entity_count: entities.len(),
            total_entity_count: entities.iter().map(count_tree).sum(),
            drawable_count: entities.iter().filter(|e| e.is_drawable()).count(),
            entities_by_type,
            pages: document.pages.iter().map(PageSummary::from_page).collect(),
        }
    }
}

impl PageSummary {
    pub fn from_page(page: &Page) -> Self {
        let image = match page_image_size(page) {
            Ok(size) if !size.is_empty() => Some(size),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("page {}: could not read image size: {e}", page.page_number);
                None
            }
        };

        Self {
            page_number: page.page_number,
            width: page.dimension.as_ref().map(|d| d.width),
            height: page.dimension.as_ref().map(|d| d.height),
            unit: page.dimension.as_ref().map(|d| d.unit.clone()),
            image_width: image.map(|s| s.width),
            image_height: image.map(|s| s.height),
            languages: page
                .detected_languages
                .iter()
                .map(|l| l.language_code.clone())
                .collect(),
            blocks: page.blocks.len(),
            paragraphs: page.paragraphs.len(),
            lines: page.lines.len(),
            tokens: page.tokens.len(),
            tables: page.tables.len(),
            form_fields: page.form_fields.len(),
        }
    }
}

fn count_tree(entity: &Entity) -> usize {
    1 + entity.properties.iter().map(count_tree).sum::<usize>()
}
