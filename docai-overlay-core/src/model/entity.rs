//! Entities and their page anchors

use crate::geometry::Point;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A detected field or span in a document.
///
/// Composite extractions (for example an invoice line item) carry their
/// sub-fields in `properties`; each child is owned by its parent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mention_text: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<NormalizedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_anchor: Option<PageAnchor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Entity>,
    /// Fields this crate does not interpret, kept for lossless re-export
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parsed representation of an entity value (dates, amounts, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedValue {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnchor {
    #[serde(default)]
    pub page_refs: Vec<PageRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference from an entity to a region on a page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRef {
    /// Zero-based page index
    #[serde(
        default,
        deserialize_with = "deserialize_page_index",
        skip_serializing_if = "is_first_page"
    )]
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_poly: Option<BoundingPoly>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    #[serde(default)]
    pub normalized_vertices: Vec<Point>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

fn is_first_page(page: &usize) -> bool {
    *page == 0
}

/// Highest page index accepted from input; larger values are treated as
/// unparseable
pub const MAX_PAGE_INDEX: usize = 65_535;

/// Page indexes are int64 in the service schema, which its JSON encoding
/// emits as strings. Accept strings, numbers and null; anything unparseable
/// or above [`MAX_PAGE_INDEX`] is page 0.
fn deserialize_page_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let page = match &value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
    .filter(|&page| page <= MAX_PAGE_INDEX);
    if page.is_none() && !value.is_null() {
        tracing::debug!("unparseable page index {value}, using page 0");
    }
    Ok(page.unwrap_or(0))
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    pub fn with_mention_text(mut self, text: impl Into<String>) -> Self {
        self.mention_text = text.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_normalized_value(mut self, text: impl Into<String>) -> Self {
        self.normalized_value = Some(NormalizedValue {
            text: text.into(),
            extra: Map::new(),
        });
        self
    }

    /// Anchor the entity to `page` with the given normalized polygon
    pub fn with_polygon(mut self, page: usize, vertices: Vec<Point>) -> Self {
        let page_ref = PageRef {
            page,
            bounding_poly: Some(BoundingPoly {
                normalized_vertices: vertices,
                extra: Map::new(),
            }),
            extra: Map::new(),
        };
        self.page_anchor = Some(PageAnchor {
            page_refs: vec![page_ref],
            extra: Map::new(),
        });
        self
    }

    /// Anchor the entity to an axis-aligned box, vertices clockwise from top-left
    pub fn with_box(self, page: usize, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        self.with_polygon(
            page,
            vec![
                Point::new(left, top),
                Point::new(right, top),
                Point::new(right, bottom),
                Point::new(left, bottom),
            ],
        )
    }

    pub fn with_property(mut self, property: Entity) -> Self {
        self.properties.push(property);
        self
    }

    /// The first page reference of this entity's own anchor
    pub fn page_ref(&self) -> Option<&PageRef> {
        self.page_anchor.as_ref()?.page_refs.first()
    }

    /// Page index of this entity's own anchor, 0 when absent
    pub fn page(&self) -> usize {
        self.page_ref().map(|r| r.page).unwrap_or(0)
    }

    /// Normalized vertices of this entity's own anchor, if any
    pub fn polygon(&self) -> Option<&[Point]> {
        let vertices = self.page_ref()?.vertices()?;
        (!vertices.is_empty()).then_some(vertices)
    }

    /// Whether the entity can be drawn as a quadrilateral overlay
    pub fn is_drawable(&self) -> bool {
        self.page_ref().and_then(PageRef::quad).is_some()
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Display text: the normalized value when present, else the mention
    pub fn display_text(&self) -> &str {
        match &self.normalized_value {
            Some(value) if !value.text.is_empty() => &value.text,
            _ => &self.mention_text,
        }
    }
}

impl PageRef {
    pub fn vertices(&self) -> Option<&[Point]> {
        self.bounding_poly
            .as_ref()
            .map(|poly| poly.normalized_vertices.as_slice())
    }

    /// Vertices when they form a quadrilateral, the only shape that is
    /// drawn or used for sorting
    pub fn quad(&self) -> Option<&[Point]> {
        self.vertices().filter(|vertices| vertices.len() == 4)
    }

    /// First vertex of a 4-vertex polygon
    pub fn anchor_point(&self) -> Option<Point> {
        self.quad()?.first().copied()
    }
}
