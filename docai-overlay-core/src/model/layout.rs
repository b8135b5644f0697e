//! OCR layout elements: blocks and form fields

use super::entity::BoundingPoly;
use crate::geometry::Point;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Position and text span shared by every layout element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_anchor: Option<TextAnchor>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_poly: Option<BoundingPoly>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Spans of the document text covered by an element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnchor {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_segments: Vec<TextSegment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Half-open character range `[start_index, end_index)` into `Document::text`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    #[serde(
        default,
        deserialize_with = "deserialize_text_index",
        serialize_with = "serialize_text_index",
        skip_serializing_if = "is_zero_index"
    )]
    pub start_index: usize,
    #[serde(
        default,
        deserialize_with = "deserialize_text_index",
        serialize_with = "serialize_text_index"
    )]
    pub end_index: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Block of OCR text, as produced by every processor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default, skip_serializing_if = "is_empty_layout")]
    pub layout: Layout,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Key/value pair detected by a form parser
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<Layout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_value: Option<Layout>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

fn is_empty_layout(layout: &Layout) -> bool {
    *layout == Layout::default()
}

fn is_zero_index(index: &usize) -> bool {
    *index == 0
}

// int64 fields travel as JSON strings
fn serialize_text_index<S: Serializer>(index: &usize, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(index)
}

fn deserialize_text_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
    .unwrap_or(0))
}

impl Layout {
    /// Layout with a normalized polygon and no text anchor
    pub fn with_polygon(vertices: Vec<Point>) -> Self {
        Self {
            bounding_poly: Some(BoundingPoly {
                normalized_vertices: vertices,
                extra: Map::new(),
            }),
            ..Self::default()
        }
    }

    pub fn with_segment(mut self, start_index: usize, end_index: usize) -> Self {
        self.text_anchor
            .get_or_insert_with(TextAnchor::default)
            .text_segments
            .push(TextSegment {
                start_index,
                end_index,
                extra: Map::new(),
            });
        self
    }

    /// Vertices when they form a quadrilateral
    pub fn quad(&self) -> Option<&[Point]> {
        self.bounding_poly
            .as_ref()
            .map(|poly| poly.normalized_vertices.as_slice())
            .filter(|vertices| vertices.len() == 4)
    }

    /// Text covered by the anchor's segments, concatenated.
    ///
    /// Indexes count characters; out-of-range segments are clipped.
    pub fn text(&self, document_text: &str) -> String {
        let Some(anchor) = &self.text_anchor else {
            return String::new();
        };
        anchor
            .text_segments
            .iter()
            .flat_map(|segment| {
                document_text
                    .chars()
                    .skip(segment.start_index)
                    .take(segment.end_index.saturating_sub(segment.start_index))
            })
            .collect()
    }
}

impl Block {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            extra: Map::new(),
        }
    }
}

impl FormField {
    pub fn new(field_name: Layout, field_value: Layout) -> Self {
        Self {
            field_name: Some(field_name),
            field_value: Some(field_value),
            extra: Map::new(),
        }
    }
}
