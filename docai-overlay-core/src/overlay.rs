//! Overlay layout for one page of a document
//!
//! Combines the reading order with the coordinate mapping: the page image is
//! fitted into the viewport and every drawable entity on that page gets its
//! polygon in viewport pixels. OCR blocks and form fields can be laid out on
//! the same image rectangle.

use crate::error::{OverlayError, Result};
use crate::geometry::{fit, svg_points, to_pixels, PlacedRect, Point, Size};
use crate::highlight::Highlight;
use crate::model::{Document, Entity, Layout, Page};
use crate::ordering::order_entities;
use crate::page_image::page_image_size;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayOptions {
    /// Space kept between the fitted placement and the drawn image, per side
    pub image_margin: f64,
    /// Also emit polygons for entity properties, after their parent
    pub include_properties: bool,
    /// Emit the page's OCR blocks
    pub include_blocks: bool,
    /// Emit the name and value of every form field
    pub include_form_fields: bool,
}

/// One polygon to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityOverlay {
    pub entity_id: String,
    pub entity_type: String,
    pub mention_text: String,
    pub confidence: f64,
    /// Set for properties of a composite entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Polygon in viewport pixels
    pub points: Vec<Point>,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutKind {
    Block,
    FieldName,
    FieldValue,
}

impl LayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutKind::Block => "block",
            LayoutKind::FieldName => "fieldName",
            LayoutKind::FieldValue => "fieldValue",
        }
    }

    /// SVG fill and stroke color, drawn at 0.25 opacity
    pub fn color(self) -> &'static str {
        match self {
            LayoutKind::Block => "orange",
            LayoutKind::FieldName => "blue",
            LayoutKind::FieldValue => "red",
        }
    }
}

/// Polygon of an OCR block or form field part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOverlay {
    pub kind: LayoutKind,
    /// Position in `Page::blocks` or `Page::form_fields`
    pub index: usize,
    pub text: String,
    pub confidence: f64,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOverlay {
    /// Zero-based page index
    pub page_index: usize,
    pub page_number: u32,
    pub viewport: Size,
    /// Natural size of the page image
    pub image_size: Size,
    /// Result of fitting the image into the viewport
    pub placement: PlacedRect,
    /// Where the image and polygons are drawn
    pub image_rect: PlacedRect,
    pub entities: Vec<EntityOverlay>,
    /// Blocks first, then form fields (name before value)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<LayoutOverlay>,
}

impl PageOverlay {
    /// False while the image size is unknown; nothing should be drawn
    pub fn is_ready(&self) -> bool {
        !self.image_rect.is_empty()
    }

    pub fn highlighted(&self) -> impl Iterator<Item = &EntityOverlay> {
        self.entities.iter().filter(|e| e.highlighted)
    }
}

/// Lay out the overlay for the page at `page_index`.
///
/// Entities appear in reading order. Entities without a 4-vertex polygon on
/// this page are skipped, and so are layout elements.
pub fn layout_page(
    document: &Document,
    page_index: usize,
    viewport: Size,
    highlight: &Highlight,
    options: &OverlayOptions,
) -> Result<PageOverlay> {
    let page = document.page(page_index)?;
    let image_size = page_image_size(page)?;
    let placement = fit(viewport, image_size);
    let image_rect = placement.inset(options.image_margin);

    let mut overlay = PageOverlay {
        page_index,
        page_number: page.page_number,
        viewport,
        image_size,
        placement,
        image_rect,
        entities: Vec::new(),
        elements: Vec::new(),
    };

    if image_rect.is_empty() {
        tracing::debug!("page {page_index} has no usable placement yet, skipping entities");
        return Ok(overlay);
    }

    let layout = EntityLayout {
        page_index,
        rect: &image_rect,
        highlight,
        options,
    };
    for entity in &order_entities(document.entities()) {
        layout.push(&mut overlay.entities, entity, None);
    }
    overlay.elements = layout_elements(
        page,
        document.text.as_deref().unwrap_or_default(),
        &image_rect,
        options,
    );
    Ok(overlay)
}

fn layout_elements(
    page: &Page,
    text: &str,
    rect: &PlacedRect,
    options: &OverlayOptions,
) -> Vec<LayoutOverlay> {
    let mut elements = Vec::new();
    let mut push = |kind: LayoutKind, index: usize, layout: &Layout| match layout.quad() {
        Some(vertices) => elements.push(LayoutOverlay {
            kind,
            index,
            text: layout.text(text),
            confidence: layout.confidence,
            points: to_pixels(rect, vertices),
        }),
        None => tracing::debug!("{} {index} has no 4-vertex polygon; not drawn", kind.as_str()),
    };

    if options.include_blocks {
        for (index, block) in page.blocks.iter().enumerate() {
            push(LayoutKind::Block, index, &block.layout);
        }
    }
    if options.include_form_fields {
        for (index, field) in page.form_fields.iter().enumerate() {
            if let Some(name) = &field.field_name {
                push(LayoutKind::FieldName, index, name);
            }
            if let Some(value) = &field.field_value {
                push(LayoutKind::FieldValue, index, value);
            }
        }
    }
    elements
}

struct EntityLayout<'a> {
    page_index: usize,
    rect: &'a PlacedRect,
    highlight: &'a Highlight,
    options: &'a OverlayOptions,
}

impl EntityLayout<'_> {
    fn push(&self, out: &mut Vec<EntityOverlay>, entity: &Entity, parent_id: Option<&str>) {
        if entity.page() == self.page_index {
            match entity.polygon() {
                Some(vertices) if vertices.len() == 4 => out.push(EntityOverlay {
                    entity_id: entity.id.clone(),
                    entity_type: entity.entity_type.clone(),
                    mention_text: entity.mention_text.clone(),
                    confidence: entity.confidence,
                    parent_id: parent_id.map(str::to_string),
                    points: to_pixels(self.rect, vertices),
                    highlighted: self.highlight.matches(entity),
                }),
                Some(vertices) => tracing::warn!(
                    "entity {:?} has {} vertices, expected 4; not drawn",
                    entity.id,
                    vertices.len()
                ),
                None => {}
            }
        }

        if self.options.include_properties {
            for property in &entity.properties {
                self.push(out, property, Some(&entity.id));
            }
        }
    }
}

/// Render the overlay as a standalone SVG document.
///
/// `image` is the base64 page image content and its MIME type; without it
/// only the polygons are drawn. Layout elements are drawn below entities.
pub fn render_svg(overlay: &PageOverlay, image: Option<(&str, &str)>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let width = overlay.viewport.width.to_string();
    let height = overlay.viewport.height.to_string();
    let view_box = format!("0 0 {width} {height}");
    write(
        &mut writer,
        Event::Start(BytesStart::new("svg").with_attributes([
            ("xmlns", SVG_NAMESPACE),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("viewBox", view_box.as_str()),
        ])),
    )?;

    if let Some((content, mime_type)) = image {
        let rect = overlay.image_rect;
        let (x, y) = (rect.x.to_string(), rect.y.to_string());
        let (w, h) = (rect.width.to_string(), rect.height.to_string());
        let href = format!("data:{mime_type};base64,{content}");
        write(
            &mut writer,
            Event::Empty(BytesStart::new("image").with_attributes([
                ("x", x.as_str()),
                ("y", y.as_str()),
                ("width", w.as_str()),
                ("height", h.as_str()),
                ("href", href.as_str()),
            ])),
        )?;
    }

    for element in &overlay.elements {
        let color = element.kind.color();
        let points = svg_points(&element.points);
        let index = element.index.to_string();
        write_polygon(
            &mut writer,
            &[
                ("points", points.as_str()),
                ("fill", color),
                ("fill-opacity", "0.25"),
                ("stroke", color),
                ("data-layout-kind", element.kind.as_str()),
                ("data-layout-index", index.as_str()),
            ],
            &format!("{}: {}", element.kind.as_str(), element.text),
        )?;
    }

    for entity in &overlay.entities {
        let points = svg_points(&entity.points);
        write_polygon(
            &mut writer,
            &[
                ("points", points.as_str()),
                ("fill", if entity.highlighted { "blue" } else { "yellow" }),
                ("fill-opacity", "0.1"),
                ("stroke", "blue"),
                ("data-entity-id", entity.entity_id.as_str()),
            ],
            &format!("{}: {}", entity.entity_type, entity.mention_text),
        )?;
    }

    write(&mut writer, Event::End(BytesEnd::new("svg")))?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| OverlayError::Svg(e.to_string()))
}

fn write_polygon(
    writer: &mut Writer<Vec<u8>>,
    attributes: &[(&str, &str)],
    title: &str,
) -> Result<()> {
    let polygon = BytesStart::new("polygon").with_attributes(attributes.iter().copied());
    write(writer, Event::Start(polygon))?;
    write(writer, Event::Start(BytesStart::new("title")))?;
    write(writer, Event::Text(BytesText::new(title)))?;
    write(writer, Event::End(BytesEnd::new("title")))?;
    write(writer, Event::End(BytesEnd::new("polygon")))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| OverlayError::Svg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverlayError;
    use crate::model::{Block, FormField, PageImage};

    fn document() -> Document {
        Document::new()
            .with_page(Page::new(1).with_image(PageImage::new("").with_size(600, 800)))
            .with_page(Page::new(2).with_image(PageImage::new("").with_size(800, 200)))
            .with_entity(Entity::new("low", "total").with_box(0, 0.5, 0.5, 1.0, 1.0))
            .with_entity(Entity::new("high", "supplier").with_box(0, 0.0, 0.0, 0.5, 0.5))
            .with_entity(Entity::new("second", "date").with_box(1, 0.0, 0.0, 1.0, 1.0))
            .with_entity(Entity::new("floating", "note"))
    }

    #[test]
    fn test_layout_first_page() {
        let overlay = layout_page(
            &document(),
            0,
            Size::new(100.0, 100.0),
            &Highlight::None,
            &OverlayOptions::default(),
        )
        .unwrap();

        assert!(overlay.is_ready());
        assert_eq!(overlay.page_number, 1);
        assert_eq!(overlay.placement, PlacedRect::new(75.0, 100.0, 12.5, 0.0));
        let ids: Vec<_> = overlay.entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low"]);
        assert_eq!(overlay.entities[0].points[0], Point::new(12.5, 0.0));
        assert_eq!(overlay.entities[1].points[2], Point::new(87.5, 100.0));
    }

    #[test]
    fn test_layout_second_page() {
        let overlay = layout_page(
            &document(),
            1,
            Size::new(200.0, 50.0),
            &Highlight::Flag(true),
            &OverlayOptions::default(),
        )
        .unwrap();

        assert_eq!(overlay.entities.len(), 1);
        assert_eq!(overlay.entities[0].entity_id, "second");
        assert!(overlay.entities[0].highlighted);
        assert_eq!(overlay.entities[0].points[2], Point::new(200.0, 50.0));
    }

    #[test]
    fn test_highlight_by_id() {
        let overlay = layout_page(
            &document(),
            0,
            Size::new(100.0, 100.0),
            &Highlight::id("low"),
            &OverlayOptions::default(),
        )
        .unwrap();

        let highlighted: Vec<_> = overlay.highlighted().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(highlighted, vec!["low"]);
    }

    #[test]
    fn test_margin() {
        let options = OverlayOptions {
            image_margin: 5.0,
            ..OverlayOptions::default()
        };
        let overlay =
            layout_page(&document(), 0, Size::new(100.0, 100.0), &Highlight::None, &options)
                .unwrap();

        assert_eq!(overlay.image_rect, PlacedRect::new(65.0, 90.0, 17.5, 5.0));
        assert_eq!(overlay.entities[0].points[0], Point::new(17.5, 5.0));
    }

    #[test]
    fn test_unknown_image_size_draws_nothing() {
        let doc = Document::new()
            .with_page(Page::new(1))
            .with_entity(Entity::new("a", "total").with_box(0, 0.0, 0.0, 1.0, 1.0));
        let overlay = layout_page(
            &doc,
            0,
            Size::new(100.0, 100.0),
            &Highlight::None,
            &OverlayOptions::default(),
        )
        .unwrap();

        assert!(!overlay.is_ready());
        assert!(overlay.entities.is_empty());
    }

    #[test]
    fn test_invalid_page() {
        let result = layout_page(
            &document(),
            5,
            Size::new(100.0, 100.0),
            &Highlight::None,
            &OverlayOptions::default(),
        );
        assert!(matches!(result, Err(OverlayError::InvalidPageNumber(5, 2))));
    }

    #[test]
    fn test_properties() {
        let item = Entity::new("item", "line_item")
            .with_box(0, 0.0, 0.1, 1.0, 0.2)
            .with_property(Entity::new("amount", "line_item/amount").with_box(0, 0.8, 0.1, 1.0, 0.2))
            .with_property(Entity::new("desc", "line_item/description").with_box(0, 0.0, 0.1, 0.5, 0.2))
            .with_property(Entity::new("qty", "line_item/quantity").with_polygon(0, vec![Point::origin()]));
        let doc = Document::new()
            .with_page(Page::new(1).with_image(PageImage::new("").with_size(100, 100)))
            .with_entity(item);

        let viewport = Size::new(100.0, 100.0);
        let without =
            layout_page(&doc, 0, viewport, &Highlight::None, &OverlayOptions::default()).unwrap();
        assert_eq!(without.entities.len(), 1);

        let options = OverlayOptions {
            include_properties: true,
            ..OverlayOptions::default()
        };
        let with = layout_page(&doc, 0, viewport, &Highlight::None, &options).unwrap();
        let ids: Vec<_> = with.entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["item", "desc", "amount"]);
        assert_eq!(with.entities[1].parent_id.as_deref(), Some("item"));
    }

    #[test]
    fn test_render_svg() {
        let doc = Document::new()
            .with_page(Page::new(1).with_image(PageImage::new("").with_size(100, 100)))
            .with_entity(
                Entity::new("e<1>", "total")
                    .with_mention_text("A & B")
                    .with_box(0, 0.0, 0.0, 0.5, 0.5),
            );
        let overlay = layout_page(
            &doc,
            0,
            Size::new(100.0, 100.0),
            &Highlight::id("e<1>"),
            &OverlayOptions::default(),
        )
        .unwrap();

        let svg = render_svg(&overlay, Some(("QUJD", "image/png"))).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"href="data:image/png;base64,QUJD""#));
        assert!(svg.contains(r#"points="0,0 50,0 50,50 0,50""#));
        assert!(svg.contains(r#"fill="blue""#));
        assert!(svg.contains("e&lt;1&gt;"));
        assert!(svg.contains("A &amp; B"));
        assert!(svg.trim_end().ends_with("</svg>"));

        let bare = render_svg(&overlay, None).unwrap();
        assert!(!bare.contains("<image"));
        assert!(!bare.contains("data-layout-kind"));
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    fn form_document() -> Document {
        let page = Page::new(1)
            .with_image(PageImage::new("").with_size(100, 100))
            .with_block(Block::new(
                Layout::with_polygon(square(0.1, 0.1, 0.5, 0.2)).with_segment(0, 9),
            ))
            .with_block(Block::new(
                Layout::with_polygon(square(0.1, 0.3, 0.5, 0.4)[..3].to_vec()).with_segment(10, 14),
            ))
            .with_form_field(FormField::new(
                Layout::with_polygon(square(0.1, 0.1, 0.3, 0.2)).with_segment(0, 5),
                Layout::with_polygon(square(0.3, 0.1, 0.5, 0.2)).with_segment(6, 9),
            ));
        let mut document = Document::new()
            .with_page(page)
            .with_entity(Entity::new("name", "person").with_box(0, 0.3, 0.1, 0.5, 0.2));
        document.text = Some("Name: Ada\nBody".to_string());
        document
    }

    #[test]
    fn test_layout_elements_are_opt_in() {
        let overlay = layout_page(
            &form_document(),
            0,
            Size::new(100.0, 100.0),
            &Highlight::None,
            &OverlayOptions::default(),
        )
        .unwrap();

        assert_eq!(overlay.entities.len(), 1);
        assert!(overlay.elements.is_empty());
    }

    #[test]
    fn test_layout_blocks() {
        let options = OverlayOptions {
            include_blocks: true,
            ..OverlayOptions::default()
        };
        let overlay = layout_page(
            &form_document(),
            0,
            Size::new(200.0, 100.0),
            &Highlight::None,
            &options,
        )
        .unwrap();

        // The three-vertex block is skipped
        assert_eq!(overlay.elements.len(), 1);
        let block = &overlay.elements[0];
        assert_eq!(block.kind, LayoutKind::Block);
        assert_eq!(block.index, 0);
        assert_eq!(block.text, "Name: Ada");
        assert_eq!(block.points[0], Point::new(60.0, 10.0));
        assert_eq!(block.points[2], Point::new(100.0, 20.0));
    }

    #[test]
    fn test_layout_form_fields() {
        let options = OverlayOptions {
            include_form_fields: true,
            image_margin: 10.0,
            ..OverlayOptions::default()
        };
        let overlay = layout_page(
            &form_document(),
            0,
            Size::new(100.0, 100.0),
            &Highlight::None,
            &options,
        )
        .unwrap();

        let kinds: Vec<_> = overlay.elements.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![LayoutKind::FieldName, LayoutKind::FieldValue]);
        assert_eq!(overlay.elements[0].text, "Name:");
        assert_eq!(overlay.elements[1].text, "Ada");
        assert_eq!(overlay.elements[1].points[0], Point::new(34.0, 18.0));
    }

    #[test]
    fn test_layout_elements_wait_for_placement() {
        let mut document = form_document();
        document.pages[0].image = None;
        let options = OverlayOptions {
            include_blocks: true,
            include_form_fields: true,
            ..OverlayOptions::default()
        };
        let overlay = layout_page(
            &document,
            0,
            Size::new(100.0, 100.0),
            &Highlight::None,
            &options,
        )
        .unwrap();

        assert!(!overlay.is_ready());
        assert!(overlay.elements.is_empty());
    }

    #[test]
    fn test_render_svg_layout_elements() {
        let options = OverlayOptions {
            include_blocks: true,
            include_form_fields: true,
            ..OverlayOptions::default()
        };
        let overlay = layout_page(
            &form_document(),
            0,
            Size::new(100.0, 100.0),
            &Highlight::None,
            &options,
        )
        .unwrap();

        let svg = render_svg(&overlay, None).unwrap();
        assert!(svg.contains(r#"fill="orange""#));
        assert!(svg.contains(r#"fill="red""#));
        assert!(svg.contains(r#"data-layout-kind="fieldName""#));
        assert!(svg.contains(r#"points="10,10 50,10 50,20 10,20""#));
        assert!(svg.contains("<title>fieldValue: Ada</title>"));

        // Layout elements sit below the entity polygons
        let block = svg.find("data-layout-kind").unwrap();
        let entity = svg.find("data-entity-id").unwrap();
        assert!(block < entity);
    }

    #[test]
    fn test_options_default() {
        let options = OverlayOptions::default();
        assert_eq!(options.image_margin, 0.0);
        assert!(!options.include_properties);
        assert!(!options.include_blocks);
        assert!(!options.include_form_fields);
    }
}
