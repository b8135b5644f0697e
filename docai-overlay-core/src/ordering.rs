//! Reading-order sorting of entities
//!
//! Entities are grouped by page, pages are emitted in ascending index order,
//! and each page is sorted top-to-bottom by the first vertex of the entity's
//! primary anchor. Properties of composite entities are sorted left-to-right
//! first, because the primary anchor of such an entity is its first property.
//!
//! All sorts are stable and work on copies; the input is never modified.
//!
//! ```rust
//! use docai_overlay::model::Entity;
//! use docai_overlay::ordering::order_entities;
//!
//! let entities = vec![
//!     Entity::new("total", "total_amount").with_box(0, 0.6, 0.9, 0.8, 0.95),
//!     Entity::new("header", "supplier_name").with_box(0, 0.1, 0.05, 0.4, 0.1),
//! ];
//! let ordered = order_entities(&entities);
//! assert_eq!(ordered[0].id, "header");
//! assert_eq!(ordered[1].id, "total");
//! ```

use crate::model::{Document, Entity, PageRef, MAX_PAGE_INDEX};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Sort key used when an entity has no usable polygon
pub const FALLBACK_SORT_KEY: f64 = 0.0;

/// Order entities into reading order.
///
/// Returns new values; entities missing anchor data sort first on page 0.
pub fn order_entities(entities: &[Entity]) -> Vec<Entity> {
    by_page(entities).into_values().flatten().collect()
}

/// Reading order grouped by page index.
///
/// The result has one slot per page index from 0 up to the highest page
/// any entity references; pages without entities get an empty slot.
pub fn group_by_page(entities: &[Entity]) -> Vec<Vec<Entity>> {
    let grouped = by_page(entities);
    let slots = grouped
        .keys()
        .next_back()
        .and_then(|last| last.checked_add(1))
        .unwrap_or(0);
    let mut pages: Vec<Vec<Entity>> = Vec::new();
    pages.resize_with(slots, Vec::new);
    for (page, run) in grouped {
        if let Some(slot) = pages.get_mut(page) {
            *slot = run;
        }
    }
    pages
}

/// Copy of `document` with its entities in reading order.
///
/// A document without an `entities` key is returned unchanged.
pub fn order_document(document: &Document) -> Document {
    let mut ordered = document.clone();
    if let Some(entities) = &document.entities {
        ordered.entities = Some(order_entities(entities));
    }
    ordered
}

/// Stable ascending sort by entity type, as shown in the entity list panel
pub fn sort_by_type(entities: &[Entity]) -> Vec<Entity> {
    let mut sorted = entities.to_vec();
    sorted.sort_by(|a, b| a.entity_type.cmp(&b.entity_type));
    sorted
}

/// Page reference that positions the entity.
///
/// Composite entities are placed by their first property, falling back to
/// their own anchor when that property has none.
pub fn primary_page_ref(entity: &Entity) -> Option<&PageRef> {
    entity
        .properties
        .first()
        .and_then(Entity::page_ref)
        .or_else(|| entity.page_ref())
}

/// Page index used for grouping.
///
/// 0 when the entity has no page reference or its index is above
/// [`MAX_PAGE_INDEX`].
pub fn page_index(entity: &Entity) -> usize {
    primary_page_ref(entity)
        .map(|r| r.page)
        .filter(|&page| page <= MAX_PAGE_INDEX)
        .unwrap_or(0)
}

/// Vertical sort key: Y of the first vertex of the primary anchor.
///
/// `None` unless the anchor is a 4-vertex polygon.
pub fn vertical_key(entity: &Entity) -> Option<f64> {
    primary_page_ref(entity)
        .and_then(PageRef::anchor_point)
        .map(|p| p.y)
        .filter(|y| y.is_finite())
}

/// Horizontal sort key: X of the first vertex, taken from the first nested
/// property when the entity has properties
pub fn horizontal_key(entity: &Entity) -> Option<f64> {
    match entity.properties.first() {
        Some(first) => horizontal_key(first),
        None => entity
            .page_ref()
            .and_then(PageRef::anchor_point)
            .map(|p| p.x)
            .filter(|x| x.is_finite()),
    }
}

fn by_page(entities: &[Entity]) -> BTreeMap<usize, Vec<Entity>> {
    let mut pages: BTreeMap<usize, Vec<Entity>> = BTreeMap::new();
    for entity in entities {
        let mut entity = entity.clone();
        sort_properties(&mut entity.properties);
        pages.entry(page_index(&entity)).or_default().push(entity);
    }

    let mut missing = 0usize;
    for run in pages.values_mut() {
        stable_sort_by_key(run, |entity| {
            vertical_key(entity).unwrap_or_else(|| {
                missing += 1;
                FALLBACK_SORT_KEY
            })
        });
    }
    if missing > 0 {
        tracing::debug!("{missing} entities have no anchor polygon, sorted first on their page");
    }
    pages
}

fn sort_properties(properties: &mut Vec<Entity>) {
    for property in properties.iter_mut() {
        sort_properties(&mut property.properties);
    }
    stable_sort_by_key(properties, |property| {
        horizontal_key(property).unwrap_or(FALLBACK_SORT_KEY)
    });
}

/// Extract one key per entity, then stable sort on the keys.
///
/// Keys must be finite so that the comparison is a total order.
fn stable_sort_by_key<F>(entities: &mut Vec<Entity>, mut key: F)
where
    F: FnMut(&Entity) -> f64,
{
    let mut keyed: Vec<(f64, Entity)> = entities.drain(..).map(|e| (key(&e), e)).collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    entities.extend(keyed.into_iter().map(|(_, entity)| entity));
}
