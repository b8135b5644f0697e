//! Which entities are drawn highlighted

use crate::model::Entity;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Highlight selection, resolved once when it enters the library.
///
/// Serialized as `null` (none), a string (entity id) or a bool (all/none).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Highlight {
    #[default]
    None,
    /// Highlight the entity with this id
    Id(String),
    /// Highlight every entity, or none
    Flag(bool),
}

impl Highlight {
    pub fn id(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            Self::None
        } else {
            Self::Id(id)
        }
    }

    /// Resolve a loosely typed selection.
    ///
    /// Strings select by id, booleans select all or nothing, and objects
    /// select by their `id` field. Empty strings, `false` and anything else
    /// resolve to [`Highlight::None`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(id) => Self::id(id.as_str()),
            Value::Bool(true) => Self::Flag(true),
            Value::Object(map) => match map.get("id") {
                Some(Value::String(id)) => Self::id(id.as_str()),
                _ => Self::None,
            },
            _ => Self::None,
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Self::None => false,
            Self::Id(id) => entity.id == *id,
            Self::Flag(flag) => *flag,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<&Entity> for Highlight {
    fn from(entity: &Entity) -> Self {
        Self::id(entity.id.as_str())
    }
}

impl From<Option<&str>> for Highlight {
    fn from(id: Option<&str>) -> Self {
        id.map(|id| Self::id(id)).unwrap_or_default()
    }
}

impl Serialize for Highlight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Id(id) => serializer.serialize_str(id),
            Self::Flag(flag) => serializer.serialize_bool(*flag),
        }
    }
}

impl<'de> Deserialize<'de> for Highlight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}
