use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Identity of an entity, normalized to its string form.
///
/// The API hands out string ids, but numeric ids are accepted and compared
/// by their decimal representation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The id escaped for use as one URL path segment.
    pub fn segment(&self) -> Cow<'_, str> {
        urlencoding::encode(&self.0)
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct EntityIdVisitor;

impl<'de> Visitor<'de> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("a string or integer id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(EntityId::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(EntityId(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(EntityId(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(EntityId(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

/// An embedded (populated) entity inside a relationship list. Only the id
/// and the display name are interpreted, the rest is carried along.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedded {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A relationship entry: a bare id, or the populated entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(EntityId),
    Embedded(Embedded),
}

impl EntityRef {
    pub fn id(&self) -> &EntityId {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Embedded(embedded) => &embedded.id,
        }
    }

    /// Display name when populated, the id otherwise.
    pub fn label(&self) -> &str {
        match self {
            EntityRef::Embedded(Embedded {
                name: Some(name), ..
            }) => name,
            _ => self.id().as_str(),
        }
    }

    pub fn refers_to(&self, id: &EntityId) -> bool {
        self.id() == id
    }
}

impl From<EntityId> for EntityRef {
    fn from(value: EntityId) -> Self {
        EntityRef::Id(value)
    }
}

impl From<&str> for EntityRef {
    fn from(value: &str) -> Self {
        EntityRef::Id(EntityId::new(value))
    }
}

/// Whether `refs` holds an entry for `id`.
pub fn contains(refs: &[EntityRef], id: &EntityId) -> bool {
    refs.iter().any(|entry| entry.refers_to(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_and_embedded_compare_equal() -> anyhow::Result<()> {
        let refs: Vec<EntityRef> =
            serde_json::from_str(r#"["x", {"_id": "x", "name": "Ravi"}, 42]"#)?;
        assert_eq!(refs[0].id(), refs[1].id());
        assert_eq!(refs[2].id(), &EntityId::new("42"));
        assert!(contains(&refs, &EntityId::new("x")));
        assert!(!contains(&refs, &EntityId::new("y")));
        Ok(())
    }

    #[test]
    fn test_segment_is_escaped() {
        assert_eq!(EntityId::new("665f1c2ab1").segment(), "665f1c2ab1");
        assert_eq!(EntityId::new("b1/students").segment(), "b1%2Fstudents");
        assert_eq!(EntityId::new("b1?x=1#top").segment(), "b1%3Fx%3D1%23top");
    }

    #[test]
    fn test_label() -> anyhow::Result<()> {
        let populated: EntityRef = serde_json::from_str(r#"{"_id":"s1","name":"Ravi"}"#)?;
        let bare: EntityRef = serde_json::from_str(r#""s2""#)?;
        assert_eq!(populated.label(), "Ravi");
        assert_eq!(bare.label(), "s2");
        Ok(())
    }

    #[test]
    fn test_embedded_keeps_unknown_fields() -> anyhow::Result<()> {
        let raw = r#"{"_id":"s1","name":"Ravi","email":"ravi@example.com"}"#;
        let entry: EntityRef = serde_json::from_str(raw)?;
        assert_eq!(
            serde_json::to_value(&entry)?,
            serde_json::from_str::<Value>(raw)?
        );
        Ok(())
    }
}
