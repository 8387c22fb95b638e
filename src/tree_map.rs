//! Object hierarchy snapshot
//!
//! The host supplies parent and child adjacency for every object type once per
//! session. Both directions are keyed by the type of the object being looked
//! up; each entry maps a related object id to that object's own type.

use crate::access_control::types::{ObjectId, ObjectType};
use crate::error::ConfigError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Related objects of a node: id -> type
pub type Adjacency = BTreeMap<ObjectId, ObjectType>;

/// All nodes of one object type: id -> related objects
pub type TypeMap = BTreeMap<ObjectId, Adjacency>;

const PARENTS: &str = "parents";
const CHILDREN: &str = "children";

/// Immutable parent/child map of the content hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeMap {
    parents: BTreeMap<ObjectType, TypeMap>,
    children: BTreeMap<ObjectType, TypeMap>,
}

impl TreeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `parent` is an ancestor of `child`, filling both directions
    pub fn with_edge(
        mut self,
        child: (ObjectType, &str),
        parent: (ObjectType, &str),
    ) -> Self {
        let (child_type, child_id) = child;
        let (parent_type, parent_id) = parent;

        self.parents
            .entry(child_type)
            .or_default()
            .entry(child_id.to_string())
            .or_default()
            .insert(parent_id.to_string(), parent_type);
        self.children
            .entry(parent_type)
            .or_default()
            .entry(parent_id.to_string())
            .or_default()
            .insert(child_id.to_string(), child_type);
        self
    }

    /// Ancestors of an object, if the map knows any
    pub fn parents_of(&self, object_type: ObjectType, object_id: &str) -> Option<&Adjacency> {
        self.parents.get(&object_type)?.get(object_id)
    }

    /// Descendants of an object, if the map knows any
    pub fn children_of(&self, object_type: ObjectType, object_id: &str) -> Option<&Adjacency> {
        self.children.get(&object_type)?.get(object_id)
    }

    /// Every child entry for one object type
    pub fn children(&self, object_type: ObjectType) -> Option<&TypeMap> {
        self.children.get(&object_type)
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty() && self.children.is_empty()
    }

    /// Build a tree map from its JSON representation
    ///
    /// ```json
    /// { "parents":  { "post": { "12": { "3": "post" } } },
    ///   "children": { "post": { "3":  { "12": "post" } } } }
    /// ```
    ///
    /// Any section that is not shaped like this is rejected rather than
    /// treated as empty, since a silently dropped edge hides a restriction.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let root = as_object(value, "")?;
        let mut map = TreeMap::new();

        for (section, content) in root {
            let target = match section.as_str() {
                PARENTS => &mut map.parents,
                CHILDREN => &mut map.children,
                other => {
                    return Err(malformed(
                        other,
                        "expected only 'parents' and 'children' sections",
                    ));
                }
            };
            *target = parse_section(content, section)?;
        }

        Ok(map)
    }
}

fn parse_section(value: &Value, path: &str) -> Result<BTreeMap<ObjectType, TypeMap>, ConfigError> {
    let mut section = BTreeMap::new();

    for (type_name, nodes) in as_object(value, path)? {
        let type_path = format!("{}.{}", path, type_name);
        let object_type = parse_type(type_name, &type_path)?;
        let mut type_map = TypeMap::new();

        for (object_id, related) in as_object(nodes, &type_path)? {
            let node_path = format!("{}.{}", type_path, object_id);
            let mut adjacency = Adjacency::new();

            for (related_id, related_type) in as_object(related, &node_path)? {
                let leaf_path = format!("{}.{}", node_path, related_id);
                let type_name = related_type
                    .as_str()
                    .ok_or_else(|| malformed(&leaf_path, "expected an object type name"))?;
                adjacency.insert(related_id.clone(), parse_type(type_name, &leaf_path)?);
            }

            type_map.insert(object_id.clone(), adjacency);
        }

        section.insert(object_type, type_map);
    }

    Ok(section)
}

fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a serde_json::Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| malformed(path, &format!("expected a mapping, found {}", kind(value))))
}

fn parse_type(name: &str, path: &str) -> Result<ObjectType, ConfigError> {
    ObjectType::try_parse(name)
        .ok_or_else(|| malformed(path, &format!("unknown object type '{}'", name)))
}

fn malformed(path: &str, reason: &str) -> ConfigError {
    ConfigError::MalformedTreeMap {
        path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
        reason: reason.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
