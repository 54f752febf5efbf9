//! Record trees: the unit of input to the graph writer.
//!
//! A record is a labeled node with a flat map of scalar properties and any
//! number of named child lists. Each child list becomes a set of directed
//! edges of that relationship type, numbered by list position.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;

// ── Scalars ───────────────────────────────────────────────────────

/// A property value stored on a graph node.
///
/// Integers and floats are distinct: `Integer(1)` and `Float(1.0)` are
/// different values and therefore different MERGE identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Whether this value can take part in an equality match.
    /// NaN and infinities never compare equal after a round trip.
    pub fn is_mergeable(&self) -> bool {
        match self {
            Self::Float(f) => f.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Property map of a record. Key order carries no meaning.
pub type Properties = BTreeMap<String, Scalar>;

// ── Relationship Types ────────────────────────────────────────────

/// Name of the relationship a child list is written under
/// (e.g. `CONTAINS`, `BUILT_FROM`, `FOUND_IN`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationType(String);

impl RelationType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RelationType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RelationType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for RelationType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ── Records ───────────────────────────────────────────────────────

/// One node of a record tree.
///
/// `(label, properties)` is the node's identity in the graph: two records
/// with the same label and exactly the same properties resolve to the same
/// node. Callers put whatever natural key they have (usually `id`) into
/// `properties`.
///
/// `children` keeps relationship types in insertion order, and each list in
/// insertion order. List position becomes the `index` property of the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<RelationType, Vec<Record>>,
}

impl Record {
    /// A record with no properties and no children.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            properties: Properties::new(),
            children: IndexMap::new(),
        }
    }

    /// Builder form of [`Record::set_property`].
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Builder form of [`Record::push_child`].
    pub fn with_child(mut self, relation: impl Into<RelationType>, child: Record) -> Self {
        self.push_child(relation, child);
        self
    }

    /// Set a property, returning the previous value if there was one.
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Scalar>,
    ) -> Option<Scalar> {
        self.properties.insert(key.into(), value.into())
    }

    /// Attach a named child list, or return the existing one.
    pub fn attach(&mut self, relation: impl Into<RelationType>) -> &mut Vec<Record> {
        self.children.entry(relation.into()).or_default()
    }

    /// Append a child to the named list, attaching the list if needed.
    pub fn push_child(&mut self, relation: impl Into<RelationType>, child: Record) {
        self.attach(relation).push(child);
    }

    /// The child list written under `relation`, if attached.
    pub fn children_of(&self, relation: &str) -> Option<&[Record]> {
        self.children.get(relation).map(Vec::as_slice)
    }

    pub fn property(&self, key: &str) -> Option<&Scalar> {
        self.properties.get(key)
    }

    /// Number of records in this tree, including `self`.
    pub fn record_count(&self) -> usize {
        self.walk().count()
    }

    /// Number of parent→child edges in this tree.
    pub fn edge_count(&self) -> usize {
        self.record_count() - 1
    }

    /// Depth-first, pre-order traversal in write order: a record, then each
    /// child list in declaration order, each list front to back.
    /// Yields `(depth, record)` with the root at depth 0.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    /// Check that every record in the tree can form a MERGE pattern.
    ///
    /// Returns the first violation in write order.
    pub fn validate(&self) -> Result<(), ConstraintError> {
        let root_path = if self.label.is_empty() {
            "<root>".to_string()
        } else {
            self.label.clone()
        };
        self.validate_at(&root_path)
    }

    fn validate_at(&self, path: &str) -> Result<(), ConstraintError> {
        if self.label.is_empty() {
            return Err(ConstraintError::EmptyLabel {
                path: path.to_string(),
            });
        }
        if self.properties.is_empty() {
            return Err(ConstraintError::EmptyProperties {
                path: path.to_string(),
            });
        }
        for (key, value) in &self.properties {
            if key.is_empty() {
                return Err(ConstraintError::EmptyPropertyKey {
                    path: path.to_string(),
                });
            }
            if !value.is_mergeable() {
                return Err(ConstraintError::NonFiniteFloat {
                    path: path.to_string(),
                    key: key.clone(),
                });
            }
        }

        for (relation, list) in &self.children {
            if relation.as_str().is_empty() {
                return Err(ConstraintError::EmptyRelationType {
                    path: path.to_string(),
                });
            }
            for (index, child) in list.iter().enumerate() {
                child.validate_at(&format!("{path}/{relation}[{index}]"))?;
            }
        }

        Ok(())
    }
}

/// Iterator returned by [`Record::walk`].
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Record)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Record);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, record) = self.stack.pop()?;
        for list in record.children.values().rev() {
            for child in list.iter().rev() {
                self.stack.push((depth + 1, child));
            }
        }
        Some((depth, record))
    }
}
