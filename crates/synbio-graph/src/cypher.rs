//! Cypher for the node and edge upserts the writer issues.
//!
//! A node upsert is an exact-match lookup followed, when nothing matches, by
//! a create in the same transaction. An edge upsert is a single MERGE.
//!
//! Property values always travel as bind parameters. Labels, relationship
//! types and property keys cannot be parameterized in Cypher, so they are
//! backtick-quoted instead.

use neo4rs::{query, BoltType, Query};

use synbio_core::{Properties, RelationType, Scalar};

use crate::store::NodeHandle;

/// A Cypher statement with its bind parameters, before it is handed to the
/// driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<(String, Scalar)>,
}

impl Statement {
    pub fn param(&self, name: &str) -> Option<&Scalar> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn to_query(&self) -> Query {
        self.params
            .iter()
            .fold(query(&self.text), |q, (key, value)| {
                q.param(key, to_bolt(value))
            })
    }
}

/// Find the nodes whose label and property set are exactly `label` and
/// `properties`, returning each element id as `handle`.
///
/// A Cypher property map only constrains the keys it names, so the key count
/// is pinned as well: a node carrying extra properties is a different node.
pub fn match_node(label: &str, properties: &Properties) -> Statement {
    let (pattern, mut params) = property_pattern(properties);
    params.push(("arity".to_string(), Scalar::Integer(properties.len() as i64)));

    let text = format!(
        "MATCH (n:{} {{{pattern}}})
         WHERE size(keys(n)) = $arity
         RETURN elementId(n) AS handle",
        quote_identifier(label),
    );

    Statement { text, params }
}

/// Create a node with exactly `label` and `properties`, returning its element
/// id as `handle`.
pub fn create_node(label: &str, properties: &Properties) -> Statement {
    let (pattern, params) = property_pattern(properties);

    let text = format!(
        "CREATE (n:{} {{{pattern}}})
         RETURN elementId(n) AS handle",
        quote_identifier(label),
    );

    Statement { text, params }
}

fn property_pattern(properties: &Properties) -> (String, Vec<(String, Scalar)>) {
    let mut params = Vec::with_capacity(properties.len() + 1);
    let mut pattern = Vec::with_capacity(properties.len());

    for (i, (key, value)) in properties.iter().enumerate() {
        let name = format!("p{i}");
        pattern.push(format!("{}: ${name}", quote_identifier(key)));
        params.push((name, value.clone()));
    }

    (pattern.join(", "), params)
}

/// MERGE an indexed edge between two already-resolved nodes, returning how
/// many edges were matched or created as `merged`.
pub fn merge_edge(
    parent: &NodeHandle,
    child: &NodeHandle,
    relation: &RelationType,
    index: i64,
) -> Statement {
    let text = format!(
        "MATCH (parent) WHERE elementId(parent) = $parent
         MATCH (child) WHERE elementId(child) = $child
         MERGE (parent)-[r:{} {{index: $index}}]->(child)
         RETURN count(r) AS merged",
        quote_identifier(relation.as_str())
    );

    Statement {
        text,
        params: vec![
            ("parent".to_string(), Scalar::String(parent.0.clone())),
            ("child".to_string(), Scalar::String(child.0.clone())),
            ("index".to_string(), Scalar::Integer(index)),
        ],
    }
}

/// Quote a label, relationship type or property key for use in Cypher.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn to_bolt(value: &Scalar) -> BoltType {
    match value {
        Scalar::Boolean(b) => BoltType::from(*b),
        Scalar::Integer(i) => BoltType::from(*i),
        Scalar::Float(f) => BoltType::from(*f),
        Scalar::String(s) => BoltType::from(s.clone()),
    }
}
