use std::fmt;

use indexmap::IndexMap;

/// Insertion-ordered mapping with unique string keys.
pub type Mapping = IndexMap<String, Node>;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A decoded configuration document.
///
/// Produced by a document parser and never mutated afterwards; the decode
/// engine only borrows it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Scalar(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(Scalar::String(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Scalar(Scalar::Int(value as i64))
    }
}

impl From<u32> for Node {
    fn from(value: u32) -> Self {
        Node::Scalar(Scalar::Int(value as i64))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Scalar(Scalar::Float(value))
    }
}

impl From<Mapping> for Node {
    fn from(value: Mapping) -> Self {
        Node::Mapping(value)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(values: Vec<T>) -> Self {
        Node::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Node::Mapping(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl Node {
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Short name of the node's shape, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Scalar(scalar) => scalar.type_name(),
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, Scalar};

    #[test]
    fn mapping_from_pairs_keeps_insertion_order() {
        let node: Node = [("b", Node::from(1)), ("a", Node::from("x"))]
            .into_iter()
            .collect();
        let keys: Vec<_> = node.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(node.get("a").and_then(Node::as_str), Some("x"));
    }

    #[test]
    fn type_names_describe_shape() {
        assert_eq!(Node::Null.type_name(), "null");
        assert_eq!(Node::from(vec![1, 2]).type_name(), "sequence");
        assert_eq!(Node::from(2.5).type_name(), "float");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
    }
}
