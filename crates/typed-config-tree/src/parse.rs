use kdl::{KdlDocument, KdlNode, KdlValue};

use crate::error::TreeError;
use crate::node::{Mapping, Node, Scalar};

/// Node name that marks an anonymous sequence item.
const SEQUENCE_ITEM: &str = "-";

/// Parse a KDL document into a configuration tree.
///
/// Each KDL node becomes a mapping entry named after the node. Arguments
/// become scalars (or a sequence when there are several), properties and
/// children become nested mappings, and children all named `-` become a
/// sequence.
pub fn parse_kdl(contents: &str) -> Result<Node, TreeError> {
    let document: KdlDocument = contents
        .parse()
        .map_err(|e: kdl::KdlError| TreeError::Kdl(e.to_string()))?;
    document_to_node(&document)
}

fn document_to_node(document: &KdlDocument) -> Result<Node, TreeError> {
    let nodes = document.nodes();
    if !nodes.is_empty() && nodes.iter().all(|n| n.name().value() == SEQUENCE_ITEM) {
        let items = nodes.iter().map(node_value).collect::<Result<Vec<_>, _>>()?;
        return Ok(Node::Sequence(items));
    }

    let mut mapping = Mapping::new();
    for node in nodes {
        insert_unique(&mut mapping, node.name().value(), node_value(node)?)?;
    }
    Ok(Node::Mapping(mapping))
}

fn node_value(node: &KdlNode) -> Result<Node, TreeError> {
    let mut args = Vec::new();
    let mut props = Mapping::new();

    for entry in node.entries() {
        let value = kdl_value_to_node(entry.value())?;
        match entry.name() {
            Some(key) => insert_unique(&mut props, key.value(), value)?,
            None => args.push(value),
        }
    }

    let children = node.children();
    if !args.is_empty() && (!props.is_empty() || children.is_some()) {
        return Err(TreeError::MixedEntries {
            node: node.name().value().to_string(),
        });
    }

    if let Some(children) = children {
        return match document_to_node(children)? {
            Node::Sequence(items) if props.is_empty() => Ok(Node::Sequence(items)),
            Node::Mapping(map) => {
                for (key, value) in map {
                    insert_unique(&mut props, &key, value)?;
                }
                Ok(Node::Mapping(props))
            }
            _ => Err(TreeError::MixedEntries {
                node: node.name().value().to_string(),
            }),
        };
    }

    if !props.is_empty() {
        return Ok(Node::Mapping(props));
    }

    match args.len() {
        0 => Ok(Node::Null),
        1 => Ok(args.into_iter().next().unwrap_or_default()),
        _ => Ok(Node::Sequence(args)),
    }
}

fn insert_unique(mapping: &mut Mapping, key: &str, value: Node) -> Result<(), TreeError> {
    if mapping.contains_key(key) {
        return Err(TreeError::DuplicateKey {
            key: key.to_string(),
        });
    }
    mapping.insert(key.to_string(), value);
    Ok(())
}

fn kdl_value_to_node(value: &KdlValue) -> Result<Node, TreeError> {
    match value {
        KdlValue::String(s) => Ok(Node::Scalar(Scalar::String(s.to_string()))),
        KdlValue::Integer(i) => i64::try_from(*i)
            .map(|n| Node::Scalar(Scalar::Int(n)))
            .map_err(|_| TreeError::IntegerOverflow {
                value: i.to_string(),
            }),
        KdlValue::Float(f) => Ok(Node::Scalar(Scalar::Float(*f))),
        KdlValue::Bool(b) => Ok(Node::Scalar(Scalar::Bool(*b))),
        KdlValue::Null => Ok(Node::Null),
    }
}
