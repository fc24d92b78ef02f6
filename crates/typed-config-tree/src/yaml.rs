use serde_yaml::Value as YamlValue;

use crate::error::TreeError;
use crate::node::{Mapping, Node, Scalar};

/// Parse a YAML document into a configuration tree.
pub fn parse_yaml(contents: &str) -> Result<Node, TreeError> {
    let value: YamlValue =
        serde_yaml::from_str(contents).map_err(|e| TreeError::Yaml(e.to_string()))?;
    from_yaml_value(&value)
}

/// Convert an already parsed YAML value.
///
/// Scalar keys are rendered to strings; tags are dropped in favor of the
/// tagged value.
pub fn from_yaml_value(value: &YamlValue) -> Result<Node, TreeError> {
    match value {
        YamlValue::Null => Ok(Node::Null),
        YamlValue::Bool(b) => Ok(Node::Scalar(Scalar::Bool(*b))),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Node::Scalar(Scalar::Int(i)))
            } else if n.is_u64() {
                Err(TreeError::IntegerOverflow {
                    value: n.to_string(),
                })
            } else {
                Ok(Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))))
            }
        }
        YamlValue::String(s) => Ok(Node::Scalar(Scalar::String(s.clone()))),
        YamlValue::Sequence(items) => items
            .iter()
            .map(from_yaml_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Node::Sequence),
        YamlValue::Mapping(entries) => {
            let mut mapping = Mapping::with_capacity(entries.len());
            for (key, value) in entries {
                let key = yaml_key(key)?;
                if mapping.contains_key(&key) {
                    return Err(TreeError::DuplicateKey { key });
                }
                mapping.insert(key, from_yaml_value(value)?);
            }
            Ok(Node::Mapping(mapping))
        }
        YamlValue::Tagged(tagged) => from_yaml_value(&tagged.value),
    }
}

fn yaml_key(key: &YamlValue) -> Result<String, TreeError> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(&tagged.value),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(TreeError::UnsupportedKey {
            reason: "mapping keys must be scalars".to_string(),
        }),
    }
}
