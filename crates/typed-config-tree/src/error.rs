use thiserror::Error;

/// Failure to turn a textual document into a [`Node`](crate::Node) tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("kdl syntax error: {0}")]
    Kdl(String),
    #[error("yaml syntax error: {0}")]
    Yaml(String),
    #[error("duplicate key '{key}'")]
    DuplicateKey { key: String },
    #[error("unsupported mapping key: {reason}")]
    UnsupportedKey { reason: String },
    #[error("node '{node}' mixes positional arguments with properties or children")]
    MixedEntries { node: String },
    #[error("integer {value} does not fit in 64 bits")]
    IntegerOverflow { value: String },
}
