//! Canonical configuration tree shared by the decode engine and the
//! document parsers that feed it.

pub mod error;
pub mod node;
pub mod parse;
pub mod yaml;

pub use error::TreeError;
pub use node::{Mapping, Node, Scalar};
pub use parse::parse_kdl;
pub use yaml::{from_yaml_value, parse_yaml};
