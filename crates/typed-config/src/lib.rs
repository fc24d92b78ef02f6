//! Schema-driven decoding of YAML and KDL trees into typed values.
//!
//! A [`Schema`] describes a type's fields. The [`Decoder`] turns a parsed
//! [`Node`] tree into an [`Object`] following it, using [`Registries`] for
//! polymorphic contracts, lazy references, custom defaults and constant
//! tables. Rust types implement [`Configurable`], either by hand or through
//! [`configurable!`].
#![allow(clippy::result_large_err)]

mod macros;

pub mod builder;
pub mod coerce;
pub mod config;
pub mod constants;
pub mod context;
pub mod contracts;
pub mod convert;
pub mod decoder;
pub mod defaults;
pub mod error;
pub mod naming;
pub mod node_path;
pub mod references;
pub mod schema;
pub mod validation;
pub mod value;

use std::sync::Arc;

pub use builder::{InstanceBuilder, UsedKeys};
pub use coerce::ValueCoercer;
pub use config::{DecodeOptions, EffectiveOptions, resolve_schema};
pub use constants::{ConstantRegistry, ConstantTable};
pub use context::{DecodeContext, Registries};
pub use contracts::{
    Contract, ContractBuilder, ContractRegistry, DEFAULT_DISCRIMINATOR, Placement,
};
pub use convert::FromValue;
pub use decoder::Decoder;
pub use defaults::{DefaultSpec, DefaultValueSource, Extractor};
pub use error::ConfigError;
pub use naming::{camel_to_kebab, constant_to_kebab, external_name};
pub use node_path::{FieldPath, PathSegment};
pub use references::{Reference, ReferenceHandle, ReferenceRegistry};
pub use schema::{
    Constraint, ConstraintKind, EnumSpec, FieldDescriptor, ReferenceType, Schema, SchemaBuilder,
    SchemaCell, TypeKind, TypeRef,
};
pub use typed_config_tree::{Mapping, Node, Scalar, TreeError, parse_kdl, parse_yaml};
pub use validation::{validate_object, validate_value};
pub use value::{EnumValue, Object, Value};

/// A Rust type with a declared schema, decodable from a tree.
///
/// [`configurable!`] derives both impls from field descriptors. Hand-written
/// implementations usually keep the schema in a `static` [`SchemaCell`]
/// and read fields off the decoded [`Object`] in [`FromValue`].
pub trait Configurable: FromValue {
    fn schema() -> Result<Arc<Schema>, ConfigError>;

    /// The schema as a field type, for nesting in other schemas.
    fn type_ref() -> Result<TypeRef, ConfigError> {
        Self::schema().map(TypeRef::Object)
    }
}

/// Decode `root` into `T` with default options.
pub fn decode<T: Configurable>(root: &Node, registries: &Registries) -> Result<T, ConfigError> {
    Decoder::new(registries).decode(root)
}

/// Parse a YAML document and decode it into `T`.
pub fn decode_yaml<T: Configurable>(
    contents: &str,
    registries: &Registries,
) -> Result<T, ConfigError> {
    let root = typed_config_tree::parse_yaml(contents)?;
    decode(&root, registries)
}

/// Parse a KDL document and decode it into `T`.
pub fn decode_kdl<T: Configurable>(
    contents: &str,
    registries: &Registries,
) -> Result<T, ConfigError> {
    let root = typed_config_tree::parse_kdl(contents)?;
    decode(&root, registries)
}
