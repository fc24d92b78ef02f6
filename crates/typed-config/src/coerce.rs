use std::sync::Arc;

use indexmap::IndexMap;
use typed_config_tree::{Mapping, Node, Scalar};

use crate::builder::InstanceBuilder;
use crate::context::DecodeContext;
use crate::contracts::{Contract, Placement};
use crate::error::ConfigError;
use crate::naming;
use crate::node_path::FieldPath;
use crate::schema::{EnumSpec, ReferenceType, TypeRef};
use crate::value::{EnumValue, Value};

/// Converts tree nodes into values of a declared [`TypeRef`].
#[derive(Debug, Clone, Copy)]
pub struct ValueCoercer<'a> {
    ctx: DecodeContext<'a>,
}

impl<'a> ValueCoercer<'a> {
    pub fn new(ctx: DecodeContext<'a>) -> Self {
        Self { ctx }
    }

    /// Convert `node` into `ty`.
    ///
    /// `parent` is the mapping holding `node`, needed by polymorphic fields
    /// whose discriminator sits beside them. A null node is reported as a
    /// missing value; optional fields are handled before coercion.
    pub fn coerce(
        &self,
        node: &Node,
        ty: &TypeRef,
        path: &FieldPath,
        parent: Option<&Mapping>,
    ) -> Result<Value, ConfigError> {
        log::trace!("coercing {} into {ty} at {path}", node.type_name());
        if node.is_null() {
            return Err(ConfigError::missing(path));
        }

        match ty {
            TypeRef::String => coerce_string(node, ty, path),
            TypeRef::Int => {
                let n = coerce_integer(node, ty, path)?;
                i32::try_from(n).map(Value::Int).map_err(|_| {
                    ConfigError::conversion(path, node.type_name(), ty.to_string())
                        .with_detail(format!("{n} is out of range"))
                })
            }
            TypeRef::Long => coerce_integer(node, ty, path).map(Value::Long),
            TypeRef::Double => coerce_double(node, ty, path).map(Value::Double),
            TypeRef::Bool => coerce_bool(node, ty, path).map(Value::Bool),
            TypeRef::List(element) => self.elements(node, element, ty, path).map(Value::List),
            TypeRef::Set(element) => {
                let items = self.elements(node, element, ty, path)?;
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::Set(unique))
            }
            TypeRef::Map(value_ty) => self.entries(node, value_ty, ty, path).map(Value::Map),
            TypeRef::Object(schema) => {
                let mapping = expect_mapping(node, ty, path)?;
                InstanceBuilder::new(self.ctx)
                    .build(mapping, schema, path)
                    .map(Value::Object)
            }
            TypeRef::Enum(spec) => coerce_enum(node, spec, ty, path),
            TypeRef::Contract(name) => self.contract(node, name, ty, path, parent),
            TypeRef::Reference(reference) => self.reference(node, reference, ty, path),
        }
    }

    /// Convert a mapping key into the type of a simple key field.
    pub fn coerce_key(
        &self,
        key: &str,
        ty: &TypeRef,
        path: &FieldPath,
    ) -> Result<Value, ConfigError> {
        self.coerce(&Node::Scalar(Scalar::String(key.to_string())), ty, path, None)
    }

    fn elements(
        &self,
        node: &Node,
        element: &TypeRef,
        ty: &TypeRef,
        path: &FieldPath,
    ) -> Result<Vec<Value>, ConfigError> {
        let items = node
            .as_sequence()
            .ok_or_else(|| ConfigError::conversion(path, node.type_name(), ty.to_string()))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.coerce(item, element, &path.index(i), None))
            .collect()
    }

    fn entries(
        &self,
        node: &Node,
        value_ty: &TypeRef,
        ty: &TypeRef,
        path: &FieldPath,
    ) -> Result<IndexMap<String, Value>, ConfigError> {
        let mapping = expect_mapping(node, ty, path)?;
        let mut entries = IndexMap::with_capacity(mapping.len());
        for (key, item) in mapping {
            let value = self.coerce(item, value_ty, &path.field(key), Some(mapping))?;
            entries.insert(key.clone(), value);
        }
        Ok(entries)
    }

    fn contract(
        &self,
        node: &Node,
        name: &str,
        ty: &TypeRef,
        path: &FieldPath,
        parent: Option<&Mapping>,
    ) -> Result<Value, ConfigError> {
        let contract = self.ctx.registries.contracts.get(name).ok_or_else(|| {
            ConfigError::UnresolvedPolymorphicType {
                contract: name.to_string(),
                discriminator: String::new(),
            }
        })?;
        let mapping = expect_mapping(node, ty, path)?;

        match contract.placement() {
            Placement::Nested => {
                let key = contract.discriminator();
                let discriminator = discriminator_value(mapping, key, &path.field(key))?;
                let schema = contract.variant(&discriminator)?;
                log::debug!(
                    "{name} at {path} selected variant {} via nested '{key}'",
                    schema.name()
                );
                let remaining: Mapping = mapping
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                self.build_variant(&contract, &remaining, schema, discriminator, path)
            }
            Placement::Inline => {
                let parent = parent.ok_or_else(|| {
                    ConfigError::schema(format!(
                        "contract {name} uses inline placement, but '{path}' has no enclosing mapping"
                    ))
                })?;
                let key = contract.discriminator();
                let discriminator = discriminator_value(parent, key, &path.parent().field(key))?;
                let schema = contract.variant(&discriminator)?;
                log::debug!(
                    "{name} at {path} selected variant {} via inline '{key}'",
                    schema.name()
                );
                self.build_variant(&contract, mapping, schema, discriminator, path)
            }
        }
    }

    fn build_variant(
        &self,
        contract: &Contract,
        mapping: &Mapping,
        schema: &Arc<crate::schema::Schema>,
        discriminator: String,
        path: &FieldPath,
    ) -> Result<Value, ConfigError> {
        log::trace!("building {} variant of {}", discriminator, contract.name());
        let object = InstanceBuilder::new(self.ctx).build(mapping, schema, path)?;
        Ok(Value::Object(object.with_variant(discriminator)))
    }

    fn reference(
        &self,
        node: &Node,
        reference: &ReferenceType,
        ty: &TypeRef,
        path: &FieldPath,
    ) -> Result<Value, ConfigError> {
        let key = node
            .as_scalar()
            .ok_or_else(|| ConfigError::conversion(path, node.type_name(), ty.to_string()))?
            .to_string();
        self.ctx
            .registries
            .references
            .resolve(&key, reference)
            .map(Value::Reference)
    }
}

fn expect_mapping<'n>(
    node: &'n Node,
    ty: &TypeRef,
    path: &FieldPath,
) -> Result<&'n Mapping, ConfigError> {
    node.as_mapping()
        .ok_or_else(|| ConfigError::conversion(path, node.type_name(), ty.to_string()))
}

fn expect_scalar<'n>(
    node: &'n Node,
    ty: &TypeRef,
    path: &FieldPath,
) -> Result<&'n Scalar, ConfigError> {
    node.as_scalar()
        .ok_or_else(|| ConfigError::conversion(path, node.type_name(), ty.to_string()))
}

fn discriminator_value(
    mapping: &Mapping,
    key: &str,
    path: &FieldPath,
) -> Result<String, ConfigError> {
    match mapping.get(key) {
        None | Some(Node::Null) => Err(ConfigError::missing(path)),
        Some(Node::Scalar(scalar)) => Ok(scalar.to_string()),
        Some(other) => Err(ConfigError::conversion(path, other.type_name(), "string")),
    }
}

fn coerce_string(node: &Node, ty: &TypeRef, path: &FieldPath) -> Result<Value, ConfigError> {
    expect_scalar(node, ty, path).map(|scalar| Value::String(scalar.to_string()))
}

fn coerce_integer(node: &Node, ty: &TypeRef, path: &FieldPath) -> Result<i64, ConfigError> {
    let fail = |shape: &str| ConfigError::conversion(path, shape, ty.to_string());
    match expect_scalar(node, ty, path)? {
        Scalar::Int(n) => Ok(*n),
        Scalar::Float(x) if x.fract() == 0.0 && *x >= i64::MIN as f64 && *x < i64::MAX as f64 => {
            Ok(*x as i64)
        }
        Scalar::Float(x) => Err(fail("float").with_detail(format!("{x} is not an exact integer"))),
        Scalar::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| fail("string").with_detail(format!("'{s}' is not an integer"))),
        Scalar::Bool(_) => Err(fail("bool")),
    }
}

fn coerce_double(node: &Node, ty: &TypeRef, path: &FieldPath) -> Result<f64, ConfigError> {
    let fail = |shape: &str| ConfigError::conversion(path, shape, ty.to_string());
    match expect_scalar(node, ty, path)? {
        Scalar::Int(n) => {
            let x = *n as f64;
            // i128 so that i64::MAX, which rounds up to 2^63, does not
            // saturate back to itself.
            if x as i128 == i128::from(*n) {
                Ok(x)
            } else {
                Err(fail("int").with_detail(format!("{n} has no exact double representation")))
            }
        }
        Scalar::Float(x) => Ok(*x),
        Scalar::String(s) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(fail("string").with_detail(format!("'{s}' is not a number"))),
        },
        Scalar::Bool(_) => Err(fail("bool")),
    }
}

fn coerce_bool(node: &Node, ty: &TypeRef, path: &FieldPath) -> Result<bool, ConfigError> {
    match expect_scalar(node, ty, path)? {
        Scalar::Bool(b) => Ok(*b),
        Scalar::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Scalar::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(ConfigError::conversion(path, other.type_name(), ty.to_string())
            .with_detail(format!("'{other}' is not a boolean"))),
    }
}

fn coerce_enum(
    node: &Node,
    spec: &EnumSpec,
    ty: &TypeRef,
    path: &FieldPath,
) -> Result<Value, ConfigError> {
    let literal = expect_scalar(node, ty, path)?.to_string();
    match spec.find(&literal) {
        Some(constant) => Ok(Value::Enum(EnumValue::new(spec.name(), constant))),
        None => {
            let expected: Vec<String> = spec
                .constants()
                .iter()
                .map(|c| naming::constant_to_kebab(c))
                .collect();
            Err(ConfigError::conversion(path, node.type_name(), ty.to_string())
                .with_detail(format!(
                    "'{literal}' is not one of: {}",
                    expected.join(", ")
                )))
        }
    }
}
