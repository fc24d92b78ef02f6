use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use typed_config_tree::{Mapping, Node};

use crate::coerce::ValueCoercer;
use crate::config::resolve_schema;
use crate::context::DecodeContext;
use crate::contracts::Placement;
use crate::defaults::DefaultSpec;
use crate::error::ConfigError;
use crate::node_path::FieldPath;
use crate::schema::{FieldDescriptor, Schema, TypeRef};
use crate::value::{Object, Value};

/// Mapping keys claimed by fields while building one level.
#[derive(Debug, Default)]
pub struct UsedKeys {
    keys: HashSet<String>,
}

impl UsedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn check_unknowns(&self, mapping: &Mapping, path: &FieldPath) -> Result<(), ConfigError> {
        for key in mapping.keys() {
            if !self.contains(key) {
                let mut valid: Vec<&str> = self.keys.iter().map(String::as_str).collect();
                valid.sort_unstable();
                return Err(ConfigError::unknown_field(path, key, &valid));
            }
        }
        Ok(())
    }
}

/// Builds [`Object`]s from mappings according to a [`Schema`].
#[derive(Debug, Clone, Copy)]
pub struct InstanceBuilder<'a> {
    ctx: DecodeContext<'a>,
}

impl<'a> InstanceBuilder<'a> {
    pub fn new(ctx: DecodeContext<'a>) -> Self {
        Self { ctx }
    }

    /// Build an instance of `schema` from `mapping`, found at `path`.
    pub fn build(
        &self,
        mapping: &Mapping,
        schema: &Arc<Schema>,
        path: &FieldPath,
    ) -> Result<Object, ConfigError> {
        log::trace!("building {} at {path}", schema.name());
        let mut used = UsedKeys::new();
        let object = self.build_level(mapping, schema, path, &mut used)?;
        if resolve_schema(self.ctx.options, schema).deny_unknown {
            used.check_unknowns(mapping, path)?;
        }
        Ok(object)
    }

    fn build_level(
        &self,
        mapping: &Mapping,
        schema: &Arc<Schema>,
        path: &FieldPath,
        used: &mut UsedKeys,
    ) -> Result<Object, ConfigError> {
        let mut values = IndexMap::with_capacity(schema.fields().len());
        let mut level_path = path.clone();

        match schema.key_field() {
            None => self.resolve_fields(mapping, schema, path, used, &mut values)?,
            Some(key) => match key.ty() {
                TypeRef::Object(key_schema) => {
                    // Complex key: its fields sit at the same level as ours.
                    log::debug!(
                        "flattening key {} of {} at {path}",
                        key_schema.name(),
                        schema.name()
                    );
                    let flattened = self.build_level(mapping, key_schema, path, used)?;
                    values.insert(key.name().to_string(), Value::Object(flattened));
                    self.resolve_fields(mapping, schema, path, used, &mut values)?;
                }
                key_ty => {
                    let (entry, inner) = single_entry(mapping, schema, path)?;
                    used.mark(entry);
                    level_path = path.field(entry);

                    let key_value =
                        ValueCoercer::new(self.ctx).coerce_key(entry, key_ty, &level_path)?;
                    values.insert(key.name().to_string(), key_value);

                    let empty = Mapping::new();
                    let inner = match inner {
                        Node::Mapping(inner) => inner,
                        Node::Null => &empty,
                        other => {
                            return Err(ConfigError::conversion(
                                &level_path,
                                other.type_name(),
                                schema.name(),
                            ));
                        }
                    };
                    let mut inner_used = UsedKeys::new();
                    self.resolve_fields(inner, schema, &level_path, &mut inner_used, &mut values)?;
                    if resolve_schema(self.ctx.options, schema).deny_unknown {
                        inner_used.check_unknowns(inner, &level_path)?;
                    }
                }
            },
        }

        let mut ordered = IndexMap::with_capacity(values.len());
        for field in schema.fields() {
            if let Some(value) = values.swap_remove(field.name()) {
                ordered.insert(field.name().to_string(), value);
            }
        }
        Ok(Object::new(schema.clone(), ordered, level_path))
    }

    fn resolve_fields(
        &self,
        mapping: &Mapping,
        schema: &Schema,
        path: &FieldPath,
        used: &mut UsedKeys,
        values: &mut IndexMap<String, Value>,
    ) -> Result<(), ConfigError> {
        let coercer = ValueCoercer::new(self.ctx);
        for field in schema.fields().iter().filter(|f| !f.is_key()) {
            let name = field.external_name();
            used.mark(name);
            if let TypeRef::Contract(contract) = field.ty() {
                if let Some(contract) = self.ctx.registries.contracts.get(contract) {
                    if contract.placement() == Placement::Inline {
                        used.mark(contract.discriminator());
                    }
                }
            }

            let field_path = path.field(name);
            let value = match mapping.get(name) {
                Some(node) if !node.is_null() => {
                    coercer.coerce(node, field.ty(), &field_path, Some(mapping))?
                }
                _ => self.absent_field(field, &field_path)?,
            };
            values.insert(field.name().to_string(), value);
        }
        Ok(())
    }

    fn absent_field(
        &self,
        field: &FieldDescriptor,
        path: &FieldPath,
    ) -> Result<Value, ConfigError> {
        if let Some(spec) = field.default_spec() {
            if let Some(value) = self.default_value(field.ty(), spec)? {
                log::trace!("defaulted {path}");
                return Ok(value);
            }
            log::warn!(
                "no default extractor turns a {} default into {} for '{path}'",
                spec.kind(),
                field.ty()
            );
        }
        if field.is_optional() {
            return Ok(field.ty().absent());
        }
        Err(ConfigError::missing(path))
    }

    fn default_value(&self, ty: &TypeRef, spec: &DefaultSpec) -> Result<Option<Value>, ConfigError> {
        match (ty, spec) {
            (TypeRef::Reference(reference), DefaultSpec::Reference(key)) => self
                .ctx
                .registries
                .references
                .resolve(key, reference)
                .map(|handle| Some(Value::Reference(handle))),
            _ => Ok(self.ctx.registries.defaults.lookup(ty, spec)),
        }
    }
}

fn single_entry<'m>(
    mapping: &'m Mapping,
    schema: &Schema,
    path: &FieldPath,
) -> Result<(&'m str, &'m Node), ConfigError> {
    match mapping.first() {
        Some((key, node)) if mapping.len() == 1 => Ok((key.as_str(), node)),
        _ => Err(ConfigError::InvalidKeyMapping {
            path: path.clone(),
            reason: format!(
                "{} expects exactly one top-level key, found {}",
                schema.name(),
                mapping.len()
            ),
        }),
    }
}
