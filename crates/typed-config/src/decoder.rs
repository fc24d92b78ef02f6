use std::sync::Arc;

use indexmap::IndexMap;
use typed_config_tree::{Mapping, Node};

use crate::builder::InstanceBuilder;
use crate::coerce::ValueCoercer;
use crate::config::DecodeOptions;
use crate::constants::ConstantTable;
use crate::context::{DecodeContext, Registries};
use crate::error::ConfigError;
use crate::naming;
use crate::node_path::FieldPath;
use crate::schema::{EnumSpec, Schema, TypeRef};
use crate::validation::{validate_object, validate_value};
use crate::value::{Object, Value};
use crate::Configurable;

/// Entry point for turning a parsed tree into typed objects.
///
/// A decoder borrows the [`Registries`] it resolves contracts, references
/// and defaults against; decoders are cheap and can be created per call.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'r> {
    registries: &'r Registries,
    options: DecodeOptions,
}

impl<'r> Decoder<'r> {
    pub fn new(registries: &'r Registries) -> Self {
        Self {
            registries,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn registries(&self) -> &'r Registries {
        self.registries
    }

    fn context(&self) -> DecodeContext<'_> {
        DecodeContext::new(self.registries, &self.options)
    }

    /// Build and validate an instance of `schema` from the document root.
    pub fn decode_object(&self, root: &Node, schema: &Arc<Schema>) -> Result<Object, ConfigError> {
        let path = FieldPath::root();
        let empty = Mapping::new();
        let mapping = root_mapping(root, &empty, &path, schema.name())?;
        log::debug!("decoding {}", schema.name());
        let object = InstanceBuilder::new(self.context()).build(mapping, schema, &path)?;
        if self.options.validate {
            validate_object(&object)?;
        }
        Ok(object)
    }

    /// Coerce the document root into any declared type. Every object in the
    /// result is validated, however deeply it sits in collections.
    pub fn decode_value(&self, root: &Node, ty: &TypeRef) -> Result<Value, ConfigError> {
        let value = ValueCoercer::new(self.context()).coerce(root, ty, &FieldPath::root(), None)?;
        if self.options.validate {
            validate_value(&value)?;
        }
        Ok(value)
    }

    pub fn decode<T: Configurable>(&self, root: &Node) -> Result<T, ConfigError> {
        let schema = T::schema()?;
        let object = self.decode_object(root, &schema)?;
        T::from_value(&Value::Object(object), &FieldPath::root())
    }

    /// Load configured values for the constants of an enumerated type.
    ///
    /// `root` maps constant names (in any spelling [`EnumSpec::find`]
    /// accepts) to mappings decoded with `schema`. Constants the document
    /// leaves out are built from an empty mapping, so `schema` defaults
    /// apply to them. The table is installed into the constant registry;
    /// loading the same enum twice fails until it is unloaded.
    pub fn load_constants(
        &self,
        root: &Node,
        spec: &Arc<EnumSpec>,
        schema: &Arc<Schema>,
    ) -> Result<Arc<ConstantTable>, ConfigError> {
        let root_path = FieldPath::root();
        let empty = Mapping::new();
        let mapping = root_mapping(root, &empty, &root_path, spec.name())?;

        let mut configured: IndexMap<&str, (&str, &Node)> = IndexMap::with_capacity(mapping.len());
        for (key, node) in mapping {
            let constant = spec.find(key).ok_or_else(|| {
                ConfigError::conversion(&root_path.field(key), "key", spec.name())
                    .with_detail(format!("'{key}' is not a constant of {}", spec.name()))
            })?;
            if let Some((previous, _)) = configured.insert(constant, (key.as_str(), node)) {
                return Err(ConfigError::conversion(&root_path.field(key), "key", spec.name())
                    .with_detail(format!("{constant} is already configured by '{previous}'")));
            }
        }

        let null = Node::Null;
        let builder = InstanceBuilder::new(self.context());
        let mut values = IndexMap::with_capacity(spec.constants().len());
        for constant in spec.constants() {
            let (path, node) = match configured.get(constant.as_str()) {
                Some((key, node)) => (root_path.field(*key), *node),
                None => (root_path.field(naming::constant_to_kebab(constant)), &null),
            };
            let inner = match node {
                Node::Mapping(inner) => inner,
                Node::Null => &empty,
                other => {
                    return Err(ConfigError::conversion(&path, other.type_name(), schema.name()));
                }
            };
            let object = builder.build(inner, schema, &path)?;
            if self.options.validate {
                validate_object(&object)?;
            }
            values.insert(constant.clone(), object);
        }

        self.registries
            .constants
            .install(ConstantTable::new(spec.clone(), values))
    }
}

fn root_mapping<'n>(
    root: &'n Node,
    empty: &'n Mapping,
    path: &FieldPath,
    target: &str,
) -> Result<&'n Mapping, ConfigError> {
    match root {
        Node::Mapping(mapping) => Ok(mapping),
        Node::Null => Ok(empty),
        other => Err(ConfigError::conversion(path, other.type_name(), target)),
    }
}
