use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::convert::FromValue;
use crate::error::ConfigError;
use crate::node_path::FieldPath;
use crate::references::ReferenceHandle;
use crate::schema::Schema;

/// A decoded, immutable configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Optional field missing from the document with no default.
    Absent,
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(Object),
    Enum(EnumValue),
    Reference(ReferenceHandle),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Long(n) => Some(*n as f64),
            Value::Double(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Character count for strings, entry count for collections.
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List(items) | Value::Set(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Enum(_) => "enum",
            Value::Reference(_) => "reference",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => f.write_str("<absent>"),
            Value::String(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Double(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) | Value::Set(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Object(object) => write!(f, "{}", object.schema().name()),
            Value::Enum(value) => f.write_str(value.constant()),
            Value::Reference(handle) => write!(f, "ref({})", handle.key()),
        }
    }
}

/// Selected constant of an enumerated type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    enum_name: String,
    constant: String,
}

impl EnumValue {
    pub fn new(enum_name: impl Into<String>, constant: impl Into<String>) -> Self {
        Self {
            enum_name: enum_name.into(),
            constant: constant.into(),
        }
    }

    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    /// Declared name of the constant, e.g. `MYSQL_DATABASE`.
    pub fn constant(&self) -> &str {
        &self.constant
    }
}

/// A constructed instance of a [`Schema`].
#[derive(Debug, Clone)]
pub struct Object {
    schema: Arc<Schema>,
    variant: Option<String>,
    fields: IndexMap<String, Value>,
    path: FieldPath,
}

impl Object {
    pub(crate) fn new(schema: Arc<Schema>, fields: IndexMap<String, Value>, path: FieldPath) -> Self {
        Self {
            schema,
            variant: None,
            fields,
            path,
        }
    }

    pub(crate) fn with_variant(mut self, discriminator: impl Into<String>) -> Self {
        self.variant = Some(discriminator.into());
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Discriminator that selected this object's schema, for values of a
    /// polymorphic contract.
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Document path of the level holding this object's fields.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Field value by declared name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Convert a field into a Rust type.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T, ConfigError> {
        let path = self.field_path(name);
        match self.fields.get(name) {
            Some(value) => T::from_value(value, &path),
            None => T::from_value(&Value::Absent, &path),
        }
    }

    /// Path of a field, as the document spells it.
    pub fn field_path(&self, name: &str) -> FieldPath {
        match self.schema.field(name) {
            Some(field) if field.is_key() => self.path.clone(),
            Some(field) => self.path.field(field.external_name()),
            None => self.path.field(name),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema)
            && self.variant == other.variant
            && self.fields == other.fields
    }
}
