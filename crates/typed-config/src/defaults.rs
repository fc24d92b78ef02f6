use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::schema::{TypeKind, TypeRef};
use crate::value::{EnumValue, Value};

/// Declared default for a field, typed by the literal's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultSpec {
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    /// Key of an externally owned object; resolved through the reference
    /// registry into a lazy handle.
    Reference(String),
    /// Literal interpreted by a user-registered extractor for `kind`.
    Custom { kind: String, literal: String },
}

impl DefaultSpec {
    pub fn custom(kind: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::Custom {
            kind: kind.into(),
            literal: literal.into(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            DefaultSpec::String(_) => "string",
            DefaultSpec::Int(_) => "int",
            DefaultSpec::Long(_) => "long",
            DefaultSpec::Double(_) => "double",
            DefaultSpec::Bool(_) => "bool",
            DefaultSpec::Reference(_) => "reference",
            DefaultSpec::Custom { kind, .. } => kind,
        }
    }
}

pub type Extractor = Arc<dyn Fn(&TypeRef, &DefaultSpec) -> Option<Value> + Send + Sync>;

/// Table of default-value extractors indexed by target type kind and
/// default kind.
#[derive(Default)]
pub struct DefaultValueSource {
    extractors: RwLock<HashMap<(TypeKind, String), Extractor>>,
}

impl DefaultValueSource {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the built-in scalar extractors.
    pub fn with_builtins() -> Self {
        let source = Self::new();
        source.install_builtins();
        source
    }

    fn install_builtins(&self) {
        let builtins: [(TypeKind, &str, fn(&TypeRef, &DefaultSpec) -> Option<Value>); 9] = [
            (TypeKind::String, "string", |_, spec| match spec {
                DefaultSpec::String(s) => Some(Value::String(s.clone())),
                _ => None,
            }),
            (TypeKind::Int, "int", |_, spec| match spec {
                DefaultSpec::Int(n) => Some(Value::Int(*n)),
                _ => None,
            }),
            (TypeKind::Long, "long", |_, spec| match spec {
                DefaultSpec::Long(n) => Some(Value::Long(*n)),
                _ => None,
            }),
            (TypeKind::Long, "int", |_, spec| match spec {
                DefaultSpec::Int(n) => Some(Value::Long(i64::from(*n))),
                _ => None,
            }),
            (TypeKind::Double, "double", |_, spec| match spec {
                DefaultSpec::Double(x) => Some(Value::Double(*x)),
                _ => None,
            }),
            (TypeKind::Double, "int", |_, spec| match spec {
                DefaultSpec::Int(n) => Some(Value::Double(f64::from(*n))),
                _ => None,
            }),
            (TypeKind::Double, "long", |_, spec| match spec {
                DefaultSpec::Long(n) => Some(Value::Double(*n as f64)),
                _ => None,
            }),
            (TypeKind::Bool, "bool", |_, spec| match spec {
                DefaultSpec::Bool(b) => Some(Value::Bool(*b)),
                _ => None,
            }),
            (TypeKind::Enum, "string", |ty, spec| match (ty, spec) {
                (TypeRef::Enum(enum_spec), DefaultSpec::String(literal)) => enum_spec
                    .find(literal)
                    .map(|constant| Value::Enum(EnumValue::new(enum_spec.name(), constant))),
                _ => None,
            }),
        ];

        let mut extractors = self.extractors.write();
        for (type_kind, default_kind, extractor) in builtins {
            extractors.insert((type_kind, default_kind.to_string()), Arc::new(extractor));
        }
    }

    /// Register an extractor for defaults of `default_kind` on fields of
    /// `type_kind`. Each pair can be registered once.
    pub fn register<F>(
        &self,
        type_kind: TypeKind,
        default_kind: &str,
        extractor: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&TypeRef, &DefaultSpec) -> Option<Value> + Send + Sync + 'static,
    {
        match self
            .extractors
            .write()
            .entry((type_kind, default_kind.to_string()))
        {
            Entry::Occupied(_) => Err(ConfigError::schema(format!(
                "a default extractor for {type_kind:?}/{default_kind} is already registered"
            ))),
            Entry::Vacant(slot) => {
                log::debug!("registered default extractor for {type_kind:?}/{default_kind}");
                slot.insert(Arc::new(extractor));
                Ok(())
            }
        }
    }

    /// Default value for a field of type `ty` declared with `spec`, or
    /// `None` when no extractor produces one.
    pub fn lookup(&self, ty: &TypeRef, spec: &DefaultSpec) -> Option<Value> {
        let extractor = self
            .extractors
            .read()
            .get(&(ty.kind(), spec.kind().to_string()))
            .cloned()?;
        extractor(ty, spec)
    }

    pub fn clear(&self) {
        self.extractors.write().clear();
    }

    /// Drop custom extractors and reinstall the built-ins.
    pub fn reset(&self) {
        self.clear();
        self.install_builtins();
    }
}

impl fmt::Debug for DefaultValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultValueSource")
            .field("extractors", &self.extractors.read().len())
            .finish()
    }
}
