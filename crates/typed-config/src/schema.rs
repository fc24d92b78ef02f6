use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use regex::Regex;

use crate::defaults::DefaultSpec;
use crate::error::ConfigError;
use crate::naming;
use crate::value::Value;

/// Target type of a field, including generic arguments for collections.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    String,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    Double,
    Bool,
    List(Box<TypeRef>),
    /// Ordered, deduplicated after coercion.
    Set(Box<TypeRef>),
    /// String-keyed, insertion ordered.
    Map(Box<TypeRef>),
    Object(Arc<Schema>),
    Enum(Arc<EnumSpec>),
    /// Polymorphic contract, resolved by name through the contract registry.
    Contract(String),
    Reference(ReferenceType),
}

/// Coarse classification of a [`TypeRef`], used to index default extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    String,
    Int,
    Long,
    Double,
    Bool,
    List,
    Set,
    Map,
    Object,
    Enum,
    Contract,
    Reference,
}

impl TypeRef {
    pub fn list(element: TypeRef) -> Self {
        Self::List(Box::new(element))
    }

    pub fn set(element: TypeRef) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn map(value: TypeRef) -> Self {
        Self::Map(Box::new(value))
    }

    pub fn contract(name: impl Into<String>) -> Self {
        Self::Contract(name.into())
    }

    pub fn reference<T: Any>() -> Self {
        Self::Reference(ReferenceType::of::<T>())
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeRef::String => TypeKind::String,
            TypeRef::Int => TypeKind::Int,
            TypeRef::Long => TypeKind::Long,
            TypeRef::Double => TypeKind::Double,
            TypeRef::Bool => TypeKind::Bool,
            TypeRef::List(_) => TypeKind::List,
            TypeRef::Set(_) => TypeKind::Set,
            TypeRef::Map(_) => TypeKind::Map,
            TypeRef::Object(_) => TypeKind::Object,
            TypeRef::Enum(_) => TypeKind::Enum,
            TypeRef::Contract(_) => TypeKind::Contract,
            TypeRef::Reference(_) => TypeKind::Reference,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeRef::Int | TypeRef::Long | TypeRef::Double)
    }

    /// Whether a size can be measured (string length or entry count).
    pub fn is_sized(&self) -> bool {
        matches!(
            self,
            TypeRef::String | TypeRef::List(_) | TypeRef::Set(_) | TypeRef::Map(_)
        )
    }

    /// Value used for an optional field that is absent from the document.
    pub fn absent(&self) -> Value {
        match self {
            TypeRef::List(_) => Value::List(Vec::new()),
            TypeRef::Set(_) => Value::Set(Vec::new()),
            TypeRef::Map(_) => Value::Map(IndexMap::new()),
            _ => Value::Absent,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::String => f.write_str("string"),
            TypeRef::Int => f.write_str("int"),
            TypeRef::Long => f.write_str("long"),
            TypeRef::Double => f.write_str("double"),
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::List(inner) => write!(f, "list<{inner}>"),
            TypeRef::Set(inner) => write!(f, "set<{inner}>"),
            TypeRef::Map(inner) => write!(f, "map<string, {inner}>"),
            TypeRef::Object(schema) => f.write_str(schema.name()),
            TypeRef::Enum(spec) => f.write_str(spec.name()),
            TypeRef::Contract(name) => f.write_str(name),
            TypeRef::Reference(ty) => write!(f, "ref<{}>", ty.name()),
        }
    }
}

/// Identity of a Rust type that configuration can refer to by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceType {
    id: TypeId,
    name: &'static str,
}

impl ReferenceType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Declared constants of an enumerated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    name: String,
    constants: Vec<String>,
}

impl EnumSpec {
    pub fn new<I, S>(name: impl Into<String>, constants: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            name: name.into(),
            constants: constants.into_iter().map(Into::into).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    /// Find the declared constant a document literal refers to. Both sides
    /// are normalized with the constant naming convention, so `MYSQL_DB`,
    /// `mysql_db` and `mysql-db` all match.
    pub fn find(&self, literal: &str) -> Option<&str> {
        let wanted = naming::constant_to_kebab(literal);
        self.constants
            .iter()
            .find(|constant| naming::constant_to_kebab(constant) == wanted)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub enum ConstraintKind {
    Min(f64),
    Max(f64),
    /// Anchored: the whole string must match.
    Pattern(Regex),
    NotEmpty,
    Size { min: usize, max: usize },
}

impl ConstraintKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::Min(_) => "min",
            ConstraintKind::Max(_) => "max",
            ConstraintKind::Pattern(_) => "pattern",
            ConstraintKind::NotEmpty => "not-empty",
            ConstraintKind::Size { .. } => "size",
        }
    }

    fn default_template(&self) -> &'static str {
        match self {
            ConstraintKind::Min(_) => "{path} must be at least {min}, but was {value}",
            ConstraintKind::Max(_) => "{path} must be at most {max}, but was {value}",
            ConstraintKind::Pattern(_) => "{path} must match {pattern}, but was '{value}'",
            ConstraintKind::NotEmpty => "{path} must not be empty",
            ConstraintKind::Size { .. } => {
                "{path} size must be between {min} and {max}, but was {value}"
            }
        }
    }

    fn accepts(&self, ty: &TypeRef) -> bool {
        match self {
            ConstraintKind::Min(_) | ConstraintKind::Max(_) => ty.is_numeric(),
            ConstraintKind::Pattern(_) => matches!(ty, TypeRef::String),
            ConstraintKind::NotEmpty | ConstraintKind::Size { .. } => ty.is_sized(),
        }
    }
}

/// A declared restriction on a field value, checked after construction.
#[derive(Debug, Clone)]
pub struct Constraint {
    kind: ConstraintKind,
    message: Option<String>,
}

impl Constraint {
    pub fn min(min: f64) -> Self {
        Self::new(ConstraintKind::Min(min))
    }

    pub fn max(max: f64) -> Self {
        Self::new(ConstraintKind::Max(max))
    }

    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| ConfigError::schema(format!("invalid pattern '{pattern}': {e}")))?;
        Ok(Self::new(ConstraintKind::Pattern(regex)))
    }

    pub fn not_empty() -> Self {
        Self::new(ConstraintKind::NotEmpty)
    }

    pub fn size(min: usize, max: usize) -> Self {
        Self::new(ConstraintKind::Size { min, max })
    }

    pub fn min_size(min: usize) -> Self {
        Self::size(min, usize::MAX)
    }

    /// Replace the violation message. `{value}`, `{min}`, `{max}`,
    /// `{pattern}` and `{path}` are substituted.
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn template(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_template())
    }
}

/// One field of a [`Schema`].
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    external_name: String,
    ty: TypeRef,
    key: bool,
    optional: bool,
    default: Option<DefaultSpec>,
    constraints: Vec<Constraint>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            external_name: naming::external_name(&name, None),
            name,
            ty,
            key: false,
            optional: false,
            default: None,
            constraints: Vec::new(),
        }
    }

    /// Use `external` as the document key instead of the converted name.
    pub fn rename(mut self, external: impl Into<String>) -> Self {
        let external = external.into();
        self.external_name = naming::external_name(&self.name, Some(&external));
        self
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default_value(mut self, spec: DefaultSpec) -> Self {
        self.default = Some(spec);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_name(&self) -> &str {
        &self.external_name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_spec(&self) -> Option<&DefaultSpec> {
        self.default.as_ref()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Declared shape of a configuration object: its fields in declaration
/// order.
#[derive(Debug)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDescriptor>,
    deny_unknown: Option<bool>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            deny_unknown: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn key_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key)
    }

    pub fn deny_unknown(&self) -> Option<bool> {
        self.deny_unknown
    }
}

// Structural equality over names and types; constraints and defaults are
// not compared.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.name == other.name
                && self.fields.len() == other.fields.len()
                && self.fields.iter().zip(&other.fields).all(|(a, b)| {
                    a.name == b.name
                        && a.external_name == b.external_name
                        && a.key == b.key
                        && a.optional == b.optional
                        && a.ty == b.ty
                }))
    }
}

#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    deny_unknown: Option<bool>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn deny_unknown(mut self, deny: bool) -> Self {
        self.deny_unknown = Some(deny);
        self
    }

    pub fn build(self) -> Result<Arc<Schema>, ConfigError> {
        let name = &self.name;

        let keys: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.key)
            .map(|f| f.name.as_str())
            .collect();
        if keys.len() > 1 {
            return Err(ConfigError::schema(format!(
                "{name} declares more than one key field: {}",
                keys.join(", ")
            )));
        }

        let mut declared = HashSet::new();
        let mut external = HashSet::new();
        for field in &self.fields {
            if !declared.insert(field.name.as_str()) {
                return Err(ConfigError::schema(format!(
                    "{name} declares field '{}' twice",
                    field.name
                )));
            }
            if !field.key && !external.insert(field.external_name.as_str()) {
                return Err(ConfigError::schema(format!(
                    "{name} maps more than one field to key '{}'",
                    field.external_name
                )));
            }
            if field.key
                && matches!(
                    field.ty,
                    TypeRef::List(_)
                        | TypeRef::Set(_)
                        | TypeRef::Map(_)
                        | TypeRef::Contract(_)
                        | TypeRef::Reference(_)
                )
            {
                return Err(ConfigError::schema(format!(
                    "key field {name}.{} cannot have type {}",
                    field.name, field.ty
                )));
            }
            for constraint in &field.constraints {
                if !constraint.kind.accepts(&field.ty) {
                    return Err(ConfigError::schema(format!(
                        "constraint '{}' cannot apply to {name}.{} of type {}",
                        constraint.kind.name(),
                        field.name,
                        field.ty
                    )));
                }
            }
        }

        // A complex key reads its own fields from our mapping.
        let key_ty = self.fields.iter().find(|f| f.key).map(|f| &f.ty);
        if let Some(TypeRef::Object(key_schema)) = key_ty {
            if let Some(shared) = flattened_names(key_schema)
                .into_iter()
                .find(|flat| external.contains(flat))
            {
                return Err(ConfigError::schema(format!(
                    "{name} and its key {} both map a field to key '{shared}'",
                    key_schema.name
                )));
            }
        }

        Ok(Arc::new(Schema {
            name: self.name,
            fields: self.fields,
            deny_unknown: self.deny_unknown,
        }))
    }
}

/// External names a complex key of type `schema` consumes from the mapping
/// of the schema that declares it.
fn flattened_names(schema: &Schema) -> Vec<&str> {
    let mut names: Vec<&str> = schema
        .fields
        .iter()
        .filter(|f| !f.key)
        .map(|f| f.external_name.as_str())
        .collect();
    if let Some(TypeRef::Object(inner)) = schema.key_field().map(|f| &f.ty) {
        names.extend(flattened_names(inner));
    }
    names
}

/// Process-wide cache for a type's schema; the first successful build
/// wins and is returned from then on.
#[derive(Debug)]
pub struct SchemaCell {
    cell: OnceLock<Arc<Schema>>,
}

impl SchemaCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get_or_build(
        &self,
        build: impl FnOnce() -> Result<Arc<Schema>, ConfigError>,
    ) -> Result<Arc<Schema>, ConfigError> {
        if let Some(schema) = self.cell.get() {
            return Ok(schema.clone());
        }
        let built = build()?;
        Ok(self.cell.get_or_init(|| built).clone())
    }
}

impl Default for SchemaCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Constraint, EnumSpec, FieldDescriptor, Schema, SchemaCell, TypeRef};
    use crate::ConfigError;
    use std::sync::Arc;

    #[test]
    fn two_key_fields_are_rejected() {
        let err = Schema::builder("Bad")
            .field(FieldDescriptor::new("a", TypeRef::String).key())
            .field(FieldDescriptor::new("b", TypeRef::String).key())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaDefinition { .. }), "got: {err:?}");
    }

    #[test]
    fn colliding_external_names_are_rejected() {
        let err = Schema::builder("Bad")
            .field(FieldDescriptor::new("appName", TypeRef::String))
            .field(FieldDescriptor::new("other", TypeRef::String).rename("app-name"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("app-name"), "got: {err}");
    }

    #[test]
    fn complex_key_fields_cannot_shadow_siblings() {
        let endpoint = Schema::builder("Endpoint")
            .field(FieldDescriptor::new("host", TypeRef::String))
            .field(FieldDescriptor::new("port", TypeRef::Int))
            .build()
            .unwrap();
        let err = Schema::builder("Service")
            .field(FieldDescriptor::new("endpoint", TypeRef::Object(endpoint.clone())).key())
            .field(FieldDescriptor::new("upstream", TypeRef::String).rename("host"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaDefinition { .. }), "got: {err:?}");
        assert!(err.to_string().contains("'host'"), "got: {err}");

        // Names flattened through a nested complex key collide too.
        let site = Schema::builder("Site")
            .field(FieldDescriptor::new("endpoint", TypeRef::Object(endpoint.clone())).key())
            .field(FieldDescriptor::new("region", TypeRef::String))
            .build()
            .unwrap();
        let err = Schema::builder("Deployment")
            .field(FieldDescriptor::new("site", TypeRef::Object(site.clone())).key())
            .field(FieldDescriptor::new("port", TypeRef::Int))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'port'"), "got: {err}");

        assert!(
            Schema::builder("Deployment")
                .field(FieldDescriptor::new("site", TypeRef::Object(site)).key())
                .field(FieldDescriptor::new("replicas", TypeRef::Int))
                .build()
                .is_ok()
        );
    }

    #[test]
    fn numeric_constraint_on_string_is_rejected() {
        let err = Schema::builder("Bad")
            .field(FieldDescriptor::new("host", TypeRef::String).constraint(Constraint::min(1.0)))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'min'"), "got: {err}");
    }

    #[test]
    fn invalid_pattern_is_a_schema_error() {
        let err = Constraint::pattern("([a-z]").unwrap_err();
        assert!(matches!(err, ConfigError::SchemaDefinition { .. }));
    }

    #[test]
    fn enum_literals_are_normalized() {
        let level = EnumSpec::new("Level", ["DEBUG", "MYSQL_DATABASE"]);
        assert_eq!(level.find("mysql-database"), Some("MYSQL_DATABASE"));
        assert_eq!(level.find("Debug"), Some("DEBUG"));
        assert_eq!(level.find("trace"), None);
    }

    #[test]
    fn schema_cell_builds_once() {
        static CELL: SchemaCell = SchemaCell::new();
        let first = CELL
            .get_or_build(|| Schema::builder("Cached").build())
            .unwrap();
        let second = CELL
            .get_or_build(|| Err(ConfigError::schema("must not rebuild")))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
