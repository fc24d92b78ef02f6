use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::convert::FromValue;
use crate::error::ConfigError;
use crate::schema::EnumSpec;
use crate::value::{EnumValue, Object, Value};

/// Configured values attached to the constants of an enumerated type.
///
/// Built once from configuration and then only read; the constants
/// themselves are never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantTable {
    spec: Arc<EnumSpec>,
    values: IndexMap<String, Object>,
}

impl ConstantTable {
    pub(crate) fn new(spec: Arc<EnumSpec>, values: IndexMap<String, Object>) -> Self {
        Self { spec, values }
    }

    pub fn spec(&self) -> &Arc<EnumSpec> {
        &self.spec
    }

    /// Configured object for a declared constant name.
    pub fn get(&self, constant: &str) -> Option<&Object> {
        self.values.get(constant)
    }

    pub fn get_enum(&self, value: &EnumValue) -> Option<&Object> {
        if value.enum_name() != self.spec.name() {
            return None;
        }
        self.get(value.constant())
    }

    /// Convert the configured object of `constant` into a Rust type.
    pub fn get_as<T: FromValue>(&self, constant: &str) -> Result<T, ConfigError> {
        let object = self.get(constant).ok_or_else(|| {
            ConfigError::schema(format!(
                "{} has no constant named {constant}",
                self.spec.name()
            ))
        })?;
        T::from_value(&Value::Object(object.clone()), object.path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Object)> {
        self.values.iter().map(|(name, object)| (name.as_str(), object))
    }
}

/// Loaded constant tables, one per enumerated type.
#[derive(Debug, Default)]
pub struct ConstantRegistry {
    tables: RwLock<HashMap<String, Arc<ConstantTable>>>,
}

impl ConstantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a table. A second table for the same enum is rejected;
    /// [`unload`](Self::unload) it first to reload.
    pub fn install(&self, table: ConstantTable) -> Result<Arc<ConstantTable>, ConfigError> {
        let name = table.spec.name().to_string();
        match self.tables.write().entry(name) {
            Entry::Occupied(slot) => Err(ConfigError::schema(format!(
                "constants of {} are already loaded",
                slot.key()
            ))),
            Entry::Vacant(slot) => {
                log::debug!("loaded {} configured constants of {}", table.values.len(), slot.key());
                let table = Arc::new(table);
                slot.insert(table.clone());
                Ok(table)
            }
        }
    }

    pub fn get(&self, enum_name: &str) -> Option<Arc<ConstantTable>> {
        self.tables.read().get(enum_name).cloned()
    }

    pub fn unload(&self, enum_name: &str) -> bool {
        self.tables.write().remove(enum_name).is_some()
    }

    pub fn clear(&self) {
        self.tables.write().clear();
    }
}
