use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::schema::Schema;

pub const DEFAULT_DISCRIMINATOR: &str = "type";

/// Where the discriminator of a polymorphic field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Inside the field's own mapping, next to the variant's fields.
    #[default]
    Nested,
    /// In the enclosing mapping, beside the polymorphic field.
    Inline,
}

/// A polymorphic contract: a discriminator key and the schema selected by
/// each of its values.
#[derive(Debug)]
pub struct Contract {
    name: String,
    discriminator: String,
    placement: Placement,
    variants: IndexMap<String, Arc<Schema>>,
}

impl Contract {
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    pub fn variant(&self, discriminator: &str) -> Result<&Arc<Schema>, ConfigError> {
        self.variants
            .get(discriminator)
            .ok_or_else(|| ConfigError::UnresolvedPolymorphicType {
                contract: self.name.clone(),
                discriminator: discriminator.to_string(),
            })
    }
}

#[derive(Debug)]
pub struct ContractBuilder {
    name: String,
    discriminator: Option<String>,
    inline: bool,
    nested: bool,
    variants: Vec<(String, Arc<Schema>)>,
}

impl ContractBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discriminator: None,
            inline: false,
            nested: false,
            variants: Vec::new(),
        }
    }

    /// Discriminator key; defaults to `type`.
    pub fn discriminator(mut self, name: impl Into<String>) -> Self {
        self.discriminator = Some(name.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn variant(mut self, discriminator: impl Into<String>, schema: Arc<Schema>) -> Self {
        self.variants.push((discriminator.into(), schema));
        self
    }

    pub fn build(self) -> Result<Contract, ConfigError> {
        let name = self.name;
        let placement = match (self.inline, self.nested) {
            (true, true) => {
                return Err(ConfigError::schema(format!(
                    "contract {name} declares both inline and nested discriminator placement"
                )));
            }
            (true, false) => Placement::Inline,
            _ => Placement::Nested,
        };
        let discriminator = self
            .discriminator
            .unwrap_or_else(|| DEFAULT_DISCRIMINATOR.to_string());

        if self.variants.is_empty() {
            return Err(ConfigError::schema(format!(
                "contract {name} declares no variants"
            )));
        }

        let mut variants = IndexMap::with_capacity(self.variants.len());
        for (value, schema) in self.variants {
            if placement == Placement::Nested
                && schema
                    .fields()
                    .iter()
                    .any(|f| !f.is_key() && f.external_name() == discriminator)
            {
                return Err(ConfigError::schema(format!(
                    "variant {} of contract {name} declares a field named like discriminator '{discriminator}'",
                    schema.name()
                )));
            }
            if variants.insert(value.clone(), schema).is_some() {
                return Err(ConfigError::schema(format!(
                    "contract {name} declares discriminator value '{value}' twice"
                )));
            }
        }

        Ok(Contract {
            name,
            discriminator,
            placement,
            variants,
        })
    }
}

/// Registered polymorphic contracts, keyed by contract name.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: RwLock<HashMap<String, Arc<Contract>>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a contract. Each contract name can be registered
    /// once.
    pub fn register(&self, contract: ContractBuilder) -> Result<Arc<Contract>, ConfigError> {
        let contract = Arc::new(contract.build()?);
        match self.contracts.write().entry(contract.name.clone()) {
            Entry::Occupied(_) => Err(ConfigError::schema(format!(
                "contract {} is already registered",
                contract.name
            ))),
            Entry::Vacant(slot) => {
                log::debug!(
                    "registered contract {} with {} variants",
                    contract.name,
                    contract.variants.len()
                );
                slot.insert(contract.clone());
                Ok(contract)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Contract>> {
        self.contracts.read().get(name).cloned()
    }

    /// Schema selected by `discriminator` for the contract `name`.
    pub fn resolve(&self, name: &str, discriminator: &str) -> Result<Arc<Schema>, ConfigError> {
        let contract = self
            .get(name)
            .ok_or_else(|| ConfigError::UnresolvedPolymorphicType {
                contract: name.to_string(),
                discriminator: discriminator.to_string(),
            })?;
        contract.variant(discriminator).cloned()
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.contracts.write().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.contracts.write().clear();
    }
}
