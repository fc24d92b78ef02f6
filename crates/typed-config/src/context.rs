use crate::config::DecodeOptions;
use crate::constants::ConstantRegistry;
use crate::contracts::ContractRegistry;
use crate::defaults::DefaultValueSource;
use crate::references::ReferenceRegistry;

/// The registries a decode consults. Create one at startup, register
/// contracts, reference providers and default extractors on it, and pass it
/// to every [`Decoder`](crate::Decoder).
#[derive(Debug)]
pub struct Registries {
    pub defaults: DefaultValueSource,
    pub contracts: ContractRegistry,
    pub references: ReferenceRegistry,
    pub constants: ConstantRegistry,
}

impl Registries {
    /// Registries with the built-in default extractors installed.
    pub fn new() -> Self {
        Self {
            defaults: DefaultValueSource::with_builtins(),
            contracts: ContractRegistry::new(),
            references: ReferenceRegistry::new(),
            constants: ConstantRegistry::new(),
        }
    }

    /// Forget every registration; built-in defaults are reinstalled.
    pub fn clear(&self) {
        self.defaults.reset();
        self.contracts.clear();
        self.references.clear();
        self.constants.clear();
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub registries: &'a Registries,
    pub options: &'a DecodeOptions,
}

impl<'a> DecodeContext<'a> {
    pub fn new(registries: &'a Registries, options: &'a DecodeOptions) -> Self {
        Self {
            registries,
            options,
        }
    }
}
