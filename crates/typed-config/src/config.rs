use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Run constraint validation after a successful build.
    pub validate: bool,
    /// Reject mapping keys no field claims.
    pub deny_unknown: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            validate: true,
            deny_unknown: false,
        }
    }
}

impl DecodeOptions {
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn deny_unknown(mut self, deny: bool) -> Self {
        self.deny_unknown = deny;
        self
    }
}

/// Options in effect for one schema; the schema's own settings win.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveOptions {
    pub deny_unknown: bool,
}

pub fn resolve_schema(options: &DecodeOptions, schema: &Schema) -> EffectiveOptions {
    EffectiveOptions {
        deny_unknown: schema.deny_unknown().unwrap_or(options.deny_unknown),
    }
}
