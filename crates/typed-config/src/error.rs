use thiserror::Error;
use typed_config_tree::TreeError;

use crate::node_path::FieldPath;

/// Find the closest match from `candidates` using Levenshtein distance.
/// Returns `None` if no candidate is close enough (max distance 2, and
/// distance must be strictly less than `input.len()` to avoid nonsense
/// suggestions for very short inputs).
pub fn suggest_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(input, candidate);
        if d == 0 || d > 2 || d >= input.len() {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];
    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing required field '{path}'")]
    MissingRequiredField { path: FieldPath },

    #[error("cannot convert {source_shape} to {target_type} at '{path}'{}", detail_suffix(.detail))]
    TypeConversionFailure {
        path: FieldPath,
        source_shape: String,
        target_type: String,
        detail: Option<String>,
    },

    #[error("invalid key mapping at '{path}': {reason}")]
    InvalidKeyMapping { path: FieldPath, reason: String },

    #[error("no variant of '{contract}' for discriminator '{discriminator}'")]
    UnresolvedPolymorphicType {
        contract: String,
        discriminator: String,
    },

    #[error("schema definition error: {detail}")]
    SchemaDefinition { detail: String },

    #[error("no reference provider installed for {type_name}")]
    UnregisteredReferenceProvider { type_name: String },

    #[error("no {type_name} with key '{key}'")]
    UnresolvedReferenceKey { type_name: String, key: String },

    #[error("constraint '{kind}' violated at '{path}': {message}")]
    ConstraintViolation {
        path: FieldPath,
        kind: &'static str,
        message: String,
    },

    #[error("unknown field '{key}' at '{path}'{}", suggestion_suffix(.suggestion))]
    UnknownField {
        path: FieldPath,
        key: String,
        suggestion: Option<String>,
    },

    #[error(transparent)]
    Parse(#[from] TreeError),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(", did you mean '{s}'?"),
        None => String::new(),
    }
}

impl ConfigError {
    pub fn missing(path: &FieldPath) -> Self {
        Self::MissingRequiredField { path: path.clone() }
    }

    pub fn conversion(
        path: &FieldPath,
        source_shape: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self::TypeConversionFailure {
            path: path.clone(),
            source_shape: source_shape.into(),
            target_type: target_type.into(),
            detail: None,
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        match self {
            Self::TypeConversionFailure {
                path,
                source_shape,
                target_type,
                ..
            } => Self::TypeConversionFailure {
                path,
                source_shape,
                target_type,
                detail: Some(detail.into()),
            },
            other => other,
        }
    }

    pub fn schema(detail: impl Into<String>) -> Self {
        Self::SchemaDefinition {
            detail: detail.into(),
        }
    }

    pub fn unknown_field(path: &FieldPath, key: impl Into<String>, valid: &[&str]) -> Self {
        let key = key.into();
        let suggestion = suggest_similar(&key, valid).map(String::from);
        Self::UnknownField {
            path: path.clone(),
            key,
            suggestion,
        }
    }

    /// Document path the error refers to, when it has one.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::MissingRequiredField { path }
            | Self::TypeConversionFailure { path, .. }
            | Self::InvalidKeyMapping { path, .. }
            | Self::ConstraintViolation { path, .. }
            | Self::UnknownField { path, .. } => Some(path),
            _ => None,
        }
    }
}
