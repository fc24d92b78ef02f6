use crate::error::ConfigError;
use crate::node_path::FieldPath;
use crate::schema::{Constraint, ConstraintKind};
use crate::value::{Object, Value};

/// Check every constraint declared on `object`'s fields, then descend into
/// nested objects and collection elements. Stops at the first violation.
pub fn validate_object(object: &Object) -> Result<(), ConfigError> {
    for field in object.schema().fields() {
        let Some(value) = object.get(field.name()) else {
            continue;
        };
        if !value.is_absent() {
            let path = object.field_path(field.name());
            run_constraints(value, field.constraints(), &path)?;
        }
        validate_value(value)?;
    }
    Ok(())
}

pub fn run_constraints(
    value: &Value,
    constraints: &[Constraint],
    path: &FieldPath,
) -> Result<(), ConfigError> {
    constraints
        .iter()
        .try_for_each(|constraint| check(constraint, value, path))
}

/// Validate every object reachable from `value`, including objects held in
/// lists, sets and map values.
pub fn validate_value(value: &Value) -> Result<(), ConfigError> {
    match value {
        Value::Object(object) => validate_object(object),
        Value::List(items) | Value::Set(items) => items.iter().try_for_each(validate_value),
        Value::Map(entries) => entries.values().try_for_each(validate_value),
        _ => Ok(()),
    }
}

fn check(constraint: &Constraint, value: &Value, path: &FieldPath) -> Result<(), ConfigError> {
    let kind = constraint.kind();
    let violated = match kind {
        ConstraintKind::Min(min) => numeric(kind, value, path)? < *min,
        ConstraintKind::Max(max) => numeric(kind, value, path)? > *max,
        ConstraintKind::Pattern(regex) => {
            let text = value.as_str().ok_or_else(|| incompatible(kind, value, path))?;
            !regex.is_match(text)
        }
        ConstraintKind::NotEmpty => sized(kind, value, path)? == 0,
        ConstraintKind::Size { min, max } => {
            let size = sized(kind, value, path)?;
            size < *min || size > *max
        }
    };

    if !violated {
        return Ok(());
    }
    let message = render(constraint, value, path);
    log::debug!("constraint {} failed at {path}: {message}", kind.name());
    Err(ConfigError::ConstraintViolation {
        path: path.clone(),
        kind: kind.name(),
        message,
    })
}

fn numeric(kind: &ConstraintKind, value: &Value, path: &FieldPath) -> Result<f64, ConfigError> {
    value.as_f64().ok_or_else(|| incompatible(kind, value, path))
}

fn sized(kind: &ConstraintKind, value: &Value, path: &FieldPath) -> Result<usize, ConfigError> {
    value.size().ok_or_else(|| incompatible(kind, value, path))
}

fn incompatible(kind: &ConstraintKind, value: &Value, path: &FieldPath) -> ConfigError {
    ConfigError::schema(format!(
        "'{}' constraint at '{path}' cannot apply to a {} value",
        kind.name(),
        value.type_name()
    ))
}

fn render(constraint: &Constraint, value: &Value, path: &FieldPath) -> String {
    let kind = constraint.kind();
    fill_template(constraint.template(), |placeholder| match (placeholder, kind) {
        ("path", _) => Some(path.to_string()),
        ("value", ConstraintKind::Size { .. } | ConstraintKind::NotEmpty) => {
            value.size().map(|n| n.to_string())
        }
        ("value", _) => Some(value.to_string()),
        ("min", ConstraintKind::Min(min)) => Some(format_number(*min)),
        ("max", ConstraintKind::Max(max)) => Some(format_number(*max)),
        ("min", ConstraintKind::Size { min, .. }) => Some(min.to_string()),
        ("max", ConstraintKind::Size { max, .. }) if *max == usize::MAX => {
            Some("unbounded".to_string())
        }
        ("max", ConstraintKind::Size { max, .. }) => Some(max.to_string()),
        ("pattern", ConstraintKind::Pattern(regex)) => Some(display_pattern(regex.as_str())),
        _ => None,
    })
}

/// Substitute `{name}` placeholders in one pass. Unknown placeholders are
/// left as written.
fn fill_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => match lookup(&after[..end]) {
                Some(text) => {
                    out.push_str(&text);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn display_pattern(anchored: &str) -> String {
    anchored
        .strip_prefix("^(?:")
        .and_then(|p| p.strip_suffix(")$"))
        .unwrap_or(anchored)
        .to_string()
}
