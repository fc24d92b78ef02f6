use std::any::Any;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::node_path::FieldPath;
use crate::references::{Reference, ReferenceHandle};
use crate::value::{EnumValue, Object, Value};

/// Conversion from a decoded [`Value`] into a Rust type.
///
/// Implement this for configuration structs by reading fields off the
/// decoded [`Object`] with [`Object::get_as`].
pub trait FromValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError>;
}

/// Error for a value whose shape does not match the requested Rust type.
pub fn mismatch<T: FromValue>(value: &Value, path: &FieldPath) -> ConfigError {
    match value {
        Value::Absent => ConfigError::missing(path),
        other => ConfigError::conversion(path, other.type_name(), T::TYPE_NAME),
    }
}

fn out_of_range<T: FromValue>(value: &Value, path: &FieldPath) -> ConfigError {
    mismatch::<T>(value, path).with_detail(format!("{value} is out of range"))
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch::<Self>(other, path)),
        }
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch::<Self>(other, path)),
        }
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        value.as_f64().ok_or_else(|| mismatch::<Self>(value, path))
    }
}

macro_rules! impl_from_value_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
                    let n = match value {
                        Value::Int(n) => i64::from(*n),
                        Value::Long(n) => *n,
                        other => return Err(mismatch::<Self>(other, path)),
                    };
                    <$ty>::try_from(n).map_err(|_| out_of_range::<Self>(value, path))
                }
            }
        )*
    };
}

impl_from_value_integer!(i32, i64, u16, u32, u64, usize);

impl<T: FromValue> FromValue for Option<T> {
    const TYPE_NAME: &'static str = "option";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::Absent => Ok(None),
            other => T::from_value(other, path).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const TYPE_NAME: &'static str = "list";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::List(items) | Value::Set(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item, &path.index(i)))
                .collect(),
            other => Err(mismatch::<Self>(other, path)),
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    const TYPE_NAME: &'static str = "map";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| {
                    let converted = T::from_value(item, &path.field(key))?;
                    Ok::<_, ConfigError>((key.clone(), converted))
                })
                .collect(),
            other => Err(mismatch::<Self>(other, path)),
        }
    }
}

impl FromValue for Object {
    const TYPE_NAME: &'static str = "object";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::Object(object) => Ok(object.clone()),
            other => Err(mismatch::<Self>(other, path)),
        }
    }
}

impl FromValue for EnumValue {
    const TYPE_NAME: &'static str = "enum";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::Enum(constant) => Ok(constant.clone()),
            other => Err(mismatch::<Self>(other, path)),
        }
    }
}

impl FromValue for ReferenceHandle {
    const TYPE_NAME: &'static str = "reference";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match value {
            Value::Reference(handle) => Ok(handle.clone()),
            other => Err(mismatch::<Self>(other, path)),
        }
    }
}

impl<T: Any + Send + Sync> FromValue for Reference<T> {
    const TYPE_NAME: &'static str = "reference";

    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ConfigError> {
        let handle = ReferenceHandle::from_value(value, path)?;
        Reference::new(handle).ok_or_else(|| {
            ConfigError::conversion(path, "reference", std::any::type_name::<T>())
                .with_detail("handle refers to a different type")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::FromValue;
    use crate::{ConfigError, FieldPath, Value};

    #[test]
    fn integers_narrow_with_range_checks() {
        let path = FieldPath::root().field("port");
        assert_eq!(u16::from_value(&Value::Int(5432), &path).unwrap(), 5432);
        let err = u16::from_value(&Value::Long(70_000), &path).unwrap_err();
        assert!(err.to_string().contains("out of range"), "got: {err}");
    }

    #[test]
    fn absent_is_none_or_missing() {
        let path = FieldPath::root().field("host");
        assert_eq!(Option::<String>::from_value(&Value::Absent, &path).unwrap(), None);
        assert_eq!(
            String::from_value(&Value::Absent, &path).unwrap_err(),
            ConfigError::missing(&path)
        );
    }
}
