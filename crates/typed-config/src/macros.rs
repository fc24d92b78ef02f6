/// Declare a struct together with its schema.
///
/// Each field pairs a Rust type with the [`FieldDescriptor`](crate::FieldDescriptor)
/// that decodes it. The macro emits the struct, a [`Configurable`](crate::Configurable)
/// impl that caches the schema in a [`SchemaCell`](crate::SchemaCell), and a
/// [`FromValue`](crate::FromValue) impl reading every field by its declared name.
/// Descriptors are evaluated inside the schema build, so `?` works in them.
///
/// ```
/// use typed_config::{Constraint, FieldDescriptor, Registries, TypeRef, configurable};
///
/// configurable! {
///     #[derive(Debug)]
///     pub struct Server as "Server" {
///         pub host: String => FieldDescriptor::new("host", TypeRef::String),
///         pub port: i32 => FieldDescriptor::new("port", TypeRef::Int)
///             .constraint(Constraint::min(1.0)),
///     }
/// }
///
/// let server: Server = typed_config::decode_yaml("host: db\nport: 5432", &Registries::new())?;
/// assert_eq!(server.port, 5432);
/// # Ok::<(), typed_config::ConfigError>(())
/// ```
#[macro_export]
macro_rules! configurable {
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident as $schema_name:literal {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty => $descriptor:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $ty {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )+
        }

        impl $crate::Configurable for $ty {
            fn schema() -> ::core::result::Result<
                ::std::sync::Arc<$crate::Schema>,
                $crate::ConfigError,
            > {
                static SCHEMA: $crate::SchemaCell = $crate::SchemaCell::new();
                SCHEMA.get_or_build(|| {
                    $crate::Schema::builder($schema_name)
                        $(.field($descriptor))+
                        .build()
                })
            }
        }

        impl $crate::FromValue for $ty {
            const TYPE_NAME: &'static str = $schema_name;

            fn from_value(
                value: &$crate::Value,
                path: &$crate::FieldPath,
            ) -> ::core::result::Result<Self, $crate::ConfigError> {
                let object = <$crate::Object as $crate::FromValue>::from_value(value, path)?;
                let schema = <Self as $crate::Configurable>::schema()?;
                // Descriptors were pushed in field order.
                let mut descriptors = schema.fields().iter();
                ::core::result::Result::Ok(Self {
                    $(
                        $field: {
                            let descriptor = descriptors.next().ok_or_else(|| {
                                $crate::ConfigError::schema(::std::format!(
                                    "{} has no descriptor for field {}",
                                    $schema_name,
                                    ::core::stringify!($field)
                                ))
                            })?;
                            object.get_as(descriptor.name())?
                        },
                    )+
                })
            }
        }
    };
}
