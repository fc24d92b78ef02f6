use std::sync::Arc;

use parking_lot::RwLock;
use typed_config::{
    ConfigError, ContractBuilder, Decoder, FieldDescriptor, FieldPath, Node, Registries,
    ReferenceHandle, Schema, TypeRef, Value, parse_kdl, parse_yaml,
};

fn json_like(text: &str) -> Node {
    // Flow-style YAML is a superset of the JSON used below.
    parse_yaml(text).unwrap()
}

fn keyed_server() -> Arc<Schema> {
    Schema::builder("Environment")
        .field(FieldDescriptor::new("name", TypeRef::String).key())
        .field(FieldDescriptor::new("host", TypeRef::String))
        .field(FieldDescriptor::new("port", TypeRef::Int))
        .build()
        .unwrap()
}

#[test]
fn simple_key_mapping() {
    let registries = Registries::new();
    let decoder = Decoder::new(&registries);

    let object = decoder
        .decode_object(
            &json_like(r#"{"production": {"host": "h", "port": 5432}}"#),
            &keyed_server(),
        )
        .unwrap();
    assert_eq!(object.get("name"), Some(&Value::String("production".into())));
    assert_eq!(object.get("host"), Some(&Value::String("h".into())));
    assert_eq!(object.get("port"), Some(&Value::Int(5432)));

    let err = decoder
        .decode_object(&json_like(r#"{"a": 1, "b": 2}"#), &keyed_server())
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKeyMapping { .. }), "got: {err:?}");
}

#[test]
fn complex_key_mapping() {
    let registries = Registries::new();
    let server = Schema::builder("Server")
        .field(FieldDescriptor::new("host", TypeRef::String))
        .field(FieldDescriptor::new("port", TypeRef::Int))
        .build()
        .unwrap();
    let app = Schema::builder("App")
        .field(FieldDescriptor::new("server", TypeRef::Object(server)).key())
        .field(FieldDescriptor::new("appName", TypeRef::String))
        .build()
        .unwrap();

    let object = Decoder::new(&registries)
        .decode_object(
            &json_like(r#"{"host": "api.example.com", "port": 9000, "app-name": "MyApp"}"#),
            &app,
        )
        .unwrap();
    let server = object.get("server").and_then(Value::as_object).unwrap();
    assert_eq!(server.get("host"), Some(&Value::String("api.example.com".into())));
    assert_eq!(server.get("port"), Some(&Value::Int(9000)));
    assert_eq!(object.get("appName"), Some(&Value::String("MyApp".into())));
}

#[test]
fn discriminated_dispatch() {
    let registries = Registries::new();
    let mysql = Schema::builder("MySql")
        .field(FieldDescriptor::new("driver", TypeRef::String))
        .build()
        .unwrap();
    let postgres = Schema::builder("Postgres")
        .field(FieldDescriptor::new("driver", TypeRef::String).optional())
        .build()
        .unwrap();
    registries
        .contracts
        .register(
            ContractBuilder::new("Database")
                .variant("mysql", mysql)
                .variant("postgres", postgres),
        )
        .unwrap();
    let decoder = Decoder::new(&registries);
    let database = TypeRef::contract("Database");

    let value = decoder
        .decode_value(&json_like(r#"{"type": "mysql", "driver": "x"}"#), &database)
        .unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.schema().name(), "MySql");
    assert_eq!(object.get("driver"), Some(&Value::String("x".into())));

    let err = decoder
        .decode_value(&json_like(r#"{"type": "unknown"}"#), &database)
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnresolvedPolymorphicType {
            contract: "Database".into(),
            discriminator: "unknown".into(),
        }
    );
}

#[derive(Debug)]
struct Item {
    id: String,
}

#[test]
fn reference_laziness() {
    let registries = Registries::new();
    let items: Arc<RwLock<Vec<Arc<Item>>>> = Arc::default();
    let live = items.clone();
    registries
        .references
        .install(|item: &Item| item.id.clone(), move || live.read().clone())
        .unwrap();
    let holder = Schema::builder("Holder")
        .field(FieldDescriptor::new("item", TypeRef::reference::<Item>()))
        .build()
        .unwrap();

    let object = Decoder::new(&registries)
        .decode_object(&json_like(r#"{"item": "late-item"}"#), &holder)
        .unwrap();
    let handle: ReferenceHandle = object.get_as("item").unwrap();
    assert_eq!(handle.key(), "late-item");
    assert!(matches!(
        handle.element(),
        Err(ConfigError::UnresolvedReferenceKey { .. })
    ));

    items.write().push(Arc::new(Item {
        id: "late-item".into(),
    }));
    let element = handle.element_as::<Item>().unwrap();
    assert_eq!(element.id, "late-item");
}

#[test]
fn idempotent_decoding() {
    let registries = Registries::new();
    let root = json_like(r#"{"production": {"host": "h", "port": 5432}}"#);
    let decoder = Decoder::new(&registries);
    let first = decoder.decode_object(&root, &keyed_server()).unwrap();
    let second = decoder.decode_object(&root, &keyed_server()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn yaml_and_kdl_documents_decode_alike() {
    let registries = Registries::new();
    let schema = Schema::builder("Service")
        .field(FieldDescriptor::new("name", TypeRef::String))
        .field(FieldDescriptor::new("replicas", TypeRef::Int))
        .field(FieldDescriptor::new("zones", TypeRef::list(TypeRef::String)))
        .field(FieldDescriptor::new("limits", TypeRef::map(TypeRef::Int)))
        .build()
        .unwrap();
    let decoder = Decoder::new(&registries);

    let from_yaml = decoder
        .decode_object(
            &parse_yaml(indoc::indoc! {"
                name: api
                replicas: 3
                zones: [a, b]
                limits:
                  cpu: 2
                  memory: 512
            "})
            .unwrap(),
            &schema,
        )
        .unwrap();
    let from_kdl = decoder
        .decode_object(
            &parse_kdl(indoc::indoc! {r#"
                name "api"
                replicas 3
                zones "a" "b"
                limits cpu=2 memory=512
            "#})
            .unwrap(),
            &schema,
        )
        .unwrap();
    assert_eq!(from_yaml, from_kdl);
}

#[test]
fn missing_field_path_in_kdl_document() {
    let registries = Registries::new();
    let schema = Schema::builder("App")
        .field(FieldDescriptor::new(
            "server",
            TypeRef::Object(
                Schema::builder("Server")
                    .field(FieldDescriptor::new("host", TypeRef::String))
                    .build()
                    .unwrap(),
            ),
        ))
        .build()
        .unwrap();
    let root = parse_kdl("server port=80").unwrap();
    let err = Decoder::new(&registries).decode_object(&root, &schema).unwrap_err();
    assert_eq!(err, ConfigError::missing(&FieldPath::root().field("server").field("host")));
}
