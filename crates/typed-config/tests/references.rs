use std::sync::Arc;

use indoc::indoc;
use parking_lot::RwLock;
use typed_config::{
    ConfigError, Decoder, DefaultSpec, FieldDescriptor, FieldPath, FromValue, Node, Reference,
    ReferenceHandle, Registries, Schema, TypeRef, Value, parse_yaml,
};

#[derive(Debug, PartialEq)]
struct Region {
    code: String,
    display: String,
}

fn region(code: &str, display: &str) -> Arc<Region> {
    Arc::new(Region {
        code: code.into(),
        display: display.into(),
    })
}

type Live = Arc<RwLock<Vec<Arc<Region>>>>;

fn registries_with_regions() -> (Registries, Live) {
    let registries = Registries::new();
    let live: Live = Arc::default();
    let supplier = live.clone();
    registries
        .references
        .install(|r: &Region| r.code.clone(), move || supplier.read().clone())
        .unwrap();
    (registries, live)
}

fn deployment_schema() -> Arc<Schema> {
    Schema::builder("Deployment")
        .field(FieldDescriptor::new("region", TypeRef::reference::<Region>()))
        .field(
            FieldDescriptor::new("fallback", TypeRef::reference::<Region>())
                .default_value(DefaultSpec::Reference("us-east".into())),
        )
        .build()
        .unwrap()
}

fn yaml(text: &str) -> Node {
    parse_yaml(text).unwrap()
}

fn handle(value: Option<&Value>) -> ReferenceHandle {
    ReferenceHandle::from_value(value.unwrap_or(&Value::Absent), &FieldPath::root()).unwrap()
}

#[test]
fn handles_resolve_against_the_live_collection() {
    let (registries, live) = registries_with_regions();
    let object = Decoder::new(&registries)
        .decode_object(&yaml("region: eu-west"), &deployment_schema())
        .unwrap();
    let region_handle = handle(object.get("region"));
    assert_eq!(region_handle.key(), "eu-west");

    assert_eq!(
        region_handle.element().unwrap_err(),
        ConfigError::UnresolvedReferenceKey {
            type_name: std::any::type_name::<Region>().into(),
            key: "eu-west".into(),
        }
    );

    live.write().push(region("eu-west", "Europe (West)"));
    let element = region_handle.element_as::<Region>().unwrap();
    assert_eq!(element.display, "Europe (West)");

    live.write().clear();
    assert!(region_handle.element().is_err());
}

#[test]
fn reference_default_is_lazy_too() {
    let (registries, live) = registries_with_regions();
    let object = Decoder::new(&registries)
        .decode_object(&yaml("region: eu-west"), &deployment_schema())
        .unwrap();
    let fallback = handle(object.get("fallback"));
    assert_eq!(fallback.key(), "us-east");
    assert!(fallback.element().is_err());

    live.write().push(region("us-east", "US (East)"));
    assert_eq!(fallback.element_as::<Region>().unwrap().code, "us-east");
}

#[test]
fn typed_reference_view() {
    let (registries, live) = registries_with_regions();
    live.write().push(region("ap-south", "Asia Pacific (South)"));
    let object = Decoder::new(&registries)
        .decode_object(&yaml("region: ap-south"), &deployment_schema())
        .unwrap();

    let typed: Reference<Region> = object.get_as("region").unwrap();
    assert_eq!(typed.key(), "ap-south");
    assert_eq!(typed.element().unwrap().display, "Asia Pacific (South)");

    let wrong = object.get_as::<Reference<String>>("region").unwrap_err();
    assert!(matches!(wrong, ConfigError::TypeConversionFailure { .. }), "got: {wrong:?}");
}

#[test]
fn decoding_without_a_provider_fails() {
    let registries = Registries::new();
    let err = Decoder::new(&registries)
        .decode_object(&yaml("region: eu-west"), &deployment_schema())
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnregisteredReferenceProvider {
            type_name: std::any::type_name::<Region>().into(),
        }
    );
}

#[test]
fn handles_outlive_provider_removal() {
    let (registries, live) = registries_with_regions();
    live.write().push(region("eu-west", "Europe (West)"));
    let object = Decoder::new(&registries)
        .decode_object(&yaml("region: eu-west"), &deployment_schema())
        .unwrap();
    assert!(registries.references.uninstall::<Region>());

    assert!(handle(object.get("region")).element().is_ok());
    let err = Decoder::new(&registries)
        .decode_object(&yaml("region: eu-west"), &deployment_schema())
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnregisteredReferenceProvider { .. }));
}

#[test]
fn references_in_collections() {
    let (registries, live) = registries_with_regions();
    let schema = Schema::builder("Replication")
        .field(FieldDescriptor::new("targets", TypeRef::list(TypeRef::reference::<Region>())))
        .build()
        .unwrap();
    let object = Decoder::new(&registries)
        .decode_object(
            &yaml(indoc! {"
                targets: [eu-west, us-east]
            "}),
            &schema,
        )
        .unwrap();
    live.write().push(region("us-east", "US (East)"));

    let targets: Vec<Reference<Region>> = object.get_as("targets").unwrap();
    assert_eq!(targets.len(), 2);
    assert!(targets[0].element().is_err());
    assert_eq!(targets[1].element().unwrap().code, "us-east");
}
