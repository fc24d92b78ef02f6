use std::sync::Arc;

use proptest::prelude::*;
use typed_config::{
    ContractBuilder, Decoder, DefaultSpec, FieldDescriptor, Mapping, Node, Registries, Schema,
    TypeRef, camel_to_kebab, constant_to_kebab,
};

fn endpoint_schema() -> Arc<Schema> {
    Schema::builder("Endpoint")
        .field(FieldDescriptor::new("host", TypeRef::String))
        .field(FieldDescriptor::new("port", TypeRef::Int).default_value(DefaultSpec::Int(80)))
        .field(FieldDescriptor::new("weights", TypeRef::map(TypeRef::Double)).optional())
        .field(FieldDescriptor::new("tags", TypeRef::set(TypeRef::String)).optional())
        .build()
        .unwrap()
}

fn endpoint_node(host: &str, port: Option<i32>, tags: &[String]) -> Node {
    let mut mapping = Mapping::new();
    mapping.insert("host".into(), Node::from(host));
    if let Some(port) = port {
        mapping.insert("port".into(), Node::from(port));
    }
    mapping.insert(
        "tags".into(),
        Node::from(tags.iter().map(String::as_str).collect::<Vec<_>>()),
    );
    Node::Mapping(mapping)
}

proptest! {
    #[test]
    fn camel_names_become_lowercase_and_stable(name in "[a-z][a-zA-Z0-9]{0,12}") {
        let kebab = camel_to_kebab(&name);
        prop_assert_eq!(&kebab, &camel_to_kebab(&name));
        prop_assert!(!kebab.chars().any(char::is_uppercase));
        prop_assert_eq!(kebab.replace('-', ""), name.to_lowercase());
    }

    #[test]
    fn constant_names_swap_underscores_for_hyphens(
        parts in prop::collection::vec("[A-Z][A-Z0-9]{0,5}", 1..4)
    ) {
        let constant = parts.join("_");
        let expected = parts.join("-").to_lowercase();
        prop_assert_eq!(constant_to_kebab(&constant), expected);
    }

    #[test]
    fn decoding_the_same_tree_twice_is_equal(
        host in "[a-z]{1,10}",
        port in prop::option::of(1i32..65535),
        tags in prop::collection::vec("[a-z]{1,4}", 0..6),
    ) {
        let registries = Registries::new();
        let decoder = Decoder::new(&registries);
        let schema = endpoint_schema();
        let root = endpoint_node(&host, port, &tags);

        let first = decoder.decode_object(&root, &schema).unwrap();
        let second = decoder.decode_object(&root, &schema).unwrap();
        prop_assert_eq!(&first, &second);
    }

    #[test]
    fn set_fields_keep_first_occurrences(tags in prop::collection::vec("[a-c]", 0..10)) {
        let registries = Registries::new();
        let root = endpoint_node("h", None, &tags);
        let object = Decoder::new(&registries).decode_object(&root, &endpoint_schema()).unwrap();

        let decoded: Vec<String> = object.get_as("tags").unwrap();
        let mut expected: Vec<String> = Vec::new();
        for tag in tags {
            if !expected.contains(&tag) {
                expected.push(tag);
            }
        }
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn discriminator_always_selects_its_variant(pick_a in any::<bool>(), host in "[a-z]{1,8}") {
        let a = Schema::builder("A").field(FieldDescriptor::new("host", TypeRef::String)).build().unwrap();
        let b = Schema::builder("B").field(FieldDescriptor::new("host", TypeRef::String)).build().unwrap();
        let registries = Registries::new();
        registries
            .contracts
            .register(ContractBuilder::new("Target").variant("a", a).variant("b", b))
            .unwrap();

        let discriminator = if pick_a { "a" } else { "b" };
        let target: Node = [("type", Node::from(discriminator)), ("host", Node::from(host.as_str()))]
            .into_iter()
            .collect();
        let root: Node = [("target", target)].into_iter().collect();
        let holder = Schema::builder("Holder")
            .field(FieldDescriptor::new("target", TypeRef::contract("Target")))
            .build()
            .unwrap();

        let object = Decoder::new(&registries).decode_object(&root, &holder).unwrap();
        let target = object.get("target").and_then(|v| v.as_object()).unwrap();
        prop_assert_eq!(target.schema().name(), if pick_a { "A" } else { "B" });
        prop_assert_eq!(target.variant(), Some(discriminator));
    }
}
