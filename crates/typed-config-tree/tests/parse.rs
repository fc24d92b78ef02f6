use indoc::indoc;
use typed_config_tree::{Node, Scalar, TreeError, parse_kdl, parse_yaml};

#[test]
fn yaml_mapping_keeps_document_order() {
    let root = parse_yaml(indoc! {"
        zeta: 1
        alpha: two
        mid: [true, 2.5]
    "})
    .unwrap();

    let keys: Vec<_> = root.as_mapping().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
    assert_eq!(
        root.get("mid"),
        Some(&Node::Sequence(vec![
            Node::Scalar(Scalar::Bool(true)),
            Node::Scalar(Scalar::Float(2.5)),
        ]))
    );
}

#[test]
fn yaml_empty_value_is_null() {
    let root = parse_yaml("host:\nport: 80\n").unwrap();
    assert_eq!(root.get("host"), Some(&Node::Null));
}

#[test]
fn yaml_numeric_keys_become_strings() {
    let root = parse_yaml("8080: web\n").unwrap();
    assert_eq!(root.get("8080").and_then(Node::as_str), Some("web"));
}

#[test]
fn yaml_syntax_errors_are_reported() {
    let err = parse_yaml("a: [1, 2").unwrap_err();
    assert!(matches!(err, TreeError::Yaml(_)), "got: {err:?}");
}

#[test]
fn kdl_children_become_mappings() {
    let root = parse_kdl(indoc! {r#"
        database type="mysql" {
            host "db.local"
            port 3306
        }
    "#})
    .unwrap();

    let database = root.get("database").unwrap();
    assert_eq!(database.get("type").and_then(Node::as_str), Some("mysql"));
    assert_eq!(database.get("host").and_then(Node::as_str), Some("db.local"));
    assert_eq!(database.get("port"), Some(&Node::from(3306)));
}

#[test]
fn kdl_dash_children_become_a_sequence() {
    let root = parse_kdl(indoc! {r#"
        servers {
            - host="a" port=1
            - host="b" port=2
        }
        tags "x" "y"
    "#})
    .unwrap();

    let servers = root.get("servers").and_then(Node::as_sequence).unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[1].get("host").and_then(Node::as_str), Some("b"));
    assert_eq!(root.get("tags"), Some(&Node::from(vec!["x", "y"])));
}

#[test]
fn kdl_arguments_cannot_mix_with_children() {
    let err = parse_kdl("server \"a\" { port 1 }").unwrap_err();
    assert_eq!(
        err,
        TreeError::MixedEntries {
            node: "server".into()
        }
    );
}
