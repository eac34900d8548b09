//! Integration tests for filtering JSON documents by permission

use permtree::{DataFilter, Handler, Permission, RuleTree, TaggedFilter};
use serde_json::{json, Value};

const R: Permission = Permission::READ;
const RW: Permission = Permission::RW;
const DENY: Permission = Permission::DENY;

fn mixed_rules() -> Vec<(&'static str, Permission)> {
    vec![
        ("a", R),
        ("a.b.c", RW),
        ("a.b.e", DENY),
        ("a.b.*.d", DENY),
        ("e.f", R),
        ("e.*.g", Permission::WRITE),
        ("e.*.g.a", R),
        ("e.*.g.b", RW),
        ("e.h.g", DENY),
        ("f.g", R),
    ]
}

fn account_rules() -> Vec<(&'static str, Permission)> {
    vec![
        ("a", R),
        ("a.b.c", RW),
        ("a.b.*.d", DENY),
        ("a.c", Permission::WRITE),
        ("b.c", R),
        ("k", R),
        ("k.x.y", DENY),
        ("l", R),
        ("l.*.y", DENY),
    ]
}

fn explicit_document() -> Value {
    json!({
        "a": {
            "b": {
                "c": true,
                "d": false,
                "e": true,
                "f": { "something": "else" },
                "g": {
                    "nested": { "something": "else" },
                    "test": true
                }
            }
        },
        "k": {
            "a": {
                "nested": { "something": "else" },
                "test": true
            }
        }
    })
}

fn explicit_handlers(tree: &RuleTree) -> DataFilter<'_> {
    DataFilter::new(tree)
        .handler("a.b.d", Handler::new().explicit())
        .and_then(|f| f.handler("a.b.f", Handler::new().explicit()))
        .and_then(|f| f.handler("k.a.nested", Handler::new().explicit()))
        .and_then(|f| f.handler("a.b.*.nested", Handler::new().explicit()))
        .unwrap()
}

#[test]
fn test_denied_branches_are_removed() {
    let tree = RuleTree::compile(mixed_rules()).unwrap();
    let data = json!({
        "a": {
            "b": {
                "c": { "A": true },
                "d": { "A": true },
                "e": { "A": false }
            }
        },
        "f": { "g": true }
    });

    let expected = json!({
        "a": {
            "b": {
                "c": { "A": true },
                "d": { "A": true }
            }
        },
        "f": { "g": true }
    });

    assert_eq!(DataFilter::new(&tree).apply(data), expected);
}

#[test]
fn test_explicit_handlers_ignore_inherited_grants() {
    let tree = RuleTree::compile(account_rules()).unwrap();

    let expected = json!({
        "a": {
            "b": {
                "c": true,
                "e": true,
                "g": { "test": true }
            }
        },
        "k": {
            "a": { "test": true }
        }
    });

    assert_eq!(explicit_handlers(&tree).apply(explicit_document()), expected);
}

#[test]
fn test_explicit_handlers_pass_with_exact_rules() {
    let mut rules = account_rules();
    rules.extend([
        ("a.b.d", R),
        ("a.b.f", R),
        ("k.a.nested", R),
        ("a.b.g.nested", R),
    ]);
    let tree = RuleTree::compile(rules).unwrap();

    assert_eq!(explicit_handlers(&tree).apply(explicit_document()), explicit_document());
}

#[test]
fn test_nested_lists_with_key_handlers() {
    let tree = RuleTree::compile([
        ("a.b", R),
        ("x", R),
        ("x.z", DENY),
        ("nested.*.data.public", R),
    ])
    .unwrap();

    let data = json!({
        "a": [
            { "id": "b" },
            { "id": "c" }
        ],
        "x": [
            { "custom": "y" },
            { "custom": "z" }
        ],
        "nested": [
            {
                "data": [
                    {
                        "level": "public",
                        "some": "data",
                        "explicit": { "sekret": "data" }
                    },
                    {
                        "level": "private",
                        "sekret": "data"
                    }
                ]
            }
        ]
    });

    let expected = json!({
        "a": [
            { "id": "b" }
        ],
        "nested": [
            {
                "data": [
                    { "level": "public", "some": "data" }
                ]
            }
        ],
        "x": [
            { "custom": "y" }
        ]
    });

    let filter = DataFilter::new(&tree)
        .handler(
            "x",
            Handler::new().key(|row, index| match row.get("custom").and_then(Value::as_str) {
                Some(custom) => custom.to_string(),
                None => index.to_string(),
            }),
        )
        .and_then(|f| f.handler("nested.*.data", Handler::new().key_field("level")))
        .and_then(|f| f.handler("nested.*.data.public.explicit", Handler::new().explicit()))
        .unwrap();

    assert_eq!(filter.apply(data), expected);
}

#[test]
fn test_tagged_feed() {
    let tree = RuleTree::compile([
        ("feed", R),
        ("feed.*.private", DENY),
        ("feed.ops.private", R),
    ])
    .unwrap();

    let data = json!({
        "items": [
            { "_path": "feed.dev.public", "title": "release notes" },
            { "_path": "feed.dev.private", "title": "roadmap" },
            { "_path": "feed.ops.private", "title": "on-call" }
        ]
    });

    let filtered = TaggedFilter::new(&tree).apply(data).unwrap();
    assert_eq!(
        filtered,
        Some(json!({
            "items": [
                { "title": "release notes" },
                { "title": "on-call" }
            ]
        }))
    );
}
