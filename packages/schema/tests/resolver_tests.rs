//! Effective-schema resolution over realistic schema documents

use metaconf_common::{path, Path};
use metaconf_schema::{to_schema_path, MergeFailure, Resolution, SchemaDocument, SchemaResolver};
use serde_json::{json, Value};

fn person_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Person",
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": {"type": "string", "minLength": 1},
            "age": {"type": "integer", "minimum": 0},
            "address": {"$ref": "#/$defs/address"},
            "contacts": {
                "type": "array",
                "items": {"$ref": "#/$defs/contact"}
            },
            "location": {
                "type": "array",
                "prefixItems": [{"title": "Latitude"}, {"title": "Longitude"}],
                "items": false
            },
            "labels": {
                "type": "object",
                "patternProperties": {"^x-": {"type": "string"}},
                "additionalProperties": {"type": "integer"}
            },
            "employee": {
                "allOf": [
                    {"$ref": "#/$defs/contact"},
                    {"properties": {"team": {"type": "string"}}, "required": ["team"]}
                ]
            }
        },
        "$defs": {
            "address": {
                "type": "object",
                "properties": {
                    "street": {"type": "string"},
                    "city": {"type": "string"}
                }
            },
            "contact": {
                "type": "object",
                "required": ["email"],
                "properties": {
                    "email": {"type": "string", "format": "email"},
                    "phone": {"type": "string"}
                }
            }
        }
    })
}

#[test]
fn test_schema_paths_follow_the_data() {
    let schema = SchemaDocument::new(person_schema());
    let cases = [
        (path![], Path::root()),
        (path!["name"], path!["properties", "name"]),
        (path!["address", "city"], path!["properties", "address", "properties", "city"]),
        (path!["contacts", 3, "email"], path!["properties", "contacts", "items", "properties", "email"]),
        (path!["location", 1], path!["properties", "location", "prefixItems", 1]),
        (path!["location", 2], path!["properties", "location", "items"]),
        (path!["labels", "x-team"], path!["properties", "labels", "patternProperties", "^x-"]),
        (path!["labels", "count"], path!["properties", "labels", "additionalProperties"]),
        (path!["unknown", "deeper"], path!["properties", "unknown", "properties", "deeper"]),
    ];
    for (data_path, expected) in cases {
        assert_eq!(to_schema_path(&schema, &data_path), expected, "data path '{}'", data_path);
    }
}

#[test]
fn test_referenced_nodes_are_inlined() {
    let schema = SchemaDocument::new(person_schema());
    let mut resolver = SchemaResolver::new();

    let address = resolver.effective_schema_at(&schema, &path!["address"]);
    assert_eq!(address.resolution, Resolution::Plain);
    assert_eq!(address.property_order(), vec!["street", "city"]);

    let contact = resolver.effective_schema_at(&schema, &path!["contacts", 0]);
    assert_eq!(contact.types(), vec!["object"]);
    assert_eq!(contact.property_order(), vec!["email", "phone"]);
}

#[test]
fn test_all_of_with_references_merges() {
    let schema = SchemaDocument::new(person_schema());
    let mut resolver = SchemaResolver::new();

    let employee = resolver.effective_schema_at(&schema, &path!["employee"]);
    assert_eq!(employee.resolution, Resolution::Merged);
    assert_eq!(employee.property_order(), vec!["email", "phone", "team"]);
    assert_eq!(employee.get("required"), Some(&json!(["email", "team"])));

    let team = resolver.effective_schema_at(&schema, &path!["employee", "team"]);
    assert_eq!(team.schema, json!({"type": "string"}));
}

#[test]
fn test_false_items_resolve_to_never() {
    let schema = SchemaDocument::new(person_schema());
    let mut resolver = SchemaResolver::new();
    let beyond = resolver.effective_schema_at(&schema, &path!["location", 5]);
    assert_eq!(beyond.schema, json!({"not": {}}));
}

#[test]
fn test_conflicting_composition_is_reported_not_raised() {
    let schema = SchemaDocument::new(json!({
        "properties": {
            "port": {
                "type": "integer",
                "allOf": [{"type": "string"}],
                "properties": {"unused": {}}
            },
            "bounds": {
                "allOf": [{"minimum": 1, "maximum": 10}, {"minimum": 3, "maximum": 20}]
            }
        }
    }));
    let mut resolver = SchemaResolver::new();

    let port = resolver.effective_schema_at(&schema, &path!["port"]);
    match &port.resolution {
        Resolution::Unresolved(MergeFailure::Conflict { keyword, .. }) => assert_eq!(keyword, "type"),
        other => panic!("expected a type conflict, got {:?}", other),
    }
    assert!(port.get("allOf").is_some());

    // Navigation below an unresolved node still uses its own keywords
    let unused = resolver.effective_schema_at(&schema, &path!["port", "unused"]);
    assert_eq!(unused.schema_path, path!["properties", "port", "properties", "unused"]);

    let bounds = resolver.effective_schema_at(&schema, &path!["bounds"]);
    assert_eq!(bounds.schema, json!({"minimum": 3, "maximum": 10}));
}

#[test]
fn test_cache_tracks_document_identity() {
    let mut resolver = SchemaResolver::new();
    let first = SchemaDocument::new(person_schema());
    resolver.effective_schema_at(&first, &path!["address", "city"]);
    assert_eq!(resolver.len(), 3);

    // Same content, new identity: nothing is reused
    let second = SchemaDocument::new(person_schema());
    resolver.effective_schema_at(&second, &path!["name"]);
    assert_eq!(resolver.len(), 2);

    resolver.clear();
    assert!(resolver.is_empty());
}
