//! Built-in schemas for the schema editor and the settings documents.
//!
//! Their `properties` blocks double as the key order used when keys are
//! inserted into those documents.

use crate::history::{DEFAULT_CAPACITY, DEFAULT_DEBOUNCE};
use serde_json::{json, Value};

/// Schema describing JSON Schema documents (a structural subset of draft 2020-12)
pub fn meta_schema() -> Value {
    let schema_array = json!({"type": "array", "items": {"$ref": "#"}});
    let schema_map = json!({"type": "object", "additionalProperties": {"$ref": "#"}});
    let non_negative = json!({"type": "integer", "minimum": 0});

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "metaconf:meta-schema",
        "title": "JSON Schema",
        "type": ["object", "boolean"],
        "properties": {
            "$schema": {"type": "string"},
            "$id": {"type": "string"},
            "$ref": {"type": "string"},
            "title": {"type": "string"},
            "description": {"type": "string"},
            "$comment": {"type": "string"},
            "type": {
                "anyOf": [
                    {"$ref": "#/$defs/simpleTypes"},
                    {"type": "array", "items": {"$ref": "#/$defs/simpleTypes"}, "uniqueItems": true}
                ]
            },
            "enum": {"type": "array"},
            "const": {},
            "default": {},
            "examples": {"type": "array"},
            "properties": schema_map,
            "patternProperties": schema_map,
            "additionalProperties": {"$ref": "#"},
            "required": {"type": "array", "items": {"type": "string"}, "uniqueItems": true},
            "propertyNames": {"$ref": "#"},
            "minProperties": non_negative,
            "maxProperties": non_negative,
            "dependentSchemas": schema_map,
            "items": {"$ref": "#"},
            "prefixItems": schema_array,
            "contains": {"$ref": "#"},
            "minItems": non_negative,
            "maxItems": non_negative,
            "uniqueItems": {"type": "boolean"},
            "minLength": non_negative,
            "maxLength": non_negative,
            "pattern": {"type": "string", "format": "regex"},
            "format": {"type": "string"},
            "minimum": {"type": "number"},
            "exclusiveMinimum": {"type": "number"},
            "maximum": {"type": "number"},
            "exclusiveMaximum": {"type": "number"},
            "multipleOf": {"type": "number", "exclusiveMinimum": 0},
            "allOf": schema_array,
            "anyOf": schema_array,
            "oneOf": schema_array,
            "not": {"$ref": "#"},
            "if": {"$ref": "#"},
            "then": {"$ref": "#"},
            "else": {"$ref": "#"},
            "deprecated": {"type": "boolean"},
            "readOnly": {"type": "boolean"},
            "writeOnly": {"type": "boolean"},
            "$defs": schema_map,
            "definitions": schema_map
        },
        "$defs": {
            "simpleTypes": {
                "enum": ["array", "boolean", "integer", "null", "number", "object", "string"]
            }
        }
    })
}

/// Schema describing the settings document
pub fn settings_schema() -> Value {
    let flag = json!({"type": "boolean", "default": false});

    json!({
        "title": "Settings",
        "type": "object",
        "properties": {
            "dataFormat": {"type": "string", "enum": ["json", "yaml"], "default": "json"},
            "codeEditor": {
                "type": "object",
                "properties": {
                    "fontSize": {"type": "integer", "minimum": 6, "maximum": 65, "default": 14},
                    "indentation": {"type": "integer", "minimum": 0, "maximum": 8, "default": 2}
                }
            },
            "guiEditor": {
                "type": "object",
                "properties": {
                    "maximumDepth": {"type": "integer", "minimum": 1, "maximum": 50, "default": 20},
                    "propertySorting": {
                        "type": "string",
                        "enum": ["schemaOrder", "dataOrder"],
                        "default": "schemaOrder"
                    }
                }
            },
            "metaSchema": {
                "type": "object",
                "properties": {
                    "allowBooleanSchema": flag,
                    "allowMultipleTypes": flag,
                    "showAdditionalPropertiesButton": flag,
                    "objectTypesComfort": flag
                }
            },
            "history": {
                "type": "object",
                "properties": {
                    "capacity": {"type": "integer", "minimum": 0, "default": DEFAULT_CAPACITY},
                    "debounceMs": {
                        "type": "integer",
                        "minimum": 0,
                        "default": DEFAULT_DEBOUNCE.as_millis() as u64
                    }
                }
            },
            "panels": {
                "type": "object",
                "additionalProperties": {
                    "type": "array",
                    "items": {"$ref": "#/$defs/panel"}
                }
            }
        },
        "$defs": {
            "panel": {
                "type": "object",
                "properties": {
                    "panelType": {"type": "string"},
                    "mode": {"type": "string"},
                    "size": {"type": "number", "minimum": 0, "maximum": 100}
                },
                "required": ["panelType", "mode", "size"]
            }
        }
    })
}
