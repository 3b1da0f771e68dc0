use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "api": {
                "type": "object",
                "properties": {
                    "url": { "type": "string", "format": "uri" },
                    "user": { "type": "string" },
                    "password": { "type": "string" },
                    "timeout_secs": { "type": "integer", "minimum": 1 }
                },
                "additionalProperties": false
            },
            "binaries_path": { "type": "string" },
            "database_path": { "type": "string" },
            "submit": {
                "type": "object",
                "properties": {
                    "concurrency": { "type": "integer", "minimum": 1, "maximum": 64 }
                },
                "additionalProperties": false
            },
            "scheduler": {
                "type": "object",
                "properties": {
                    "interval_secs": { "type": "integer", "minimum": 1 }
                },
                "additionalProperties": false
            },
            "jobs": {
                "type": "object",
                "properties": {
                    "kinds": {
                        "type": "array",
                        "items": { "type": "string", "enum": ["afl", "driller", "rex"] },
                        "uniqueItems": true
                    }
                },
                "additionalProperties": false
            }
        },
        "additionalProperties": false
    })
});
