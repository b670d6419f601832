//! The `KnowledgeBase` class definition

use serde_json::{json, Value};

/// Name of the single collection every backend serves
pub const KNOWLEDGE_CLASS: &str = "KnowledgeBase";

/// Properties requested for every entry read
pub const ENTRY_PROPERTIES: &[&str] = &[
    "title",
    "content",
    "category",
    "created_at",
    "updated_at",
    "tags",
];

/// Class definition provisioned when the collection is missing.
///
/// `category` uses field tokenization so that category filters compare the
/// whole value rather than individual words.
pub fn knowledge_base_class(class_name: &str) -> Value {
    json!({
        "class": class_name,
        "description": "Knowledge base entries managed through chat commands",
        "vectorizer": "text2vec-openai",
        "properties": [
            {
                "name": "title",
                "dataType": ["text"],
                "indexFilterable": true,
                "indexSearchable": true
            },
            {
                "name": "content",
                "dataType": ["text"],
                "indexFilterable": false,
                "indexSearchable": true
            },
            {
                "name": "category",
                "dataType": ["text"],
                "tokenization": "field",
                "indexFilterable": true,
                "indexSearchable": true
            },
            {
                "name": "created_at",
                "dataType": ["date"],
                "indexFilterable": true,
                "indexSearchable": false
            },
            {
                "name": "updated_at",
                "dataType": ["date"],
                "indexFilterable": true,
                "indexSearchable": false
            },
            {
                "name": "tags",
                "dataType": ["text[]"],
                "indexFilterable": true,
                "indexSearchable": true
            }
        ]
    })
}

/// Whether a schema document already contains `class_name`
pub fn has_class(schema: &Value, class_name: &str) -> bool {
    schema_classes(schema)
        .iter()
        .any(|class| class.get("class").and_then(Value::as_str) == Some(class_name))
}

/// Number of classes in a schema document
pub fn class_count(schema: &Value) -> usize {
    schema_classes(schema).len()
}

fn schema_classes(schema: &Value) -> &[Value] {
    schema
        .get("classes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
