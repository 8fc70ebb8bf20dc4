//! JSON schema builders for MCP tools.

use serde_json::{Map, Value, json};

/// Schema for tools that take no arguments.
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

/// Build the schema describing the `summarize-document` tool input.
///
/// Exactly one of `url` or `text` is expected; the handler enforces it, since `oneOf` support
/// varies across MCP hosts.
pub(crate) fn summarize_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "url".into(),
        string_schema("Time-limited URL (or local path) of the PDF or image to summarize"),
    );

    let mut kind_schema = Map::new();
    kind_schema.insert("type".into(), Value::String("string".into()));
    kind_schema.insert(
        "description".into(),
        Value::String(
            "Declared document kind; a MIME type is also accepted. When omitted, a `.pdf` suffix selects PDF parsing and anything else goes to OCR.".into(),
        ),
    );
    kind_schema.insert(
        "examples".into(),
        Value::Array(
            ["pdf", "image", "application/pdf", "image/jpeg"]
                .into_iter()
                .map(|variant| Value::String(variant.into()))
                .collect(),
        ),
    );
    properties.insert("kind".into(), Value::Object(kind_schema));

    properties.insert(
        "text".into(),
        string_schema("Report text pasted by the patient; used instead of `url`"),
    );

    let mut schema = finalize_object_schema(properties, &[]);
    schema.insert(
        "examples".into(),
        Value::Array(vec![
            json!({ "url": "https://storage.example/reports/cbc.pdf?token=abc", "kind": "pdf" }),
            json!({ "text": "Hemoglobin 9.1 g/dL (Low)\nFerritin 8 ng/mL (Low)" }),
        ]),
    );
    schema
}

/// Build the schema describing the `explain-term` tool input.
pub(crate) fn explain_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "term".into(),
        string_schema("Medical term to explain, e.g. \"ferritin\" or \"eGFR\""),
    );
    finalize_object_schema(properties, &["term"])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explain_schema_requires_term() {
        let schema = explain_input_schema();
        assert_eq!(schema["required"], json!(["term"]));
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn summarize_schema_lists_both_inputs() {
        let schema = summarize_input_schema();
        let properties = schema["properties"].as_object().expect("properties");
        assert!(properties.contains_key("url"));
        assert!(properties.contains_key("text"));
        assert!(properties.contains_key("kind"));
        assert!(!schema.contains_key("required"));
    }
}
