//! Structured-output contract
//!
//! Derives the JSON Schema of [`ContractExtraction`] and tightens it into the
//! strict form expected by structured-output model services: every object
//! forbids additional properties and lists all of its properties as required,
//! at every nesting level.

use crate::extraction::ContractExtraction;
use schemars::gen::SchemaSettings;
use serde_json::{json, Map, Value};

/// Name under which the contract is registered with the model service
pub const RESPONSE_FORMAT_NAME: &str = "contract_extraction";

/// Root properties every extraction must carry
pub const ROOT_PROPERTIES: [&str; 4] = [
    "contract_metadata",
    "financial_terms",
    "pricing_rules",
    "extraction_metadata",
];

/// JSON Schema of a contract extraction in strict form
pub fn contract_schema() -> Result<Value, serde_json::Error> {
    let generator = SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.option_add_null_type = false;
        })
        .into_generator();

    let root = generator.into_root_schema_for::<ContractExtraction>();
    let mut schema = serde_json::to_value(root)?;
    enforce_strict(&mut schema);
    Ok(schema)
}

/// The `response_format` payload for a structured completion request
pub fn response_format() -> Result<Value, serde_json::Error> {
    Ok(json!({
        "type": "json_schema",
        "json_schema": {
            "name": RESPONSE_FORMAT_NAME,
            "schema": contract_schema()?,
            "strict": true,
        }
    }))
}

/// Recursively tighten a schema for strict structured output
///
/// Object schemas get `additionalProperties: false` and a `required` list
/// naming every property. Numeric `format` hints are dropped because strict
/// mode does not accept them.
pub fn enforce_strict(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            if is_object_schema(map) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                let required: Vec<Value> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect())
                    .unwrap_or_default();
                map.insert("required".to_string(), Value::Array(required));
            }

            if is_numeric_schema(map) {
                map.remove("format");
            }

            if let Some(Value::Object(props)) = map.get_mut("properties") {
                for prop in props.values_mut() {
                    enforce_strict(prop);
                }
            }

            if let Some(items) = map.get_mut("items") {
                enforce_strict(items);
            }

            for key in ["definitions", "$defs", "allOf", "anyOf", "oneOf"] {
                match map.get_mut(key) {
                    Some(Value::Object(defs)) => defs.values_mut().for_each(enforce_strict),
                    Some(Value::Array(variants)) => variants.iter_mut().for_each(enforce_strict),
                    _ => {}
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(enforce_strict),
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    map.get("type").and_then(Value::as_str) == Some("object") || map.contains_key("properties")
}

fn is_numeric_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(t)) => t == "integer" || t == "number",
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str() == Some("integer") || t.as_str() == Some("number")),
        _ => false,
    }
}
