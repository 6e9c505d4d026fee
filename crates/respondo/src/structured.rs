// Structured output: schema-constrained generation and extraction
//
// Request side: the `text` block tells the server what shape to generate.
// Response side: extraction parses the generated text back into a typed
// value. A model that strays from the schema yields None, never an error.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::{ContentPart, OutputItem, Response};

/// The `text` block of a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
}

/// Output format: text (default), json_object (legacy), or json_schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFormat {
    Text,

    JsonObject,

    JsonSchema {
        name: String,
        schema: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        strict: Option<bool>,
    },
}

impl TextConfig {
    pub fn text() -> Self {
        Self {
            format: Some(TextFormat::Text),
        }
    }

    pub fn json_object() -> Self {
        Self {
            format: Some(TextFormat::JsonObject),
        }
    }

    /// Constrain output to the JSON Schema derived from `T`
    pub fn json_schema<T: JsonSchema>(name: impl Into<String>) -> Self {
        Self::json_schema_value(name, schema_for!(T).to_value())
    }

    /// Constrain output to a hand-written JSON Schema
    pub fn json_schema_value(name: impl Into<String>, schema: Value) -> Self {
        Self {
            format: Some(TextFormat::JsonSchema {
                name: name.into(),
                schema,
                description: None,
                strict: Some(true),
            }),
        }
    }
}

impl Response {
    /// The first message item's text parsed as JSON
    ///
    /// None when there is no message text or it is not valid JSON.
    pub fn output_json(&self) -> Option<Value> {
        let text: String = self
            .output
            .iter()
            .find_map(|item| match item {
                OutputItem::Message { content, .. } => Some(content),
                _ => None,
            })?
            .iter()
            .filter_map(|part| match part {
                ContentPart::OutputText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        serde_json::from_str(&text).ok()
    }

    /// Typed view of [`output_json`](Self::output_json)
    ///
    /// None when the output is missing, not JSON, or does not match `T`'s
    /// shape. Malformed generations are recoverable data, not errors.
    pub fn parse_output<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.output_json()?).ok()
    }
}
