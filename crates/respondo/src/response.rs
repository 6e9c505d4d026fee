// Response body types for the /responses endpoint
// https://platform.openai.com/docs/api-reference/responses/object

use serde::{Deserialize, Serialize};

/// Lifecycle status of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
    Incomplete,
    Failed,
    #[serde(other)]
    Unknown,
}

impl Default for ResponseStatus {
    fn default() -> Self {
        ResponseStatus::InProgress
    }
}

/// A complete (or still-assembling) response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub created_at: i64,

    #[serde(default)]
    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub output: Vec<OutputItem>,

    /// Token counts as reported by the server; never computed client-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_details: Option<IncompleteDetails>,
}

/// Server-side failure details (`status == failed`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Why the response stopped early (`status == incomplete`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncompleteDetails {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Item in the output array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
        #[serde(default = "default_assistant_role")]
        role: String,
        #[serde(default)]
        content: Vec<ContentPart>,
    },

    Reasoning {
        #[serde(default)]
        id: String,
        #[serde(default)]
        summary: Vec<SummaryPart>,
    },

    FunctionCall {
        #[serde(default)]
        id: String,
        #[serde(default)]
        call_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        arguments: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },

    /// Item types this crate does not model (web_search_call, etc)
    #[serde(other)]
    Unknown,
}

fn default_assistant_role() -> String {
    "assistant".to_string()
}

/// Content part in a message item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    OutputText {
        #[serde(default)]
        text: String,
        #[serde(default)]
        annotations: Vec<Annotation>,
    },

    #[serde(other)]
    Unknown,
}

/// Citation attached to a content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    UrlCitation {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_index: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_index: Option<u32>,
    },

    #[serde(other)]
    Unknown,
}

/// Part of a reasoning summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummaryPart {
    SummaryText {
        #[serde(default)]
        text: String,
    },

    #[serde(other)]
    Unknown,
}

/// Usage stats, copied verbatim from the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_details: Option<InputTokensDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens_details: Option<OutputTokensDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTokensDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTokensDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

/// A finished function call extracted from the output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub id: String,
    pub call_id: String,
    pub name: String,
    pub arguments: String,
}

impl FunctionCall {
    /// Parse the raw argument string as JSON
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

impl Response {
    pub fn is_complete(&self) -> bool {
        self.status == ResponseStatus::Completed
    }

    /// All message text, concatenated in output order
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { content, .. } => Some(content),
                _ => None,
            })
            .flatten()
            .filter_map(|part| match part {
                ContentPart::OutputText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All reasoning summary text (concatenated), if any
    pub fn reasoning_text(&self) -> Option<String> {
        let reasoning_texts: Vec<&str> = self
            .output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Reasoning { summary, .. } => Some(summary),
                _ => None,
            })
            .flatten()
            .filter_map(|part| match part {
                SummaryPart::SummaryText { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if reasoning_texts.is_empty() {
            None
        } else {
            Some(reasoning_texts.join("\n"))
        }
    }

    /// Function calls the model asked for, in output order
    pub fn function_calls(&self) -> Vec<FunctionCall> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::FunctionCall {
                    id,
                    call_id,
                    name,
                    arguments,
                    ..
                } => Some(FunctionCall {
                    id: id.clone(),
                    call_id: call_id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Citations attached to any message content part
    pub fn citations(&self) -> Vec<&Annotation> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { content, .. } => Some(content),
                _ => None,
            })
            .flatten()
            .filter_map(|part| match part {
                ContentPart::OutputText { annotations, .. } => Some(annotations),
                _ => None,
            })
            .flatten()
            .collect()
    }
}
