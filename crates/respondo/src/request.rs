// Request types for the /responses endpoint
// https://platform.openai.com/docs/api-reference/responses/create

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::structured::TextConfig;

/// Reasoning effort level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// Summary mode for reasoning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Auto,
    Detailed,
}

/// Reasoning configuration (`reasoning` request field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    pub effort: ReasoningEffort,
    pub summary: SummaryMode,
}

impl Reasoning {
    pub fn new(effort: ReasoningEffort, summary: SummaryMode) -> Self {
        Self { effort, summary }
    }

    pub fn low() -> Self {
        Self::new(ReasoningEffort::Low, SummaryMode::Auto)
    }

    pub fn medium() -> Self {
        Self::new(ReasoningEffort::Medium, SummaryMode::Auto)
    }

    pub fn high() -> Self {
        Self::new(ReasoningEffort::High, SummaryMode::Auto)
    }
}

/// Role of an input message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
}

/// One item of structured input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message {
        role: Role,
        content: String,
    },

    /// A function call from a previous turn, echoed back as history
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },

    /// The tool's result for a previous function call
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

impl InputItem {
    pub fn system(content: impl Into<String>) -> Self {
        Self::Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn function_call(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::FunctionCall {
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}

/// Request input: a bare prompt or a list of structured items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input {
    Text(String),
    Items(Vec<InputItem>),
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<Vec<InputItem>> for Input {
    fn from(items: Vec<InputItem>) -> Self {
        Input::Items(items)
    }
}

/// Function tool exposed to the model
///
/// The Responses API uses a flat tool shape (name/parameters at the top
/// level, not nested under a `function` object).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String, // Always "function" for now

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for parameters
    pub parameters: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl Tool {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            name: name.into(),
            description: Some(description.into()),
            parameters,
            strict: None,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = Some(true);
        self
    }
}

/// Tool choice parameter (how aggressively to use tools)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// "auto" - let the model decide
    Auto(String),

    /// "none" - don't use tools
    None(String),

    /// "required" - must use at least one tool
    Required(String),

    /// Force a specific function
    Specific {
        #[serde(rename = "type")]
        tool_type: String,
        name: String,
    },
}

impl ToolChoice {
    pub fn auto() -> Self {
        Self::Auto("auto".to_string())
    }

    pub fn none() -> Self {
        Self::None("none".to_string())
    }

    pub fn required() -> Self {
        Self::Required("required".to_string())
    }

    pub fn force(tool_name: impl Into<String>) -> Self {
        Self::Specific {
            tool_type: "function".to_string(),
            name: tool_name.into(),
        }
    }
}

/// OpenRouter plugin descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

impl Plugin {
    /// The web search plugin (adds `url_citation` annotations to output)
    pub fn web() -> Self {
        Self {
            id: "web".to_string(),
            max_results: None,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// A request to the /responses endpoint
///
/// Immutable once handed to the client; build it up front with the
/// `with_*` methods.
#[derive(Debug, Clone)]
pub struct ResponseRequest {
    pub model: String,
    pub input: Input,
    pub instructions: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
    pub reasoning: Option<Reasoning>,
    pub plugins: Option<Vec<Plugin>>,
    pub text: Option<TextConfig>,
}

impl ResponseRequest {
    pub fn new(model: impl Into<String>, input: impl Into<Input>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            instructions: None,
            max_output_tokens: None,
            temperature: None,
            tools: None,
            tool_choice: None,
            reasoning: None,
            plugins: None,
            text: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_reasoning(mut self, reasoning: Reasoning) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<Plugin>) -> Self {
        self.plugins = Some(plugins);
        self
    }

    pub fn with_text_format(mut self, text: TextConfig) -> Self {
        self.text = Some(text);
        self
    }
}
