pub mod assembler;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod request;
pub mod response;
pub mod sse;
pub mod stream;
pub mod structured;

pub use client::{Responder, ResponseProvider};
pub use config::Config;
pub use error::{Error, Result};
pub use event::StreamEvent;
pub use request::{
    Input, InputItem, Plugin, Reasoning, ReasoningEffort, ResponseRequest, Role, SummaryMode, Tool,
    ToolChoice,
};
pub use response::{
    Annotation, ContentPart, FunctionCall, IncompleteDetails, OutputItem, Response, ResponseError,
    ResponseStatus, SummaryPart, Usage,
};
pub use stream::ResponseStream;
pub use structured::{TextConfig, TextFormat};

pub use assembler::{ResponseAssembler, ToolCallAccumulator};
pub use sse::{SseFrame, SseFrameBuffer};
