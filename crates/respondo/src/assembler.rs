// Incremental assembly of stream events into a Response
//
// Deltas are folded strictly in arrival order. The terminal event's
// id/status/usage are adopted verbatim; the output array is the one built
// here from deltas (the server's own copy is used only when nothing was
// assembled, e.g. a consumer that never polled between created and
// completed).

use std::collections::BTreeMap;

use crate::event::StreamEvent;
use crate::response::{Annotation, ContentPart, OutputItem, Response, SummaryPart};

/// Buffered state for one in-flight function call
#[derive(Debug, Clone, Default)]
struct ToolCallBuffer {
    id: String,
    call_id: String,
    name: String,
    arguments: String,
    status: Option<String>,
}

/// Accumulates interleaved function-call argument fragments
///
/// Parallel tool calls stream their fragments interleaved; each call is
/// keyed by its `output_index` and assembled independently.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, ToolCallBuffer>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record identity for the call at `output_index` (from output_item.added)
    pub fn start(&mut self, output_index: u32, id: &str, call_id: &str, name: &str) {
        let buffer = self
            .calls
            .entry(output_index)
            .or_insert_with(ToolCallBuffer::default);
        buffer.id = id.to_string();
        buffer.call_id = call_id.to_string();
        buffer.name = name.to_string();
    }

    /// Append an arguments fragment for the call at `output_index`
    pub fn push(&mut self, output_index: u32, fragment: &str) {
        self.calls
            .entry(output_index)
            .or_insert_with(ToolCallBuffer::default)
            .arguments
            .push_str(fragment);
    }

    /// Adopt the server's final form for the call at `output_index`
    ///
    /// An empty argument string never overwrites fragments already
    /// accumulated.
    pub fn complete(
        &mut self,
        output_index: u32,
        id: &str,
        call_id: &str,
        name: &str,
        arguments: &str,
        status: Option<&str>,
    ) {
        let buffer = self
            .calls
            .entry(output_index)
            .or_insert_with(ToolCallBuffer::default);
        buffer.id = id.to_string();
        buffer.call_id = call_id.to_string();
        buffer.name = name.to_string();
        buffer.status = status.map(str::to_string);
        if !arguments.is_empty() {
            buffer.arguments = arguments.to_string();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// One finished item per call, in index order
    pub fn finish(self) -> Vec<(u32, OutputItem)> {
        self.calls
            .into_iter()
            .map(|(index, call)| {
                (
                    index,
                    OutputItem::FunctionCall {
                        id: call.id,
                        call_id: call.call_id,
                        name: call.name,
                        arguments: call.arguments,
                        status: call.status,
                    },
                )
            })
            .collect()
    }
}

/// Folds normalized events into a running Response
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    response: Response,
    tool_calls: ToolCallAccumulator,
    terminal: Option<Response>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the running response
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Created { response } => {
                self.response = response.clone();
            }

            StreamEvent::ItemAdded { output_index, item } => {
                if let OutputItem::FunctionCall {
                    id, call_id, name, ..
                } = item
                {
                    self.tool_calls.start(*output_index, id, call_id, name);
                }
                *self.item_mut(*output_index) = item.clone();
            }

            StreamEvent::ItemDone { output_index, item } => {
                if let OutputItem::FunctionCall {
                    id,
                    call_id,
                    name,
                    arguments,
                    status,
                } = item
                {
                    self.tool_calls.complete(
                        *output_index,
                        id,
                        call_id,
                        name,
                        arguments,
                        status.as_deref(),
                    );
                }
                *self.item_mut(*output_index) = item.clone();
            }

            StreamEvent::TextDelta {
                output_index,
                content_index,
                delta,
            } => {
                self.append_text(*output_index, *content_index, delta);
            }

            StreamEvent::AnnotationAdded {
                output_index,
                content_index,
                annotation,
            } => {
                self.attach_annotation(*output_index, *content_index, annotation.clone());
            }

            StreamEvent::ReasoningDelta {
                output_index,
                summary_index,
                delta,
            } => {
                self.append_summary(*output_index, *summary_index, delta);
            }

            StreamEvent::FunctionCallDelta {
                output_index,
                delta,
            } => {
                self.tool_calls.push(*output_index, delta);
            }

            StreamEvent::Completed { response } => {
                self.terminal = Some(response.clone());
            }

            // Surfaced as an error by the stream; nothing to fold
            StreamEvent::Failed { .. } => {}
        }
    }

    /// Whether a terminal event has been applied
    pub fn is_complete(&self) -> bool {
        self.terminal.is_some()
    }

    /// The finalized response, or None if no terminal event arrived
    ///
    /// id, status, usage and timings come verbatim from the terminal
    /// payload; the output array is the assembled one.
    pub fn finish(self) -> Option<Response> {
        let terminal = self.terminal?;

        let mut output = self.response.output;
        for (index, mut item) in self.tool_calls.finish() {
            let index = index as usize;
            while output.len() <= index {
                output.push(OutputItem::Unknown);
            }
            // output_item.done already put the server's status there
            if let (
                OutputItem::FunctionCall { status, .. },
                OutputItem::FunctionCall {
                    status: existing, ..
                },
            ) = (&mut item, &output[index])
            {
                if status.is_none() {
                    *status = existing.clone();
                }
            }
            output[index] = item;
        }

        let mut response = terminal;
        if !output.is_empty() {
            response.output = output;
        }
        Some(response)
    }

    fn item_mut(&mut self, index: u32) -> &mut OutputItem {
        let index = index as usize;
        while self.response.output.len() <= index {
            self.response.output.push(OutputItem::Unknown);
        }
        &mut self.response.output[index]
    }

    fn append_text(&mut self, output_index: u32, content_index: u32, delta: &str) {
        let item = self.item_mut(output_index);
        if !matches!(item, OutputItem::Message { .. }) {
            *item = empty_message();
        }
        if let OutputItem::Message { content, .. } = item {
            let part = part_mut(content, content_index);
            if let ContentPart::OutputText { text, .. } = part {
                text.push_str(delta);
            }
        }
    }

    fn attach_annotation(&mut self, output_index: u32, content_index: u32, annotation: Annotation) {
        let item = self.item_mut(output_index);
        if !matches!(item, OutputItem::Message { .. }) {
            *item = empty_message();
        }
        if let OutputItem::Message { content, .. } = item {
            let part = part_mut(content, content_index);
            if let ContentPart::OutputText { annotations, .. } = part {
                annotations.push(annotation);
            }
        }
    }

    fn append_summary(&mut self, output_index: u32, summary_index: u32, delta: &str) {
        let item = self.item_mut(output_index);
        if !matches!(item, OutputItem::Reasoning { .. }) {
            *item = OutputItem::Reasoning {
                id: String::new(),
                summary: Vec::new(),
            };
        }
        if let OutputItem::Reasoning { summary, .. } = item {
            let index = summary_index as usize;
            while summary.len() <= index {
                summary.push(SummaryPart::SummaryText {
                    text: String::new(),
                });
            }
            if let SummaryPart::SummaryText { text } = &mut summary[index] {
                text.push_str(delta);
            }
        }
    }
}

fn empty_message() -> OutputItem {
    OutputItem::Message {
        id: String::new(),
        status: None,
        role: "assistant".to_string(),
        content: Vec::new(),
    }
}

/// Content part at `index`, created empty if the wire never introduced it
fn part_mut(content: &mut Vec<ContentPart>, index: u32) -> &mut ContentPart {
    let index = index as usize;
    while content.len() <= index {
        content.push(ContentPart::OutputText {
            text: String::new(),
            annotations: Vec::new(),
        });
    }
    let part = &mut content[index];
    if !matches!(part, ContentPart::OutputText { .. }) {
        *part = ContentPart::OutputText {
            text: String::new(),
            annotations: Vec::new(),
        };
    }
    part
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ResponseStatus, Usage};

    fn terminal_response(usage: Option<Usage>) -> Response {
        Response {
            id: "resp_1".to_string(),
            status: ResponseStatus::Completed,
            usage,
            ..Default::default()
        }
    }

    fn text_delta(output_index: u32, delta: &str) -> StreamEvent {
        StreamEvent::TextDelta {
            output_index,
            content_index: 0,
            delta: delta.to_string(),
        }
    }

    #[test]
    fn test_text_deltas_fold_in_arrival_order() {
        let mut assembler = ResponseAssembler::new();

        assembler.apply(&text_delta(0, "Hel"));
        assembler.apply(&text_delta(0, "lo "));
        assembler.apply(&text_delta(0, "there."));
        assembler.apply(&StreamEvent::Completed {
            response: terminal_response(None),
        });

        let response = assembler.finish().unwrap();
        assert_eq!(response.output_text(), "Hello there.");
        assert_eq!(response.id, "resp_1");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_usage_adopted_verbatim_from_terminal() {
        let usage = Usage {
            input_tokens: 100,
            output_tokens: 20,
            total_tokens: 120,
            input_tokens_details: None,
            output_tokens_details: None,
        };

        let mut assembler = ResponseAssembler::new();
        assembler.apply(&text_delta(0, "hi"));
        assembler.apply(&StreamEvent::Completed {
            response: terminal_response(Some(usage.clone())),
        });

        let response = assembler.finish().unwrap();
        assert_eq!(response.usage, Some(usage));
    }

    #[test]
    fn test_interleaved_tool_call_deltas_assemble_per_index() {
        let mut assembler = ResponseAssembler::new();

        assembler.apply(&StreamEvent::ItemAdded {
            output_index: 0,
            item: OutputItem::FunctionCall {
                id: "fc_0".to_string(),
                call_id: "call_0".to_string(),
                name: "get_weather".to_string(),
                arguments: String::new(),
                status: None,
            },
        });
        assembler.apply(&StreamEvent::ItemAdded {
            output_index: 1,
            item: OutputItem::FunctionCall {
                id: "fc_1".to_string(),
                call_id: "call_1".to_string(),
                name: "get_time".to_string(),
                arguments: String::new(),
                status: None,
            },
        });

        // Fragments arrive interleaved: 0, 1, 0, 1
        assembler.apply(&StreamEvent::FunctionCallDelta {
            output_index: 0,
            delta: "{\"city\":".to_string(),
        });
        assembler.apply(&StreamEvent::FunctionCallDelta {
            output_index: 1,
            delta: "{\"zone\":".to_string(),
        });
        assembler.apply(&StreamEvent::FunctionCallDelta {
            output_index: 0,
            delta: "\"Lisbon\"}".to_string(),
        });
        assembler.apply(&StreamEvent::FunctionCallDelta {
            output_index: 1,
            delta: "\"UTC\"}".to_string(),
        });

        assembler.apply(&StreamEvent::Completed {
            response: terminal_response(None),
        });

        let response = assembler.finish().unwrap();
        let calls = response.function_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].arguments, "{\"city\":\"Lisbon\"}");
        assert_eq!(calls[1].name, "get_time");
        assert_eq!(calls[1].arguments, "{\"zone\":\"UTC\"}");
    }

    #[test]
    fn test_delta_for_unknown_index_creates_item_lazily() {
        let mut assembler = ResponseAssembler::new();

        // No output_item.added was ever seen for index 2
        assembler.apply(&StreamEvent::TextDelta {
            output_index: 2,
            content_index: 0,
            delta: "late".to_string(),
        });
        assembler.apply(&StreamEvent::Completed {
            response: terminal_response(None),
        });

        let response = assembler.finish().unwrap();
        assert_eq!(response.output.len(), 3);
        assert!(matches!(response.output[0], OutputItem::Unknown));
        assert_eq!(response.output_text(), "late");
    }

    #[test]
    fn test_item_done_replaces_assembled_item() {
        let mut assembler = ResponseAssembler::new();

        assembler.apply(&text_delta(0, "partial"));
        assembler.apply(&StreamEvent::ItemDone {
            output_index: 0,
            item: OutputItem::Message {
                id: "msg_1".to_string(),
                status: Some("completed".to_string()),
                role: "assistant".to_string(),
                content: vec![ContentPart::OutputText {
                    text: "partial plus the rest".to_string(),
                    annotations: Vec::new(),
                }],
            },
        });
        assembler.apply(&StreamEvent::Completed {
            response: terminal_response(None),
        });

        let response = assembler.finish().unwrap();
        assert_eq!(response.output_text(), "partial plus the rest");
    }

    #[test]
    fn test_reasoning_deltas_fold_into_summary() {
        let mut assembler = ResponseAssembler::new();

        assembler.apply(&StreamEvent::ReasoningDelta {
            output_index: 0,
            summary_index: 0,
            delta: "Consider ".to_string(),
        });
        assembler.apply(&StreamEvent::ReasoningDelta {
            output_index: 0,
            summary_index: 0,
            delta: "the basics.".to_string(),
        });
        assembler.apply(&StreamEvent::Completed {
            response: terminal_response(None),
        });

        let response = assembler.finish().unwrap();
        assert_eq!(response.reasoning_text().as_deref(), Some("Consider the basics."));
    }

    #[test]
    fn test_annotation_attaches_to_part() {
        let mut assembler = ResponseAssembler::new();

        assembler.apply(&text_delta(0, "According to example.com"));
        assembler.apply(&StreamEvent::AnnotationAdded {
            output_index: 0,
            content_index: 0,
            annotation: Annotation::UrlCitation {
                url: "https://example.com".to_string(),
                title: Some("Example".to_string()),
                start_index: Some(13),
                end_index: Some(24),
            },
        });
        assembler.apply(&StreamEvent::Completed {
            response: terminal_response(None),
        });

        let response = assembler.finish().unwrap();
        assert_eq!(response.citations().len(), 1);
    }

    #[test]
    fn test_finish_without_terminal_is_none() {
        let mut assembler = ResponseAssembler::new();
        assembler.apply(&text_delta(0, "unterminated"));

        assert!(!assembler.is_complete());
        assert!(assembler.finish().is_none());
    }

    #[test]
    fn test_terminal_output_used_when_nothing_assembled() {
        let mut assembler = ResponseAssembler::new();

        let mut terminal = terminal_response(None);
        terminal.output = vec![OutputItem::Message {
            id: "msg_1".to_string(),
            status: Some("completed".to_string()),
            role: "assistant".to_string(),
            content: vec![ContentPart::OutputText {
                text: "full text".to_string(),
                annotations: Vec::new(),
            }],
        }];

        assembler.apply(&StreamEvent::Completed { response: terminal });

        let response = assembler.finish().unwrap();
        assert_eq!(response.output_text(), "full text");
    }
}
