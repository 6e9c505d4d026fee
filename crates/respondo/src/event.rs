// Normalized streaming events
//
// The wire multiplexes many `response.*` event types over one SSE stream.
// Everything downstream works against the small union below; wire types
// with no variant here are skipped, so new server-side event types never
// break consumers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::response::{Annotation, OutputItem, Response};
use crate::sse::SseFrame;

/// One normalized event from a response stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// First event of a stream; carries the response skeleton
    Created { response: Response },

    /// A new item appeared in the output array
    ItemAdded { output_index: u32, item: OutputItem },

    /// The item at `output_index` reached its final form
    ItemDone { output_index: u32, item: OutputItem },

    /// Incremental text for a message content part
    TextDelta {
        output_index: u32,
        content_index: u32,
        delta: String,
    },

    /// A citation attached to a content part
    AnnotationAdded {
        output_index: u32,
        content_index: u32,
        annotation: Annotation,
    },

    /// Incremental reasoning summary text
    ReasoningDelta {
        output_index: u32,
        summary_index: u32,
        delta: String,
    },

    /// An arguments fragment for the function call at `output_index`
    FunctionCallDelta { output_index: u32, delta: String },

    /// Terminal: the finished response (status may be `incomplete`)
    Completed { response: Response },

    /// Terminal: the request failed server-side
    Failed {
        code: Option<String>,
        message: String,
    },
}

#[derive(Deserialize)]
struct ResponsePayload {
    response: Response,
}

#[derive(Deserialize)]
struct ItemPayload {
    output_index: u32,
    item: OutputItem,
}

#[derive(Deserialize)]
struct TextDeltaPayload {
    output_index: u32,
    #[serde(default)]
    content_index: u32,
    delta: String,
}

#[derive(Deserialize)]
struct AnnotationPayload {
    output_index: u32,
    #[serde(default)]
    content_index: u32,
    annotation: Annotation,
}

#[derive(Deserialize)]
struct SummaryDeltaPayload {
    output_index: u32,
    #[serde(default)]
    summary_index: u32,
    delta: String,
}

#[derive(Deserialize)]
struct ArgumentsDeltaPayload {
    output_index: u32,
    delta: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl StreamEvent {
    /// Map one wire frame to a normalized event
    ///
    /// Returns None for event types this crate does not surface and for
    /// frames whose payload cannot be decoded; neither ends the stream.
    pub fn from_frame(frame: &SseFrame) -> Option<StreamEvent> {
        let data: Value = match serde_json::from_str(&frame.data) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "skipping SSE frame with undecodable data");
                return None;
            }
        };

        // "message" is the SSE default when no event field was sent; the
        // payload carries the same type string either way.
        let kind = match frame.event.as_deref() {
            Some(event) if !event.is_empty() && event != "message" => event.to_string(),
            _ => match data.get("type").and_then(Value::as_str) {
                Some(kind) => kind.to_string(),
                None => {
                    debug!("skipping SSE frame with no event type");
                    return None;
                }
            },
        };

        match kind.as_str() {
            "response.created" => parse_payload::<ResponsePayload>(&kind, data)
                .map(|p| StreamEvent::Created { response: p.response }),

            "response.output_item.added" => {
                parse_payload::<ItemPayload>(&kind, data).map(|p| StreamEvent::ItemAdded {
                    output_index: p.output_index,
                    item: p.item,
                })
            }

            "response.output_item.done" => {
                parse_payload::<ItemPayload>(&kind, data).map(|p| StreamEvent::ItemDone {
                    output_index: p.output_index,
                    item: p.item,
                })
            }

            "response.output_text.delta" => {
                parse_payload::<TextDeltaPayload>(&kind, data).map(|p| StreamEvent::TextDelta {
                    output_index: p.output_index,
                    content_index: p.content_index,
                    delta: p.delta,
                })
            }

            "response.output_text.annotation.added" => parse_payload::<AnnotationPayload>(&kind, data)
                .map(|p| StreamEvent::AnnotationAdded {
                    output_index: p.output_index,
                    content_index: p.content_index,
                    annotation: p.annotation,
                }),

            "response.reasoning_summary_text.delta" => parse_payload::<SummaryDeltaPayload>(&kind, data)
                .map(|p| StreamEvent::ReasoningDelta {
                    output_index: p.output_index,
                    summary_index: p.summary_index,
                    delta: p.delta,
                }),

            "response.function_call_arguments.delta" => parse_payload::<ArgumentsDeltaPayload>(&kind, data)
                .map(|p| StreamEvent::FunctionCallDelta {
                    output_index: p.output_index,
                    delta: p.delta,
                }),

            "response.completed" | "response.incomplete" => {
                parse_payload::<ResponsePayload>(&kind, data)
                    .map(|p| StreamEvent::Completed { response: p.response })
            }

            "response.failed" => parse_payload::<ResponsePayload>(&kind, data).map(|p| {
                let (code, message) = match p.response.error {
                    Some(error) => (error.code, error.message),
                    None => (None, "response failed".to_string()),
                };
                StreamEvent::Failed { code, message }
            }),

            "error" => parse_payload::<ErrorPayload>(&kind, data).map(|p| StreamEvent::Failed {
                code: p.code,
                message: p.message,
            }),

            _ => {
                debug!(event = %kind, "ignoring unhandled SSE event type");
                None
            }
        }
    }

    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Completed { .. } | StreamEvent::Failed { .. }
        )
    }
}

fn parse_payload<T: DeserializeOwned>(kind: &str, data: Value) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(event = %kind, error = %e, "skipping malformed event payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: Some(event.to_string()),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_created_event() {
        let event = StreamEvent::from_frame(&frame(
            "response.created",
            r#"{"type":"response.created","response":{"id":"resp_1","created_at":1,"status":"in_progress","output":[]}}"#,
        ))
        .unwrap();

        match event {
            StreamEvent::Created { response } => assert_eq!(response.id, "resp_1"),
            _ => panic!("Expected Created variant"),
        }
    }

    #[test]
    fn test_text_delta_event() {
        let event = StreamEvent::from_frame(&frame(
            "response.output_text.delta",
            r#"{"type":"response.output_text.delta","item_id":"msg_1","output_index":1,"content_index":0,"delta":"Hello"}"#,
        ))
        .unwrap();

        match event {
            StreamEvent::TextDelta {
                output_index,
                content_index,
                delta,
            } => {
                assert_eq!(output_index, 1);
                assert_eq!(content_index, 0);
                assert_eq!(delta, "Hello");
            }
            _ => panic!("Expected TextDelta variant"),
        }
    }

    #[test]
    fn test_function_call_arguments_delta() {
        let event = StreamEvent::from_frame(&frame(
            "response.function_call_arguments.delta",
            r#"{"type":"response.function_call_arguments.delta","output_index":0,"delta":"{\"city"}"#,
        ))
        .unwrap();

        match event {
            StreamEvent::FunctionCallDelta {
                output_index,
                delta,
            } => {
                assert_eq!(output_index, 0);
                assert_eq!(delta, "{\"city");
            }
            _ => panic!("Expected FunctionCallDelta variant"),
        }
    }

    #[test]
    fn test_unknown_event_type_is_skipped() {
        let event = StreamEvent::from_frame(&frame(
            "response.content_part.added",
            r#"{"type":"response.content_part.added","output_index":0}"#,
        ));
        assert!(event.is_none());
    }

    #[test]
    fn test_undecodable_data_is_skipped() {
        let event = StreamEvent::from_frame(&frame("response.output_text.delta", "{not json"));
        assert!(event.is_none());
    }

    #[test]
    fn test_known_type_with_wrong_shape_is_skipped() {
        // delta missing entirely
        let event = StreamEvent::from_frame(&frame(
            "response.output_text.delta",
            r#"{"type":"response.output_text.delta","output_index":0}"#,
        ));
        assert!(event.is_none());
    }

    #[test]
    fn test_event_field_fallback_to_payload_type() {
        let event = StreamEvent::from_frame(&SseFrame {
            event: None,
            data: r#"{"type":"response.output_text.delta","output_index":0,"content_index":0,"delta":"x"}"#
                .to_string(),
        })
        .unwrap();

        assert!(matches!(event, StreamEvent::TextDelta { .. }));
    }

    #[test]
    fn test_incomplete_maps_to_completed_with_status() {
        let event = StreamEvent::from_frame(&frame(
            "response.incomplete",
            r#"{"type":"response.incomplete","response":{"id":"resp_1","created_at":1,"status":"incomplete","output":[],"incomplete_details":{"reason":"max_output_tokens"}}}"#,
        ))
        .unwrap();

        assert!(event.is_terminal());
        match event {
            StreamEvent::Completed { response } => {
                assert_eq!(response.status, crate::response::ResponseStatus::Incomplete);
                assert_eq!(
                    response.incomplete_details.unwrap().reason.as_deref(),
                    Some("max_output_tokens")
                );
            }
            _ => panic!("Expected Completed variant"),
        }
    }

    #[test]
    fn test_error_event_maps_to_failed() {
        let event = StreamEvent::from_frame(&frame(
            "error",
            r#"{"type":"error","code":"rate_limit_exceeded","message":"Slow down","param":null,"sequence_number":4}"#,
        ))
        .unwrap();

        match event {
            StreamEvent::Failed { code, message } => {
                assert_eq!(code.as_deref(), Some("rate_limit_exceeded"));
                assert_eq!(message, "Slow down");
            }
            _ => panic!("Expected Failed variant"),
        }
        assert!(StreamEvent::from_frame(&frame(
            "error",
            r#"{"type":"error","message":"Slow down"}"#
        ))
        .unwrap()
        .is_terminal());
    }

    #[test]
    fn test_failed_event_extracts_error_details() {
        let event = StreamEvent::from_frame(&frame(
            "response.failed",
            r#"{"type":"response.failed","response":{"id":"resp_1","created_at":1,"status":"failed","output":[],"error":{"code":"server_error","message":"boom"}}}"#,
        ))
        .unwrap();

        match event {
            StreamEvent::Failed { code, message } => {
                assert_eq!(code.as_deref(), Some("server_error"));
                assert_eq!(message, "boom");
            }
            _ => panic!("Expected Failed variant"),
        }
    }
}
