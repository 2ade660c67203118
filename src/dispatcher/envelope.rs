//! The uniform response returned for every tool call.

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::failure::{Failure, FailureKind};
use crate::worker::WorkerOutcome;

/// A typed block of response content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
        }
    }
}

/// `{content, isError}`. Built once per call and never mutated; success
/// and error content are never mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    content: Vec<ContentBlock>,
    is_error: bool,
}

impl ResponseEnvelope {
    /// One text block holding `value` pretty-printed, keys in the order the
    /// worker wrote them.
    pub fn success(value: &Value) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self {
                content: vec![ContentBlock::text(text)],
                is_error: false,
            },
            Err(e) => Self::failure(&Failure::new(
                FailureKind::Internal,
                format!("Failed to serialize worker result: {}", e),
            )),
        }
    }

    /// One text block `Error: <message>`.
    pub fn failure(failure: &Failure) -> Self {
        Self {
            content: vec![ContentBlock::text(format!("Error: {}", failure.message))],
            is_error: true,
        }
    }

    pub fn from_outcome(outcome: &WorkerOutcome) -> Self {
        match outcome {
            WorkerOutcome::Success(value) => Self::success(value),
            WorkerOutcome::Failure(failure) => Self::failure(failure),
        }
    }

    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Text of the first block, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.first().and_then(ContentBlock::as_text)
    }

    pub fn into_call_tool_result(self) -> CallToolResult {
        let content: Vec<Content> = self
            .content
            .into_iter()
            .map(|block| match block {
                ContentBlock::Text { text } => Content::text(text),
            })
            .collect();

        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

impl From<ResponseEnvelope> for CallToolResult {
    fn from(envelope: ResponseEnvelope) -> Self {
        envelope.into_call_tool_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_is_pretty_and_order_preserving() {
        let value: Value = serde_json::from_str(r#"{"zodiac": "Leo", "ascendant": 12.5}"#).unwrap();
        let envelope = ResponseEnvelope::success(&value);

        assert!(!envelope.is_error());
        assert_eq!(envelope.content().len(), 1);
        assert_eq!(
            envelope.text(),
            Some("{\n  \"zodiac\": \"Leo\",\n  \"ascendant\": 12.5\n}")
        );
    }

    #[test]
    fn test_failure_text() {
        let envelope =
            ResponseEnvelope::failure(&Failure::new(FailureKind::UnknownTool, "Unknown tool: x"));
        assert!(envelope.is_error());
        assert_eq!(envelope.text(), Some("Error: Unknown tool: x"));
    }

    #[test]
    fn test_wire_shape() {
        let envelope = ResponseEnvelope::success(&json!([1]));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "content": [{"type": "text", "text": "[\n  1\n]"}],
                "isError": false
            })
        );
    }

    #[test]
    fn test_into_call_tool_result() {
        let result = ResponseEnvelope::failure(&Failure::new(FailureKind::Timeout, "late"))
            .into_call_tool_result();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);

        let result = ResponseEnvelope::success(&json!({"ok": true})).into_call_tool_result();
        assert_eq!(result.is_error, Some(false));
    }
}
