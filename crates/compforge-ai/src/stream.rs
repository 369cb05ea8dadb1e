use crate::content::GenerationResult;

/// Events produced by the stream relay for one generation call.
///
/// A relay emits zero or more `Delta` events followed by exactly one terminal
/// `Done` or `Error` event. Nothing follows the terminal event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text fragment, forwarded as soon as it arrives.
    Delta(String),
    /// Terminal success event carrying the normalized full response.
    Done(GenerationResult),
    /// Terminal failure event with a caller-safe reason.
    Error(String),
}

impl StreamEvent {
    /// Returns true for `Done` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Error(_))
    }

    /// JSON payload of the downstream `data:` frame for this event.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::Delta(content) => serde_json::json!({ "content": content }),
            Self::Done(result) => serde_json::json!({
                "jsxCode": result.jsx_code,
                "cssCode": result.css_code,
                "done": true,
            }),
            Self::Error(reason) => serde_json::json!({ "error": reason }),
        }
    }

    /// Full `text/event-stream` frame, including the blank-line terminator.
    pub fn to_sse_frame(&self) -> String {
        format!("data: {}\n\n", self.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_match_downstream_contract() {
        assert_eq!(
            StreamEvent::Delta("He".into()).to_sse_frame(),
            "data: {\"content\":\"He\"}\n\n"
        );

        let done = StreamEvent::Done(GenerationResult::new("<a/>", "")).payload();
        assert_eq!(done["jsxCode"], "<a/>");
        assert_eq!(done["cssCode"], "");
        assert_eq!(done["done"], true);

        let error = StreamEvent::Error(crate::GENERIC_FAILURE.into()).payload();
        assert_eq!(error, serde_json::json!({"error": "Failed to generate component"}));
    }

    #[test]
    fn only_done_and_error_are_terminal() {
        assert!(!StreamEvent::Delta(String::new()).is_terminal());
        assert!(StreamEvent::Done(GenerationResult::default()).is_terminal());
        assert!(StreamEvent::Error("x".into()).is_terminal());
    }
}
