/// Speaker of a caller-supplied history message.
///
/// History never carries a `system` role; the system prompt is owned by the
/// generation service and prepended to every request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One prior turn of the conversation, in chronological order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Input of a single generation call.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

impl GenerationRequest {
    /// Creates a request without history.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    /// Replaces the conversation history.
    pub fn history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }
}

/// Generated component source.
///
/// Both fields are always present; an empty string is a valid (degenerate)
/// value. Failures are reported as errors, never as an empty result.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub jsx_code: String,
    pub css_code: String,
}

impl GenerationResult {
    pub fn new(jsx_code: impl Into<String>, css_code: impl Into<String>) -> Self {
        Self {
            jsx_code: jsx_code.into(),
            css_code: css_code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_rejects_system_role() {
        let parsed: Result<HistoryMessage, _> =
            serde_json::from_value(serde_json::json!({"role": "system", "content": "x"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn result_uses_camel_case_on_the_wire() {
        let value = serde_json::to_value(GenerationResult::new("<div/>", ".a{}")).expect("json");
        assert_eq!(value, serde_json::json!({"jsxCode": "<div/>", "cssCode": ".a{}"}));
    }
}
