use crate::content::HistoryMessage;
use crate::upstream::ChatMessage;

/// System prompt prepended to every generation request.
pub const SYSTEM_PROMPT: &str = r#"You are an expert React component generator. Create modern, clean React components written in TypeScript and styled with Tailwind CSS.

Rules:
1. Always return valid JSX/TSX code.
2. Style with Tailwind CSS utility classes.
3. Include proper TypeScript types.
4. Make components responsive and accessible.
5. Use modern React patterns (function components and hooks).
6. Return only component code; do not put explanations in the code.
7. Answer with a JSON object containing `jsxCode` and `cssCode` string fields.

Example response:
{
  "jsxCode": "import React from 'react';\n\nexport default function Component() {\n  return <div className=\"p-4\">...</div>;\n}",
  "cssCode": "/* Additional CSS if needed */"
}"#;

/// Builds the prompt used by `modify`: the original source and the
/// modification request are embedded verbatim.
pub fn modify_prompt(original_code: &str, instruction: &str) -> String {
    format!(
        "Modify this React component based on the following request:\n\n\
         ORIGINAL COMPONENT:\n{original_code}\n\n\
         MODIFICATION REQUEST:\n{instruction}\n\n\
         Please return the modified component code. Keep the same structure but apply the requested changes."
    )
}

/// System prompt, then history in order, then the user prompt.
pub(crate) fn build_messages(prompt: &str, history: &[HistoryMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new("system", SYSTEM_PROMPT));
    messages.extend(
        history
            .iter()
            .map(|msg| ChatMessage::new(msg.role.as_str(), msg.content.clone())),
    );
    messages.push(ChatMessage::new("user", prompt));
    messages
}
