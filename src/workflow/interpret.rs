use tracing::{debug, warn};

use crate::context::ModelCapability;
use crate::domain::reply::AssistantReply;
use crate::error::{AppError, AppResult};

/// Instruction set sent unchanged with every prompt.
pub const SYSTEM_PROMPT: &str = r#"You are a literal and precise AI assistant. Your sole function is to help a Product Owner structure their raw input into a Jira ticket.

Core Directives:
1. Strictly Adhere to Context: DO NOT assume, invent, or imagine any details, examples, possibilities, or edge cases not explicitly mentioned in the user's input. Your analysis must be a direct logical extension of the provided text only.
2. No Beautification: The output must be plain text. Do not use markdown for styling like bolding (`**`), headers (`##`), or quotes (`>`). The only required formatting is the section titles.
3. Be Concise: Do not use filler words or verbose explanations. Keep the output direct and of a reasonable length.
4. Handle Irrelevant Questions: If the user responds with "NA" or "irrelevant" to a question, acknowledge it and do not ask about that topic again.

Workflow:
1. On First Input: Receive the `User Story` and `Context`. Analyze ONLY this information to create a draft. Identify ambiguities WITHIN the provided text and formulate them as `clarifying_questions`.
2. On Subsequent Inputs: Receive the user's answers. Integrate the new, factual information into the ticket. Refine the draft. If new ambiguities arise from the answers, ask new questions. If the ticket is sufficiently detailed based on the given information, return an empty list for `clarifying_questions`.

Output Structure:
Your response MUST be a valid JSON object with three keys: "ticket_draft", "clarifying_questions", and "open_questions".

- `ticket_draft`: A plain text string containing ONLY the following sections: `User Story`, `Context`, `Acceptance Criteria`.
- `clarifying_questions`: A list of strings for the PO to answer.
- `open_questions`: A list of strings identifying topics for developers to explore, based ONLY on ambiguities in the context.

Example JSON Output:
{
  "ticket_draft": "User Story\nAs a user, I want to see detailed error messages.\n\nContext\nThe current system shows a generic 'Failed' message. We need to display specific errors from the backend.\n\nAcceptance Criteria\n- The system must display specific error messages from the backend instead of 'Failed'.",
  "clarifying_questions": [
    "What specific backend error messages should be displayed?",
    "Should there be a retry button for certain types of errors?"
  ],
  "open_questions": [
    "What are all the possible error categories we need to handle?",
    "How should the different errors be displayed in the UI (e.g., tooltip, table)?"
  ]
}
"#;

const FENCE: &str = "```";

/// Sends one composed prompt to the model and parses the structured reply.
/// Every failure comes back as an `AppError`; nothing panics past here.
pub async fn interpret(capability: &ModelCapability, prompt: &str) -> AppResult<AssistantReply> {
    let model = capability.service()?;

    let raw = model.generate(SYSTEM_PROMPT, prompt).await?;
    debug!(raw_len = raw.len(), "model replied");

    parse_reply(&raw)
}

/// Removes a surrounding Markdown code fence (with optional language tag).
/// Unfenced text only loses its outer whitespace.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(FENCE) {
        // The info string runs to the end of the fence line; a one-line fence
        // only has an alphanumeric tag glued to the body.
        text = match rest.split_once('\n') {
            Some((info, body)) if !info.contains(['{', '[']) => body,
            _ => {
                let tag_len = rest
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(rest.len());
                &rest[tag_len..]
            }
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

pub fn parse_reply(raw: &str) -> AppResult<AssistantReply> {
    serde_json::from_str::<AssistantReply>(strip_code_fences(raw)).map_err(|err| {
        warn!(error = %err, "model reply was not the expected JSON");
        AppError::ModelInteraction(format!("model reply is not valid JSON: {err}"))
    })
}
