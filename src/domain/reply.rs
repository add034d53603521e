use serde::{Deserialize, Deserializer, Serialize};

/// Structured answer of the model. Missing or `null` keys fall back to empty
/// values rather than failing the turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticket_draft: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clarifying_questions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub open_questions: Vec<String>,
}

impl AssistantReply {
    pub fn is_converged(&self) -> bool {
        self.clarifying_questions.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
