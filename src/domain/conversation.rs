use std::collections::{BTreeMap, HashMap};

use crate::error::{AppError, AppResult};

pub const USER_STORY_FIELD: &str = "user_story";
pub const CONTEXT_FIELD: &str = "context";
pub const PREVIOUS_CONTEXT_FIELD: &str = "previous_context";

pub fn question_field(index: usize) -> String {
    format!("question_{index}")
}

pub fn answer_field(index: usize) -> String {
    format!("answer_{index}")
}

/// Raw field values of one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial(user_story: &str, context: &str) -> Self {
        let mut fields = Self::new();
        fields.set(USER_STORY_FIELD, user_story);
        fields.set(CONTEXT_FIELD, context);
        fields
    }

    /// Hidden fields carried into the next submission: the story, the context
    /// and every clarifying question under its index. Answers are left to the
    /// caller.
    pub fn for_next_turn(user_story: &str, context: &str, questions: &[String]) -> Self {
        let mut fields = Self::initial(user_story, context);
        fields.set(PREVIOUS_CONTEXT_FIELD, context);
        for (index, question) in questions.iter().enumerate() {
            fields.set(question_field(index), question);
        }
        fields
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationTurn {
    pub user_story: String,
    pub context: String,
    pub previous_context: Option<String>,
    pub prior_questions: Vec<String>,
    /// Sparse: a missing or empty entry means the question went unanswered.
    pub answers: BTreeMap<usize, String>,
}

impl ConversationTurn {
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers
            .get(&index)
            .map(String::as_str)
            .filter(|answer| !answer.is_empty())
    }

    /// Prior questions paired with their non-empty answers, in question order.
    pub fn answered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prior_questions
            .iter()
            .enumerate()
            .filter_map(|(index, question)| {
                self.answer(index).map(|answer| (question.as_str(), answer))
            })
    }
}

/// Rebuilds a turn from submitted fields. Questions are scanned from index 0
/// until the first missing `question_<i>`.
pub fn reconstruct(fields: &FormFields) -> AppResult<ConversationTurn> {
    let user_story = fields
        .get(USER_STORY_FIELD)
        .ok_or_else(|| AppError::InvalidForm("missing required field user_story".to_string()))?
        .to_string();
    let context = fields.get(CONTEXT_FIELD).unwrap_or_default().to_string();
    let previous_context = fields.get(PREVIOUS_CONTEXT_FIELD).map(str::to_string);

    let mut prior_questions = Vec::new();
    let mut answers = BTreeMap::new();
    while let Some(question) = fields.get(&question_field(prior_questions.len())) {
        let index = prior_questions.len();
        if let Some(answer) = fields.get(&answer_field(index)) {
            answers.insert(index, answer.to_string());
        }
        prior_questions.push(question.to_string());
    }

    Ok(ConversationTurn {
        user_story,
        context,
        previous_context,
        prior_questions,
        answers,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Drafting,
    AwaitingAnswers,
    Converged,
    Failed,
}

impl ConversationState {
    /// State a submission arrives in. Only the presence of prior questions
    /// matters; an edited resubmission after convergence drafts afresh.
    pub fn of_turn(turn: &ConversationTurn) -> Self {
        if turn.prior_questions.is_empty() {
            ConversationState::Drafting
        } else {
            ConversationState::AwaitingAnswers
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Drafting => "drafting",
            ConversationState::AwaitingAnswers => "awaiting_answers",
            ConversationState::Converged => "converged",
            ConversationState::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_indexed_questions_and_answers() {
        let fields: FormFields = [
            ("user_story", "As a user, I want password reset"),
            ("context", "Email only"),
            ("previous_context", "Email only"),
            ("question_0", "Which channels?"),
            ("answer_0", "Email"),
            ("question_1", "Expiry?"),
            ("answer_1", ""),
            ("question_2", "Rate limits?"),
        ]
        .into_iter()
        .collect();

        let turn = reconstruct(&fields).unwrap();
        assert_eq!(turn.user_story, "As a user, I want password reset");
        assert_eq!(turn.context, "Email only");
        assert_eq!(turn.previous_context.as_deref(), Some("Email only"));
        assert_eq!(
            turn.prior_questions,
            vec!["Which channels?", "Expiry?", "Rate limits?"]
        );
        assert_eq!(turn.answer(0), Some("Email"));
        assert_eq!(turn.answer(1), None);
        assert_eq!(turn.answer(2), None);
        assert_eq!(
            turn.answered().collect::<Vec<_>>(),
            vec![("Which channels?", "Email")]
        );
    }

    #[test]
    fn stops_scanning_at_first_gap() {
        let fields: FormFields = [
            ("user_story", "story"),
            ("question_0", "first"),
            ("question_2", "orphan"),
            ("answer_2", "ignored"),
        ]
        .into_iter()
        .collect();

        let turn = reconstruct(&fields).unwrap();
        assert_eq!(turn.prior_questions, vec!["first"]);
        assert!(turn.answers.is_empty());
    }

    #[test]
    fn context_defaults_to_empty() {
        let fields: FormFields = [("user_story", "story")].into_iter().collect();
        let turn = reconstruct(&fields).unwrap();
        assert_eq!(turn.context, "");
        assert_eq!(turn.previous_context, None);
    }

    #[test]
    fn requires_user_story() {
        let fields: FormFields = [("context", "only context")].into_iter().collect();
        assert!(matches!(
            reconstruct(&fields),
            Err(AppError::InvalidForm(_))
        ));
    }

    #[test]
    fn next_turn_fields_carry_questions() {
        let questions = vec!["Q1?".to_string(), "Q2?".to_string()];
        let fields = FormFields::for_next_turn("story", "ctx", &questions);

        assert_eq!(fields.get("previous_context"), Some("ctx"));
        assert_eq!(fields.get("question_1"), Some("Q2?"));
        assert_eq!(fields.get("answer_0"), None);

        let turn = reconstruct(&fields).unwrap();
        assert_eq!(turn.prior_questions, questions);
        assert_eq!(ConversationState::of_turn(&turn), ConversationState::AwaitingAnswers);
    }

    #[test]
    fn first_submission_is_drafting() {
        let turn = reconstruct(&FormFields::initial("story", "")).unwrap();
        assert_eq!(ConversationState::of_turn(&turn), ConversationState::Drafting);
    }
}
