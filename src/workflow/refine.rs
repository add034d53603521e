use tracing::{info, warn};

use crate::context::AppContext;
use crate::domain::conversation::{ConversationState, FormFields, reconstruct};
use crate::domain::reply::AssistantReply;
use crate::error::AppError;
use crate::workflow::interpret::interpret;
use crate::workflow::prompt::compose_prompt;

#[derive(Debug)]
pub enum TurnOutcome {
    AwaitingAnswers(AssistantReply),
    Converged(AssistantReply),
    Failed(AppError),
}

impl TurnOutcome {
    pub fn from_reply(reply: AssistantReply) -> Self {
        if reply.is_converged() {
            TurnOutcome::Converged(reply)
        } else {
            TurnOutcome::AwaitingAnswers(reply)
        }
    }

    pub fn state(&self) -> ConversationState {
        match self {
            TurnOutcome::AwaitingAnswers(_) => ConversationState::AwaitingAnswers,
            TurnOutcome::Converged(_) => ConversationState::Converged,
            TurnOutcome::Failed(_) => ConversationState::Failed,
        }
    }

    pub fn reply(&self) -> Option<&AssistantReply> {
        match self {
            TurnOutcome::AwaitingAnswers(reply) | TurnOutcome::Converged(reply) => Some(reply),
            TurnOutcome::Failed(_) => None,
        }
    }
}

/// Handles one form submission end to end. The model capability is checked
/// before the form is read, so an unconfigured process fails the same way for
/// every submission.
pub async fn submit(ctx: &AppContext, fields: &FormFields) -> TurnOutcome {
    if let Err(err) = ctx.language_model.service() {
        warn!(error = %err, "refusing submission");
        return TurnOutcome::Failed(err);
    }

    let turn = match reconstruct(fields) {
        Ok(turn) => turn,
        Err(err) => return TurnOutcome::Failed(err),
    };
    let entry = ConversationState::of_turn(&turn);
    let prompt = compose_prompt(&turn);

    let outcome = match interpret(&ctx.language_model, &prompt).await {
        Ok(reply) => TurnOutcome::from_reply(reply),
        Err(err) => TurnOutcome::Failed(err),
    };

    info!(
        model = %ctx.config.gemini_model,
        from = entry.as_str(),
        to = outcome.state().as_str(),
        prior_questions = turn.prior_questions.len(),
        "turn finished"
    );
    outcome
}
