use crate::domain::conversation::ConversationTurn;

pub const ANSWERS_HEADER: &str = "--- User's Answers to Previous Questions ---";

/// Builds the per-turn prompt. Unanswered prior questions are left out.
pub fn compose_prompt(turn: &ConversationTurn) -> String {
    let mut prompt = format!(
        "User Story: {}\n\nContext/Brain Dump:\n{}",
        turn.user_story, turn.context
    );

    let answers = turn
        .answered()
        .map(|(question, answer)| format!("\n\nQuestion: {question}\nAnswer: {answer}"))
        .collect::<String>();

    if !answers.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(ANSWERS_HEADER);
        prompt.push_str(&answers);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    fn turn(story: &str, context: &str) -> ConversationTurn {
        ConversationTurn {
            user_story: story.to_string(),
            context: context.to_string(),
            ..ConversationTurn::default()
        }
    }

    #[test]
    fn first_turn_prompt_is_exact() {
        let prompt = compose_prompt(&turn("As a user, I want password reset", ""));
        assert_eq!(
            prompt,
            "User Story: As a user, I want password reset\n\nContext/Brain Dump:\n"
        );
    }

    #[test]
    fn appends_only_answered_questions() {
        let mut current = turn("story", "ctx");
        current.prior_questions = vec![
            "Which channels?".to_string(),
            "Expiry?".to_string(),
            "Rate limits?".to_string(),
        ];
        current.answers = BTreeMap::from([(0, "Email".to_string()), (1, String::new())]);

        assert_eq!(
            compose_prompt(&current),
            "User Story: story\n\nContext/Brain Dump:\nctx\n\n\
             --- User's Answers to Previous Questions ---\n\n\
             Question: Which channels?\nAnswer: Email"
        );
    }

    #[test]
    fn all_empty_answers_match_fresh_prompt() {
        let mut current = turn("story", "ctx");
        current.prior_questions = vec!["Q1?".to_string(), "Q2?".to_string()];
        current.answers = BTreeMap::from([(0, String::new())]);

        assert_eq!(compose_prompt(&current), compose_prompt(&turn("story", "ctx")));
    }

    proptest! {
        #[test]
        fn embeds_story_and_context_verbatim(story in ".*", context in ".*") {
            let prompt = compose_prompt(&turn(&story, &context));
            let expected_prefix = format!("User Story: {story}\n\nContext/Brain Dump:\n{context}");
            prop_assert_eq!(prompt, expected_prefix);
        }

        #[test]
        fn only_non_empty_answers_appear(
            answers in proptest::collection::vec(proptest::option::of("[a-z]{0,6}"), 1..6)
        ) {
            let mut current = turn("story", "ctx");
            current.prior_questions = (0..answers.len()).map(|i| format!("<q{i}>")).collect();
            current.answers = answers
                .iter()
                .enumerate()
                .filter_map(|(i, answer)| answer.clone().map(|a| (i, a)))
                .collect();

            let prompt = compose_prompt(&current);
            for (i, answer) in answers.iter().enumerate() {
                let answered = answer.as_deref().is_some_and(|a| !a.is_empty());
                prop_assert_eq!(prompt.contains(&format!("<q{i}>")), answered);
            }
            let any_answered = answers.iter().flatten().any(|a| !a.is_empty());
            prop_assert_eq!(prompt.contains(ANSWERS_HEADER), any_answered);
        }
    }
}
