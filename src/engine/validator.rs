//! Pure answer-acceptance predicate.
//!
//! Validation only steers the dialogue (clarify once, then accept anyway);
//! it never gates storage — the engine records every submission first.

use crate::models::Question;

/// Check a free-text answer against a question's acceptance criteria.
///
/// Blank answers fail. A question with no expected options accepts any
/// non-blank answer. Otherwise the match is symmetric case-insensitive
/// containment: the answer contains an option, or an option contains the
/// whole answer (so a terse "yes" passes against "yes, sometimes").
pub fn validate(answer: &str, question: &Question) -> bool {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return false;
    }
    if question.expected_options.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    question.expected_options.iter().any(|option| {
        let option = option.to_lowercase();
        lower.contains(&option) || option.contains(&lower)
    })
}
