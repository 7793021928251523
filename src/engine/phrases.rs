//! Fixed phrase tables for interpreting patient input.
//!
//! All matching is case-insensitive substring matching on the trimmed input;
//! callers normalise before calling. Control phrases are checked before any
//! other interpretation of the input.

/// Phrases meaning "take me back to the previous question".
const GO_BACK_PHRASES: &[&str] = &["go back", "previous", "last question"];

/// Phrases meaning "I can't or won't answer this" — always accepted as-is.
const UNCERTAIN_PHRASES: &[&str] = &["don't know", "not sure", "prefer not", "rather not"];

/// Replies that close the follow-up "anything else?" question.
const CLOSING_PHRASES: &[&str] = &["no", "nothing", "finished", "done"];

/// Lower-case the input and fold curly apostrophes, so "don’t know" from a
/// speech recognizer matches the straight-quoted table entry.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase().replace('’', "'")
}

/// True when the (normalized) input asks to navigate back.
/// The bare token "back" only counts as an exact message, so answers like
/// "back pain" are not hijacked into navigation.
pub fn is_go_back(normalized: &str) -> bool {
    GO_BACK_PHRASES.iter().any(|p| normalized.contains(p)) || normalized == "back"
}

/// True when the (normalized) input expresses uncertainty or refusal.
pub fn is_uncertain(normalized: &str) -> bool {
    UNCERTAIN_PHRASES.iter().any(|p| normalized.contains(p))
}

/// True when the (normalized) reply to "anything else?" means "nothing more".
/// Matched on whole words, not substrings, so a genuine extra note such as
/// "also note the rash" ("note" contains "no") is kept.
pub fn is_followup_closing(normalized: &str) -> bool {
    normalized
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|word| CLOSING_PHRASES.contains(&word))
}
