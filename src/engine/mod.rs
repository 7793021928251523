//! Conversational flow controller.
//!
//! Owns the flattened question sequence, the current position, the answer
//! store, the follow-up sub-dialogue and the one-retry clarification policy.
//! Every operation is a synchronous state transition that returns an ordered
//! queue of outbound assistant messages; the host appends them to the
//! transcript (and optionally speaks them) in order. The engine performs no
//! I/O and never panics on patient input.

pub mod phrases;
pub mod validator;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::questionnaire::SchemaError;
use crate::models::{FlattenedQuestion, Question, Questionnaire, TriggerMode};

const MSG_GREETING: &str =
    "Hi I'm Pepper and I'd like to help complete your preoperative assessment!";
const MSG_USAGE: &str = "I'll guide you through questions about your health. You can type your \
     answers or use the microphone to speak them. If you want to change a \
     previous answer, just say 'go back'.";
const MSG_GO_BACK_ACK: &str = "No problem! Let's go back to the previous question.";
const MSG_AT_FIRST_QUESTION: &str =
    "We're already at the first question. Let's continue from here!";
const MSG_UNCERTAIN_ACK: &str = "I understand. Let's move on to the next question.";
const MSG_FOLLOW_UP_ACK: &str = "Thank you for that information.";
const MSG_FOLLOW_UP_COMPLETE: &str =
    "Thank you for those details. Let's continue with the next question.";
const MSG_ADDITIONAL_INFO_ACK: &str = "Thank you for that additional information.";
const MSG_ANYTHING_ELSE: &str = "Have you finished describing your condition, or is there \
     anything else you'd like to tell me about it?";
const MSG_FALLBACK_ACCEPT: &str = "Thank you for that information.";
const MSG_COMPLETE: &str = "That completes the core questions. You can generate your summary \
     now. If anything is missing, I'll ask you those bits first.";
const MSG_GENERIC_CLARIFICATION: &str = "Thanks. You can answer in your own words; if you're \
     not sure, say 'prefer not to say'.";

/// Ordered queue of assistant messages produced by one engine transition.
/// The host drains it sequentially (optionally pacing emission for UX).
#[derive(Debug, Default, Clone)]
pub struct Transition {
    pub messages: Vec<String>,
}

impl Transition {
    fn one(text: impl Into<String>) -> Self {
        Self {
            messages: vec![text.into()],
        }
    }

    fn push(&mut self, text: impl Into<String>) {
        self.messages.push(text.into());
    }

    fn append(&mut self, mut other: Transition) {
        self.messages.append(&mut other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Export requested before every question has a non-empty answer.
    /// Recoverable: reposition to the first missing id and keep going.
    #[error("{} question(s) still unanswered", missing.len())]
    CoverageIncomplete { missing: Vec<String> },

    #[error("No question with id '{0}' in the questionnaire")]
    UnknownQuestion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowUpStage {
    /// Asking configured follow-up prompt `i`.
    Prompt(usize),
    /// Asking the free-form "anything else?" closer.
    AnythingElse,
}

#[derive(Debug, Clone)]
struct FollowUpState {
    base_id: String,
    prompts: Vec<String>,
    stage: FollowUpStage,
}

/// The conversation state machine. See module docs.
pub struct ConversationEngine {
    questionnaire: Questionnaire,
    questions: Vec<FlattenedQuestion>,
    position: usize,
    answers: BTreeMap<String, String>,
    attempt: u8,
    follow_up: Option<FollowUpState>,
    summary_ready: bool,
}

impl ConversationEngine {
    /// Build an engine over a loaded questionnaire. Rejects a schema with no
    /// questions so `position` is always a valid subscript afterwards.
    pub fn new(questionnaire: Questionnaire) -> Result<Self, SchemaError> {
        let questions = questionnaire.flatten();
        if questions.is_empty() {
            return Err(SchemaError::NoQuestions);
        }
        tracing::info!(questions = questions.len(), "conversation engine ready");
        Ok(Self {
            questionnaire,
            questions,
            position: 0,
            answers: BTreeMap::new(),
            attempt: 0,
            follow_up: None,
            summary_ready: false,
        })
    }

    /// Greeting, usage hint and the first question prompt.
    pub fn start(&self) -> Transition {
        Transition {
            messages: vec![
                MSG_GREETING.to_string(),
                MSG_USAGE.to_string(),
                self.questions[0].question.prompt.clone(),
            ],
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> &FlattenedQuestion {
        &self.questions[self.position]
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn is_summary_ready(&self) -> bool {
        self.summary_ready
    }

    /// Restore a previously persisted answer store (draft cache).
    pub fn restore_answers(&mut self, answers: BTreeMap<String, String>) {
        self.answers = answers;
    }

    // ── submitAnswer ─────────────────────────────────────────────────────

    /// Apply one patient input. Control phrases are interpreted first, then
    /// uncertainty phrases, then follow-up handling, then the main
    /// answer/validation path. Returns the outbound message queue.
    pub fn submit_answer(&mut self, raw: &str) -> Transition {
        let raw = raw.trim();
        if raw.is_empty() {
            return Transition::default();
        }
        let normalized = phrases::normalize(raw);

        if phrases::is_go_back(&normalized) {
            return self.go_back();
        }

        if phrases::is_uncertain(&normalized) {
            return self.accept_uncertain(raw, &normalized);
        }

        if self.follow_up.is_some() {
            return self.follow_up_input(raw, &normalized);
        }

        self.main_answer(raw, &normalized)
    }

    /// Navigate one question back. Takes precedence over everything else;
    /// an active follow-up is abandoned (its partial answers are kept).
    fn go_back(&mut self) -> Transition {
        self.attempt = 0;
        if self.follow_up.take().is_some() {
            tracing::debug!("abandoning follow-up sub-dialogue on go-back");
        }
        if self.position == 0 {
            return Transition::one(MSG_AT_FIRST_QUESTION);
        }
        self.position -= 1;
        let fq = &self.questions[self.position];
        let mut transition = Transition::one(MSG_GO_BACK_ACK);
        // Echo the earlier answer so the patient knows what they are changing.
        match self.answers.get(&fq.question.id) {
            Some(prev) if !prev.is_empty() => transition.push(format!(
                "{} (Your previous answer was: \"{}\")",
                fq.question.prompt, prev
            )),
            _ => transition.push(fq.question.prompt.clone()),
        }
        transition
    }

    /// "Don't know" and friends: always accepted, skips validation and the
    /// clarification cycle entirely.
    fn accept_uncertain(&mut self, raw: &str, normalized: &str) -> Transition {
        let mut transition = Transition::one(MSG_UNCERTAIN_ACK);
        if self.follow_up.take().is_some() {
            transition.push(MSG_FOLLOW_UP_COMPLETE);
            transition.append(self.queue_next_or_finish());
            return transition;
        }
        let question = self.questions[self.position].question.clone();
        self.answers.insert(question.id.clone(), raw.to_string());
        self.attempt = 0;
        transition.append(self.after_accepted(&question, normalized));
        transition
    }

    /// One reply inside an active follow-up sub-dialogue.
    fn follow_up_input(&mut self, raw: &str, normalized: &str) -> Transition {
        let Some(mut state) = self.follow_up.take() else {
            return Transition::default();
        };
        let mut transition = Transition::default();
        match state.stage {
            FollowUpStage::Prompt(index) => {
                self.answers
                    .insert(format!("{}_followup_{}", state.base_id, index), raw.to_string());
                transition.push(MSG_FOLLOW_UP_ACK);
                if index + 1 < state.prompts.len() {
                    transition.push(state.prompts[index + 1].clone());
                    state.stage = FollowUpStage::Prompt(index + 1);
                } else {
                    transition.push(MSG_ANYTHING_ELSE);
                    state.stage = FollowUpStage::AnythingElse;
                }
                self.follow_up = Some(state);
            }
            FollowUpStage::AnythingElse => {
                if !phrases::is_followup_closing(normalized) {
                    // One extra free-text note, then close regardless.
                    self.answers
                        .insert(format!("{}_additional_info", state.base_id), raw.to_string());
                    transition.push(MSG_ADDITIONAL_INFO_ACK);
                }
                transition.push(MSG_FOLLOW_UP_COMPLETE);
                transition.append(self.queue_next_or_finish());
            }
        }
        transition
    }

    /// Main-question path: record first, validate after.
    fn main_answer(&mut self, raw: &str, normalized: &str) -> Transition {
        let question = self.questions[self.position].question.clone();
        // Deliberate policy: the last submission always overwrites the stored
        // value, even when validation later asks for clarification.
        self.answers.insert(question.id.clone(), raw.to_string());

        if !validator::validate(raw, &question) {
            if self.attempt == 0 {
                self.attempt = 1;
                let clarification = question
                    .clarification
                    .clone()
                    .unwrap_or_else(|| MSG_GENERIC_CLARIFICATION.to_string());
                return Transition::one(clarification);
            }
            // Second miss: accept anyway so no question can block the patient.
            tracing::debug!(question = %question.id, "fallback-accepting answer after retry");
            self.attempt = 0;
            let mut transition = Transition::one(MSG_FALLBACK_ACCEPT);
            transition.append(self.after_accepted(&question, normalized));
            return transition;
        }

        self.attempt = 0;
        self.after_accepted(&question, normalized)
    }

    /// After an answer is accepted: open a follow-up if triggered, otherwise
    /// advance the main sequence.
    fn after_accepted(&mut self, question: &Question, normalized_answer: &str) -> Transition {
        if let Some(transition) = self.maybe_start_follow_up(question, normalized_answer) {
            return transition;
        }
        self.queue_next_or_finish()
    }

    fn maybe_start_follow_up(
        &mut self,
        question: &Question,
        normalized_answer: &str,
    ) -> Option<Transition> {
        if !question.has_follow_up || question.follow_up_questions.is_empty() {
            return None;
        }
        let (intro, prompts) = match question.trigger_mode {
            TriggerMode::Always => (
                "Thanks — I have a few quick follow-up questions.".to_string(),
                question.follow_up_questions.clone(),
            ),
            TriggerMode::AnyTrigger => {
                let matched: Vec<&str> = question
                    .follow_up_triggers
                    .iter()
                    .filter(|trigger| normalized_answer.contains(&trigger.to_lowercase()))
                    .map(|trigger| trigger.as_str())
                    .collect();
                if matched.is_empty() {
                    return None;
                }
                let prompts = question
                    .follow_up_questions
                    .iter()
                    .map(|prompt| prompt.replace("[CONDITION]", matched[0]))
                    .collect();
                (
                    format!(
                        "I can see you mentioned {}. Let me ask a few more questions about this.",
                        matched.join(" and ")
                    ),
                    prompts,
                )
            }
        };
        tracing::debug!(question = %question.id, "opening follow-up sub-dialogue");
        let mut transition = Transition::one(intro);
        transition.push(prompts[0].clone());
        self.follow_up = Some(FollowUpState {
            base_id: question.id.clone(),
            prompts,
            stage: FollowUpStage::Prompt(0),
        });
        Some(transition)
    }

    /// Advance to the next main question, announcing section changes, or mark
    /// the conversation ready for export at the end of the sequence.
    fn queue_next_or_finish(&mut self) -> Transition {
        self.attempt = 0;
        if self.position + 1 < self.questions.len() {
            let previous_section = self.questions[self.position].section_title.clone();
            self.position += 1;
            let next = &self.questions[self.position];
            let mut transition = Transition::default();
            if next.section_title != previous_section {
                transition.push(format!(
                    "Now let's move on to questions about: {}",
                    next.section_title
                ));
            }
            transition.push(next.question.prompt.clone());
            transition
        } else {
            self.summary_ready = true;
            tracing::info!("all questions presented; summary ready");
            Transition::one(MSG_COMPLETE)
        }
    }

    // ── Export gate ──────────────────────────────────────────────────────

    /// Question ids (in schema order, across every section) that have no
    /// non-empty answer yet.
    pub fn missing_ids(&self) -> Vec<String> {
        self.questionnaire
            .sections
            .iter()
            .flat_map(|section| &section.questions)
            .filter(|question| {
                self.answers
                    .get(&question.id)
                    .map_or(true, |answer| answer.is_empty())
            })
            .map(|question| question.id.clone())
            .collect()
    }

    /// Coverage-gated snapshot of the answer store, for the exporter.
    pub fn request_export(&self) -> Result<BTreeMap<String, String>, EngineError> {
        let missing = self.missing_ids();
        if !missing.is_empty() {
            tracing::info!(missing = missing.len(), "export blocked, coverage incomplete");
            return Err(EngineError::CoverageIncomplete { missing });
        }
        Ok(self.answers.clone())
    }

    /// Jump the conversation to a specific question (used after
    /// `CoverageIncomplete` to chase the first missing answer). Leaves the
    /// answer store untouched.
    pub fn reposition_to(&mut self, question_id: &str) -> Result<Transition, EngineError> {
        let index = self
            .questions
            .iter()
            .position(|fq| fq.question.id == question_id)
            .ok_or_else(|| EngineError::UnknownQuestion(question_id.to_string()))?;
        self.position = index;
        self.attempt = 0;
        self.follow_up = None;
        Ok(Transition::one(format!(
            "Before we finish, I need to ask: {}",
            self.questions[index].question.prompt
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Questionnaire {
        Questionnaire::from_json(
            r#"{
              "sections": [
                { "id": "general", "title": "General Health", "questions": [
                    { "id": "smoker", "prompt": "Do you smoke?",
                      "expectedOptions": ["yes", "no", "never", "quit"],
                      "clarification": "A simple yes or no is fine." },
                    { "id": "conditions", "prompt": "Do you have any medical conditions?",
                      "hasFollowUp": true,
                      "followUpTriggers": ["diabetes", "asthma"],
                      "followUpQuestions": ["How long have you had [CONDITION]?",
                                            "Is your [CONDITION] well controlled?"] }
                ]},
                { "id": "meds", "title": "Medications and Allergies", "questions": [
                    { "id": "allergies", "prompt": "Do you have any allergies?" }
                ]}
              ]
            }"#,
        )
        .unwrap()
    }

    fn engine() -> ConversationEngine {
        ConversationEngine::new(schema()).unwrap()
    }

    #[test]
    fn start_emits_greeting_and_first_prompt() {
        let engine = engine();
        let transition = engine.start();
        assert_eq!(transition.messages.len(), 3);
        assert!(transition.messages[0].contains("Pepper"));
        assert_eq!(transition.messages[2], "Do you smoke?");
    }

    #[test]
    fn empty_schema_is_rejected() {
        let questionnaire = Questionnaire {
            version: None,
            sections: vec![],
        };
        assert!(matches!(
            ConversationEngine::new(questionnaire),
            Err(SchemaError::NoQuestions)
        ));
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut engine = engine();
        let transition = engine.submit_answer("   ");
        assert!(transition.is_empty());
        assert_eq!(engine.position(), 0);
    }

    #[test]
    fn go_back_at_first_question_never_moves() {
        let mut engine = engine();
        let transition = engine.submit_answer("go back");
        assert_eq!(engine.position(), 0);
        assert_eq!(transition.messages, vec![MSG_AT_FIRST_QUESTION.to_string()]);
    }

    #[test]
    fn go_back_echoes_previous_answer() {
        let mut engine = engine();
        engine.submit_answer("no");
        assert_eq!(engine.position(), 1);
        let transition = engine.submit_answer("please go back");
        assert_eq!(engine.position(), 0);
        assert!(transition.messages[1].contains("Do you smoke?"));
        assert!(transition.messages[1].contains("Your previous answer was: \"no\""));
    }

    #[test]
    fn back_pain_is_an_answer_not_navigation() {
        let mut engine = engine();
        engine.submit_answer("never");
        let before = engine.position();
        engine.submit_answer("I get back pain sometimes");
        // Treated as an answer to the conditions question, not as go-back.
        assert_eq!(engine.answers()["conditions"], "I get back pain sometimes");
        assert!(engine.position() > before || engine.is_summary_ready());
    }

    #[test]
    fn answer_is_stored_verbatim_even_when_invalid() {
        let mut engine = engine();
        let transition = engine.submit_answer("purple monkeys");
        // Stored despite failing validation...
        assert_eq!(engine.answers()["smoker"], "purple monkeys");
        // ...and the engine asked for clarification without advancing.
        assert_eq!(transition.messages, vec!["A simple yes or no is fine.".to_string()]);
        assert_eq!(engine.position(), 0);
    }

    #[test]
    fn second_invalid_attempt_is_accepted() {
        let mut engine = engine();
        engine.submit_answer("purple");
        let transition = engine.submit_answer("still purple");
        assert_eq!(engine.answers()["smoker"], "still purple");
        assert_eq!(engine.position(), 1);
        assert_eq!(transition.messages[0], MSG_FALLBACK_ACCEPT);
    }

    #[test]
    fn generic_clarification_when_question_has_none() {
        let questionnaire = Questionnaire::from_json(
            r#"{"sections":[{"id":"s","title":"S","questions":[
                {"id":"q1","prompt":"Pick one","expectedOptions":["left","right"]},
                {"id":"q2","prompt":"And then?"}]}]}"#,
        )
        .unwrap();
        let mut engine = ConversationEngine::new(questionnaire).unwrap();
        let transition = engine.submit_answer("up");
        assert_eq!(transition.messages, vec![MSG_GENERIC_CLARIFICATION.to_string()]);
    }

    #[test]
    fn uncertainty_is_always_accepted_without_clarification() {
        let mut engine = engine();
        let transition = engine.submit_answer("I don't know");
        assert_eq!(engine.answers()["smoker"], "I don't know");
        assert_eq!(engine.position(), 1);
        assert_eq!(transition.messages[0], MSG_UNCERTAIN_ACK);
        assert!(!transition
            .messages
            .iter()
            .any(|m| m == "A simple yes or no is fine."));
    }

    #[test]
    fn attempt_counter_resets_on_position_change() {
        let mut engine = engine();
        engine.submit_answer("purple"); // attempt -> 1
        engine.submit_answer("go back"); // resets attempts, stays at 0
        let transition = engine.submit_answer("orange");
        // A fresh first attempt: clarification again rather than fallback-accept.
        assert_eq!(transition.messages, vec!["A simple yes or no is fine.".to_string()]);
    }

    #[test]
    fn follow_up_triggers_on_matched_substring() {
        let mut engine = engine();
        engine.submit_answer("no");
        let transition = engine.submit_answer("I have diabetes and asthma");
        assert!(transition.messages[0].contains("diabetes and asthma"));
        assert_eq!(transition.messages[1], "How long have you had diabetes?");
        // Main position is parked until the sub-dialogue completes.
        assert_eq!(engine.position(), 1);
    }

    #[test]
    fn follow_up_does_not_trigger_without_match() {
        let mut engine = engine();
        engine.submit_answer("no");
        let transition = engine.submit_answer("nothing of note");
        assert_eq!(engine.position(), 2);
        assert!(transition.messages.iter().any(|m| m == "Do you have any allergies?"));
    }

    #[test]
    fn full_follow_up_dialogue_stores_synthesized_keys() {
        let mut engine = engine();
        engine.submit_answer("no");
        engine.submit_answer("I have diabetes");
        engine.submit_answer("about ten years");
        engine.submit_answer("yes, well controlled");
        // Now at the "anything else?" stage.
        let transition = engine.submit_answer("also my feet tingle at night");
        assert_eq!(engine.answers()["conditions_followup_0"], "about ten years");
        assert_eq!(engine.answers()["conditions_followup_1"], "yes, well controlled");
        assert_eq!(
            engine.answers()["conditions_additional_info"],
            "also my feet tingle at night"
        );
        // Extra note closes the follow-up and resumes the main sequence.
        assert!(transition.messages.iter().any(|m| m == MSG_FOLLOW_UP_COMPLETE));
        assert_eq!(engine.position(), 2);
    }

    #[test]
    fn anything_else_negation_closes_without_extra_note() {
        let mut engine = engine();
        engine.submit_answer("no");
        engine.submit_answer("asthma since childhood");
        engine.submit_answer("twenty years");
        engine.submit_answer("mostly");
        let transition = engine.submit_answer("nothing else");
        assert!(!engine.answers().contains_key("conditions_additional_info"));
        assert!(transition.messages.iter().any(|m| m == MSG_FOLLOW_UP_COMPLETE));
        assert_eq!(engine.position(), 2);
    }

    #[test]
    fn uncertainty_closes_an_active_follow_up() {
        let mut engine = engine();
        engine.submit_answer("no");
        engine.submit_answer("I have diabetes");
        let transition = engine.submit_answer("not sure");
        assert_eq!(transition.messages[0], MSG_UNCERTAIN_ACK);
        assert!(transition.messages.iter().any(|m| m == MSG_FOLLOW_UP_COMPLETE));
        assert_eq!(engine.position(), 2);
    }

    #[test]
    fn go_back_abandons_an_active_follow_up() {
        let mut engine = engine();
        engine.submit_answer("no");
        engine.submit_answer("I have diabetes");
        engine.submit_answer("five years");
        let transition = engine.submit_answer("go back");
        assert_eq!(engine.position(), 0);
        assert!(transition.messages[0].contains("go back"));
        // The partial follow-up answer is kept.
        assert_eq!(engine.answers()["conditions_followup_0"], "five years");
        // Subsequent input is a plain main answer again.
        engine.submit_answer("never");
        assert_eq!(engine.answers()["smoker"], "never");
    }

    #[test]
    fn always_mode_fires_without_triggers() {
        let questionnaire = Questionnaire::from_json(
            r#"{"sections":[{"id":"s","title":"S","questions":[
                {"id":"q1","prompt":"Any operations before?","hasFollowUp":true,
                 "triggerMode":"always",
                 "followUpQuestions":["When was the most recent one?"]},
                {"id":"q2","prompt":"Next?"}]}]}"#,
        )
        .unwrap();
        let mut engine = ConversationEngine::new(questionnaire).unwrap();
        let transition = engine.submit_answer("a knee arthroscopy");
        assert_eq!(
            transition.messages,
            vec![
                "Thanks — I have a few quick follow-up questions.".to_string(),
                "When was the most recent one?".to_string()
            ]
        );
    }

    #[test]
    fn section_change_is_announced() {
        let mut engine = engine();
        engine.submit_answer("no");
        let transition = engine.submit_answer("none at all");
        assert!(transition
            .messages
            .iter()
            .any(|m| m == "Now let's move on to questions about: Medications and Allergies"));
    }

    #[test]
    fn finishing_the_sequence_sets_summary_ready() {
        let mut engine = engine();
        engine.submit_answer("no");
        engine.submit_answer("none");
        assert!(!engine.is_summary_ready());
        let transition = engine.submit_answer("no allergies");
        assert!(engine.is_summary_ready());
        assert_eq!(transition.messages, vec![MSG_COMPLETE.to_string()]);
        // Position stays bounded at the final question.
        assert_eq!(engine.position(), engine.question_count() - 1);
    }

    #[test]
    fn export_blocked_until_every_question_answered() {
        let mut engine = engine();
        engine.submit_answer("no");
        match engine.request_export() {
            Err(EngineError::CoverageIncomplete { missing }) => {
                assert_eq!(missing, vec!["conditions".to_string(), "allergies".to_string()]);
            }
            other => panic!("expected CoverageIncomplete, got {other:?}"),
        }
        engine.submit_answer("none");
        engine.submit_answer("no allergies");
        let answers = engine.request_export().unwrap();
        assert_eq!(answers["smoker"], "no");
        assert_eq!(answers["allergies"], "no allergies");
    }

    #[test]
    fn empty_string_answer_counts_as_missing() {
        let mut engine = engine();
        let mut answers = BTreeMap::new();
        answers.insert("smoker".to_string(), String::new());
        answers.insert("conditions".to_string(), "none".to_string());
        answers.insert("allergies".to_string(), "none".to_string());
        engine.restore_answers(answers);
        match engine.request_export() {
            Err(EngineError::CoverageIncomplete { missing }) => {
                assert_eq!(missing, vec!["smoker".to_string()]);
            }
            other => panic!("expected CoverageIncomplete, got {other:?}"),
        }
    }

    #[test]
    fn reposition_to_missing_question() {
        let mut engine = engine();
        engine.submit_answer("no");
        engine.submit_answer("none");
        engine.submit_answer("no allergies");
        let transition = engine.reposition_to("conditions").unwrap();
        assert_eq!(engine.position(), 1);
        assert!(transition.messages[0].contains("Do you have any medical conditions?"));
        // Re-answering overwrites the earlier entry.
        engine.submit_answer("mild asthma only");
        assert!(engine.answers()["conditions"].contains("asthma"));
    }

    #[test]
    fn reposition_to_unknown_id_fails() {
        let mut engine = engine();
        assert!(matches!(
            engine.reposition_to("nope"),
            Err(EngineError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn two_question_walkthrough_reaches_export() {
        let questionnaire = Questionnaire::from_json(
            r#"{"sections":[{"id":"s","title":"S","questions":[
                {"id":"q1","prompt":"First?"},
                {"id":"q2","prompt":"Second?"}]}]}"#,
        )
        .unwrap();
        let mut engine = ConversationEngine::new(questionnaire).unwrap();
        engine.submit_answer("one");
        engine.submit_answer("two");
        assert!(engine.is_summary_ready());
        let answers = engine.request_export().unwrap();
        assert_eq!(answers.len(), 2);
    }
}
