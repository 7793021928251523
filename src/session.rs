//! One patient's assessment, end to end.
//!
//! `AssessmentSession` wraps the conversation engine with everything around
//! it: the consent gate, the chat transcript, medication scanning and manual
//! row edits, draft persistence after every change, and the export pipeline.
//! Hosts (desktop shell, CLI, tests) drive this type only.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::adapters::{OcrAdapter, OcrError};
use crate::engine::{ConversationEngine, EngineError};
use crate::export::{self, ExportError};
use crate::meds;
use crate::models::questionnaire::SchemaError;
use crate::models::{ChatMessage, MedicationRecord, Questionnaire};
use crate::store::{DraftStore, SessionDraft, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Consent has not been given")]
    ConsentRequired,

    #[error("No medication row at index {0}")]
    NoSuchRow(usize),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// What an export attempt produced.
#[derive(Debug)]
pub enum ExportOutcome {
    /// The PDF was written to this path.
    Written(PathBuf),
    /// One or more questions lack answers; the conversation has been
    /// repositioned to the first of them.
    Incomplete { missing: Vec<String> },
}

pub struct AssessmentSession {
    engine: ConversationEngine,
    store: DraftStore,
    transcript: Vec<ChatMessage>,
    consent_given: bool,
    raw_meds_text: String,
    meds_rows: Vec<MedicationRecord>,
    docs_text: String,
}

impl AssessmentSession {
    /// Open a session, resuming any draft found in the store.
    pub fn new(questionnaire: Questionnaire, store: DraftStore) -> Result<Self, SessionError> {
        let draft = store.load()?;
        let mut engine = ConversationEngine::new(questionnaire)?;
        if !draft.answers.is_empty() {
            tracing::info!(answers = draft.answers.len(), "resuming from draft");
            engine.restore_answers(draft.answers);
        }
        Ok(Self {
            engine,
            store,
            transcript: Vec::new(),
            consent_given: draft.consent_given,
            raw_meds_text: draft.raw_meds_text,
            meds_rows: draft.meds_rows,
            docs_text: String::new(),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn consent_given(&self) -> bool {
        self.consent_given
    }

    pub fn medication_rows(&self) -> &[MedicationRecord] {
        &self.meds_rows
    }

    pub fn raw_meds_text(&self) -> &str {
        &self.raw_meds_text
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    // ── Consent and conversation ─────────────────────────────────────────

    pub fn set_consent(&mut self, given: bool) -> Result<(), SessionError> {
        self.consent_given = given;
        self.save_draft()
    }

    /// Open the conversation. Gated on consent.
    pub fn begin(&mut self) -> Result<Vec<ChatMessage>, SessionError> {
        if !self.consent_given {
            return Err(SessionError::ConsentRequired);
        }
        let transition = self.engine.start();
        Ok(self.push_assistant(transition.messages))
    }

    /// One patient input: transcript, engine transition, draft save.
    /// Returns the messages appended by this call (patient line included).
    pub fn handle_input(&mut self, raw: &str) -> Result<Vec<ChatMessage>, SessionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        let mut appended = vec![ChatMessage::patient(raw)];
        self.transcript.push(appended[0].clone());

        let transition = self.engine.submit_answer(raw);
        appended.extend(self.push_assistant(transition.messages));
        self.save_draft()?;
        Ok(appended)
    }

    fn push_assistant(&mut self, messages: Vec<String>) -> Vec<ChatMessage> {
        let appended: Vec<ChatMessage> = messages.into_iter().map(ChatMessage::assistant).collect();
        self.transcript.extend(appended.iter().cloned());
        appended
    }

    // ── Medication scanning and edits ────────────────────────────────────

    /// OCR a medication list photo set, replacing the raw text and the
    /// structured rows. Serialising concurrent scans is the adapter's job;
    /// an engine mid-scan reports [`OcrError::Busy`], which passes through
    /// here with no state change.
    pub fn scan_medications(
        &mut self,
        ocr: &dyn OcrAdapter,
        images: &[Vec<u8>],
    ) -> Result<&[MedicationRecord], SessionError> {
        self.raw_meds_text = ocr.recognize(images)?;
        self.meds_rows = meds::parse_block(&self.raw_meds_text);
        self.save_draft()?;
        Ok(&self.meds_rows)
    }

    /// OCR supporting documents. Text accumulates across scans and ends up
    /// in the summary appendix.
    pub fn scan_documents(
        &mut self,
        ocr: &dyn OcrAdapter,
        images: &[Vec<u8>],
    ) -> Result<&str, SessionError> {
        let text = ocr.recognize(images)?;
        if !self.docs_text.is_empty() {
            self.docs_text.push('\n');
        }
        self.docs_text.push_str(&text);
        Ok(&self.docs_text)
    }

    /// Manual edit of the raw medication text, re-running the parser.
    pub fn set_raw_meds_text(&mut self, text: &str) -> Result<&[MedicationRecord], SessionError> {
        self.raw_meds_text = text.to_string();
        self.meds_rows = meds::parse_block(&self.raw_meds_text);
        self.save_draft()?;
        Ok(&self.meds_rows)
    }

    pub fn add_medication_row(&mut self, row: MedicationRecord) -> Result<(), SessionError> {
        self.meds_rows.push(row);
        self.save_draft()
    }

    pub fn update_medication_row(
        &mut self,
        index: usize,
        row: MedicationRecord,
    ) -> Result<(), SessionError> {
        let slot = self
            .meds_rows
            .get_mut(index)
            .ok_or(SessionError::NoSuchRow(index))?;
        *slot = row;
        self.save_draft()
    }

    pub fn remove_medication_row(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.meds_rows.len() {
            return Err(SessionError::NoSuchRow(index));
        }
        self.meds_rows.remove(index);
        self.save_draft()
    }

    // ── Export and reset ─────────────────────────────────────────────────

    /// Generate the summary PDF under `exports_dir`. If any question is
    /// still unanswered the conversation jumps to the first missing one and
    /// no file is written.
    pub fn export_summary(&mut self, exports_dir: &Path) -> Result<ExportOutcome, SessionError> {
        if !self.consent_given {
            return Err(SessionError::ConsentRequired);
        }
        let answers = match self.engine.request_export() {
            Ok(answers) => answers,
            Err(EngineError::CoverageIncomplete { missing }) => {
                if let Some(first) = missing.first() {
                    let transition = self.engine.reposition_to(first)?;
                    self.push_assistant(transition.messages);
                }
                return Ok(ExportOutcome::Incomplete { missing });
            }
            Err(e) => return Err(e.into()),
        };

        let sections = export::assemble(
            self.engine.questionnaire(),
            &answers,
            &self.meds_rows,
            &self.raw_meds_text,
            &self.docs_text,
        );
        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        let bytes = export::render_pdf(&sections, &generated_at)?;
        let path = export::export_to_file(&bytes, &export::default_filename(), exports_dir)?;
        Ok(ExportOutcome::Written(path))
    }

    /// Discard everything, including the persisted draft.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let questionnaire = self.engine.questionnaire().clone();
        self.engine = ConversationEngine::new(questionnaire)?;
        self.transcript.clear();
        self.consent_given = false;
        self.raw_meds_text.clear();
        self.meds_rows.clear();
        self.docs_text.clear();
        self.store.clear()?;
        tracing::info!("session reset");
        Ok(())
    }

    fn save_draft(&self) -> Result<(), SessionError> {
        self.store.save(&SessionDraft {
            consent_given: self.consent_given,
            answers: self.engine.answers().clone(),
            raw_meds_text: self.raw_meds_text.clone(),
            meds_rows: self.meds_rows.clone(),
        })?;
        Ok(())
    }
}
