//! Summary assembly and PDF export.
//!
//! Two stages: `assemble` folds the questionnaire, the answer store, the
//! structured medication rows and any scanned-document text into an ordered
//! list of [`SummarySection`]s; `render_pdf` lays those sections out with
//! `printpdf` (A4, builtin Helvetica/Courier, page-break aware with page
//! numbers). Keeping the stages separate means the document structure is
//! testable without decoding PDF output.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use regex::Regex;
use thiserror::Error;

use crate::models::{MedicationRecord, Question, Questionnaire};

/// The section whose Q&A gets the structured medication table prepended.
static MEDS_SECTION_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^medications? and allergies$").expect("section pattern must compile")
});

pub const SUMMARY_TITLE: &str = "Pre-operative Assessment — Pepper";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF generation failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One renderable unit. The variant picks font and indent at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Bold sub-heading within a section.
    Heading(String),
    /// Wrapped body text (question prompts, answers).
    Item(String),
    /// Monospace row (medication table lines, raw scans).
    Mono(String),
}

#[derive(Debug, Clone)]
pub struct SummarySection {
    pub title: String,
    pub blocks: Vec<Block>,
}

fn question_blocks(question: &Question, answers: &BTreeMap<String, String>, blocks: &mut Vec<Block>) {
    // Unanswered questions are left out of the summary entirely.
    let Some(answer) = answers.get(&question.id).filter(|a| !a.is_empty()) else {
        return;
    };
    blocks.push(Block::Item(format!("• {}", question.prompt)));
    blocks.push(Block::Item(format!("   {answer}")));

    // Follow-up sub-dialogue answers live under synthesized keys.
    for index in 0.. {
        match answers.get(&format!("{}_followup_{}", question.id, index)) {
            Some(extra) if !extra.is_empty() => {
                blocks.push(Block::Item(format!("   ↳ {extra}")));
            }
            _ => break,
        }
    }
    if let Some(extra) = answers.get(&format!("{}_additional_info", question.id)) {
        if !extra.is_empty() {
            blocks.push(Block::Item(format!("   ↳ {extra}")));
        }
    }
}

/// Build the document structure: one section per questionnaire section, the
/// medication table folded into the matching section, and an appendix for
/// scanned-document text when present.
pub fn assemble(
    questionnaire: &Questionnaire,
    answers: &BTreeMap<String, String>,
    meds_rows: &[MedicationRecord],
    raw_meds_text: &str,
    docs_text: &str,
) -> Vec<SummarySection> {
    let mut sections = Vec::new();

    for section in &questionnaire.sections {
        let mut blocks = Vec::new();

        if MEDS_SECTION_RX.is_match(&section.title) {
            // The medication table stands in for this section's answer list.
            blocks.push(Block::Heading("Current medications".to_string()));
            if !meds_rows.is_empty() {
                blocks.push(Block::Mono(
                    "Drug | Strength | Dose | Route | Frequency | Notes".to_string(),
                ));
                blocks.push(Block::Mono("-".repeat(54)));
                for row in meds_rows {
                    blocks.push(Block::Mono(row.summary_line()));
                }
            } else if !raw_meds_text.trim().is_empty() {
                // Unparsed scan text still travels, verbatim.
                for line in raw_meds_text.lines().filter(|l| !l.trim().is_empty()) {
                    blocks.push(Block::Mono(line.trim().to_string()));
                }
            } else {
                blocks.push(Block::Mono("—".to_string()));
            }
        } else {
            for question in &section.questions {
                question_blocks(question, answers, &mut blocks);
            }
            if blocks.is_empty() {
                blocks.push(Block::Item("—".to_string()));
            }
        }

        sections.push(SummarySection {
            title: section.title.clone(),
            blocks,
        });
    }

    if !docs_text.trim().is_empty() {
        let blocks = docs_text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Block::Mono(line.trim().to_string()))
            .collect();
        sections.push(SummarySection {
            title: "Appendix: scanned documents".to_string(),
            blocks,
        });
    }

    sections
}

// ─── PDF rendering ────────────────────────────────────────────────────────────

const PAGE_TOP: f32 = 280.0;
const PAGE_BOTTOM: f32 = 20.0;

/// Y-cursor over an A4 document, breaking to a fresh numbered page when the
/// bottom margin is reached.
struct PdfCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    page_number: usize,
    footer_font: &'a IndirectFontRef,
}

impl<'a> PdfCursor<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference, footer_font: &'a IndirectFontRef) -> Self {
        let cursor = Self {
            doc,
            layer,
            y: PAGE_TOP,
            page_number: 1,
            footer_font,
        };
        cursor.footer();
        cursor
    }

    fn footer(&self) {
        self.layer.use_text(
            format!("Page {}", self.page_number),
            8.0,
            Mm(98.0),
            Mm(10.0),
            self.footer_font,
        );
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < PAGE_BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_TOP;
            self.page_number += 1;
            self.footer();
        }
    }

    fn write(&mut self, text: &str, size: f32, x: f32, advance: f32, font: &IndirectFontRef) {
        self.ensure_space(advance);
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= advance;
    }

    fn gap(&mut self, amount: f32) {
        self.y -= amount;
    }
}

/// Render the assembled sections to PDF bytes.
pub fn render_pdf(sections: &[SummarySection], generated_at: &str) -> Result<Vec<u8>, ExportError> {
    let (doc, page1, layer1) = PdfDocument::new(SUMMARY_TITLE, Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Render(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Render(format!("font error: {e}")))?;
    let courier = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| ExportError::Render(format!("font error: {e}")))?;

    let layer = doc.get_page(page1).get_layer(layer1);
    let mut cursor = PdfCursor::new(&doc, layer, &font);

    cursor.write(SUMMARY_TITLE, 16.0, 20.0, 8.0, &bold);
    cursor.write(&format!("Generated: {generated_at}"), 9.0, 20.0, 10.0, &font);

    for section in sections {
        cursor.gap(2.0);
        cursor.write(&section.title.to_uppercase(), 11.0, 20.0, 6.0, &bold);
        for block in &section.blocks {
            match block {
                Block::Heading(text) => {
                    cursor.gap(1.0);
                    cursor.write(text, 10.0, 25.0, 5.5, &bold);
                }
                Block::Item(text) => {
                    for line in wrap_text(text, 80) {
                        cursor.write(&line, 9.0, 25.0, 4.5, &font);
                    }
                }
                Block::Mono(text) => {
                    cursor.write(text, 8.0, 25.0, 4.0, &courier);
                }
            }
        }
        cursor.gap(4.0);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Render(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Render(format!("buffer error: {e}")))
}

/// Write PDF bytes under the given exports directory, creating it on demand.
pub fn export_to_file(pdf_bytes: &[u8], filename: &str, exports_dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(exports_dir)?;
    let path = exports_dir.join(filename);
    std::fs::write(&path, pdf_bytes)?;
    tracing::info!(path = %path.display(), bytes = pdf_bytes.len(), "summary exported");
    Ok(path)
}

/// Timestamped default filename for an export.
pub fn default_filename() -> String {
    format!(
        "preop-summary-{}.pdf",
        chrono::Local::now().format("%Y-%m-%d-%H%M%S")
    )
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
