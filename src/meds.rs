//! Free-text medication list parsing.
//!
//! Turns one OCR'd or typed line per medication into a structured
//! [`MedicationRecord`]. Recognition is table-driven: each field has a set of
//! compiled patterns tried in order against every token position of the line,
//! so multi-word forms ("every 6 hours", "three times a day") match the same
//! way single abbreviations (q6h, TDS) do. Parsing is total: a line the
//! tables cannot structure lands whole in `notes` rather than being dropped.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::MedicationRecord;

/// A start-anchored pattern mapping a written form to its normalised label.
struct TermPattern {
    regex: Regex,
    label: &'static str,
}

fn term(pattern: &str, label: &'static str) -> TermPattern {
    TermPattern {
        regex: Regex::new(pattern).expect("term pattern must compile"),
        label,
    }
}

static ROUTE_PATTERNS: LazyLock<Vec<TermPattern>> = LazyLock::new(|| {
    vec![
        term(r"(?i)^(?:po|oral(?:ly)?|by mouth)\b", "Oral (PO)"),
        term(r"(?i)^(?:iv|intravenous(?:ly)?)\b", "IV"),
        term(r"(?i)^(?:im|intramuscular(?:ly)?)\b", "IM"),
        term(r"(?i)^(?:sc|s/c|subcut(?:aneous(?:ly)?)?)\b", "Subcut (SC)"),
        term(r"(?i)^(?:sl|sublingual(?:ly)?|under the tongue)\b", "Sublingual (SL)"),
        term(r"(?i)^(?:pr|rectal(?:ly)?|per rectum)\b", "Per rectum (PR)"),
        term(r"(?i)^(?:pv|vaginal(?:ly)?|per vagina)\b", "Per vagina (PV)"),
        term(r"(?i)^(?:inh|inhaled|inhalation|nebulised|nebulized)\b", "Inhaled"),
        term(r"(?i)^(?:top|topical(?:ly)?|to the skin)\b", "Topical"),
    ]
});

static FREQUENCY_PATTERNS: LazyLock<Vec<TermPattern>> = LazyLock::new(|| {
    vec![
        term(r"(?i)^(?:od|once daily|once a day|daily)\b", "OD (once daily)"),
        term(r"(?i)^(?:bd|twice daily|twice a day)\b", "BD (twice daily)"),
        term(
            r"(?i)^(?:tds|tid|three times (?:a day|daily))\b",
            "TDS (three times daily)",
        ),
        term(
            r"(?i)^(?:qds|qid|four times (?:a day|daily))\b",
            "QDS (four times daily)",
        ),
        term(
            r"(?i)^(?:prn|as needed|as required|when required)\b",
            "PRN (as needed)",
        ),
        term(r"(?i)^(?:mane|in the morning|every morning)\b", "mane (morning)"),
        term(r"(?i)^(?:nocte|at night|every night)\b", "nocte (night)"),
    ]
});

/// Interval dosing (q6h, "every 8 hours") carries a number, so it is handled
/// outside the fixed-label table.
static INTERVAL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:q\s*(\d+)\s*h|every\s+(\d+)\s+hours?)\b")
        .expect("interval pattern must compile")
});

static STRENGTH_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(mcg|microg(?:ram)?s?|mg|g|ml|units?|iu)\b")
        .expect("strength pattern must compile")
});

static DOSE_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(tablets?|caps(?:ules)?|puffs?|sprays?|drops?|units?)\b")
        .expect("dose pattern must compile")
});

/// Byte offsets where a token begins in a whitespace-collapsed line.
fn token_starts(line: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (index, byte) in line.bytes().enumerate() {
        if byte == b' ' && index + 1 < line.len() {
            starts.push(index + 1);
        }
    }
    starts
}

/// First table label matching at any token start, earliest token wins, table
/// order breaks ties within a token.
fn scan_table(line: &str, table: &[TermPattern]) -> Option<String> {
    for &start in &token_starts(line) {
        let remainder = &line[start..];
        for pattern in table {
            if pattern.regex.is_match(remainder) {
                return Some(pattern.label.to_string());
            }
        }
    }
    None
}

fn scan_frequency(line: &str) -> Option<String> {
    for &start in &token_starts(line) {
        let remainder = &line[start..];
        for pattern in FREQUENCY_PATTERNS.iter() {
            if pattern.regex.is_match(remainder) {
                return Some(pattern.label.to_string());
            }
        }
        if let Some(caps) = INTERVAL_RX.captures(remainder) {
            let hours = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            return Some(format!("q{hours}h (every {hours} hours)"));
        }
    }
    None
}

/// Parse a single medication line. Blank lines yield `None`; everything else
/// yields a record, structured as far as the tables allow.
pub fn parse_line(raw: &str) -> Option<MedicationRecord> {
    let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.is_empty() {
        return None;
    }

    let mut record = MedicationRecord::default();

    let strength_match = STRENGTH_RX.captures(&line);
    if let Some(caps) = &strength_match {
        let amount = &caps[1];
        let unit = caps[2].to_uppercase();
        record.strength = format!("{amount} {unit}");
    }

    // Extracted independently of strength; "10 units" fits both tables and
    // fills both fields.
    if let Some(caps) = DOSE_RX.captures(&line) {
        record.dose = format!("{} {}", &caps[1], caps[2].to_lowercase());
    }

    if let Some(route) = scan_table(&line, &ROUTE_PATTERNS) {
        record.route = route;
    }
    if let Some(frequency) = scan_frequency(&line) {
        record.frequency = frequency;
    }

    record.drug = match strength_match.as_ref().and_then(|s| s.get(0)) {
        Some(m) => line[..m.start()]
            .trim()
            .trim_end_matches([',', '-', '–'])
            .trim()
            .to_string(),
        _ => {
            // No strength to anchor on: the first four tokens stand in for
            // the name.
            line.split(' ')
                .take(4)
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end_matches([',', '-', '–'])
                .trim()
                .to_string()
        }
    };

    if record.is_empty() {
        record.notes = line;
    }
    Some(record)
}

/// Parse a whole pasted or OCR'd block, one medication per line. Blank lines
/// are skipped; no line is ever lost to a parse failure.
pub fn parse_block(text: &str) -> Vec<MedicationRecord> {
    let records: Vec<MedicationRecord> = text.lines().filter_map(parse_line).collect();
    tracing::debug!(lines = records.len(), "parsed medication block");
    records
}
