use serde::{Deserialize, Serialize};

/// One row of the medication table. Every field is independently optional
/// (empty string = absent); a row carrying only `notes` is still valid and
/// represents a line the parser could not break down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub drug: String,
    /// Magnitude + unit, e.g. "5 MG".
    pub strength: String,
    /// Quantity + form, e.g. "2 tablets".
    pub dose: String,
    /// Normalized route label, e.g. "Oral (PO)".
    pub route: String,
    /// Normalized frequency label, e.g. "OD (once daily)".
    pub frequency: String,
    /// Free text; absorbs lines no field could be extracted from.
    pub notes: String,
}

impl MedicationRecord {
    pub fn is_empty(&self) -> bool {
        self.drug.is_empty()
            && self.strength.is_empty()
            && self.dose.is_empty()
            && self.route.is_empty()
            && self.frequency.is_empty()
            && self.notes.is_empty()
    }

    /// Pipe-joined summary line with dash placeholders, as rendered in the
    /// exported medication table.
    pub fn summary_line(&self) -> String {
        let dash = |s: &str| if s.is_empty() { "—".to_string() } else { s.to_string() };
        format!(
            "{} | {} | {} | {} | {} | {}",
            dash(&self.drug),
            dash(&self.strength),
            dash(&self.dose),
            dash(&self.route),
            dash(&self.frequency),
            self.notes
        )
    }
}
