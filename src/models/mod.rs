pub mod medication;
pub mod message;
pub mod questionnaire;

pub use medication::MedicationRecord;
pub use message::{ChatMessage, Speaker};
pub use questionnaire::{
    FlattenedQuestion, Question, Questionnaire, SchemaError, Section, TriggerMode,
};
