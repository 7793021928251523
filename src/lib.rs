//! Pepper — conversational pre-operative assessment.
//!
//! A chat-style questionnaire engine with voice adapter seams, OCR-backed
//! medication list parsing and PDF summary export. The crate is host-agnostic:
//! everything runs through [`session::AssessmentSession`], and platform
//! services (speech, OCR) arrive through the traits in [`adapters`].

pub mod adapters;
pub mod config;
pub mod engine;
pub mod export;
pub mod meds;
pub mod models;
pub mod session;
pub mod store;

use tracing_subscriber::EnvFilter;

/// Initialize tracing once, honoring `RUST_LOG` when set.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
