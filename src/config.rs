use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Pepper";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/Pepper/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Pepper")
}

/// Get the exports directory (generated summary PDFs)
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}

/// Get the draft cache file (consent flag, in-progress answers, meds rows)
pub fn draft_cache_path() -> PathBuf {
    app_data_dir().join("draft.json")
}
