// Field Tally - Core Library
// Livestock registry + report generation, shared by the TUI binary and tests

pub mod delivery;
pub mod pdf;
pub mod registry;
pub mod report;
pub mod store;

// Re-export commonly used types
pub use delivery::{
    deliver_or_save, save_to_dir, DeliveryOutcome, DeliveryTarget, LocalDirTarget,
    CSV_FILE_NAME, REPORT_FILE_NAME,
};
pub use registry::{AnimalRecord, Category, Registry, Treatment};
pub use report::{render_csv, render_pdf, summarize, CategorySummary, ReportSummary};
pub use store::{
    default_db_path, load_registry, open_database, save_registry, setup_database,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
