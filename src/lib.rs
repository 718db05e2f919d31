//! Chat Support Report Library
//!
//! This library provides tools to:
//! - Load chat-support transcript dumps (CSV and other delimited files)
//! - Compute bot deflection, per-agent performance and per-shift CSAT
//! - Export the results as a three-sheet XLSX workbook
//! - Serve an upload endpoint that answers with the generated workbook
//! - Expose Prometheus metrics for report generation

pub mod analytics;
pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod server;

// Re-export common types
pub use analytics::ReportTables;
pub use chat::{ChatRecord, Shift};
pub use config::Config;
pub use error::{Error, Result};
pub use export::ReportExporter;
pub use loader::{load_chats, ChatLoader};
pub use report::{print_report, ReportGenerator, ReportOutcome};
