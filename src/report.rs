//! End-to-end report generation: load → aggregate → export.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::analytics::ReportTables;
use crate::config::Config;
use crate::export::ReportExporter;
use crate::loader::ChatLoader;
use crate::metrics;
use crate::{Error, Result};

/// Result of one successful run.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Absolute path of the written workbook.
    pub path: PathBuf,
    pub chats_loaded: usize,
    pub tables: ReportTables,
}

impl ReportOutcome {
    pub fn file_name(&self) -> Result<&str> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(Error::ReportNotFound)
    }
}

/// Runs the loader, analytics and exporter in sequence.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    loader: ChatLoader,
    exporter: ReportExporter,
}

impl ReportGenerator {
    pub fn new(loader: ChatLoader, exporter: ReportExporter) -> Self {
        Self { loader, exporter }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ChatLoader::new().with_delimiter(config.delimiter),
            ReportExporter::new(&config.reports_dir),
        )
    }

    /// Generate a report from `input`. Nothing is written if loading fails.
    pub fn generate<P: AsRef<Path>>(&self, input: P) -> Result<ReportOutcome> {
        let input = input.as_ref();
        let records = self.loader.load(input)?;
        metrics::record_chats_processed(records.len());

        let tables = ReportTables::compute(&records);
        info!(
            total = tables.chat.total,
            agents = tables.agents.len(),
            shifts = tables.shifts.len(),
            deflection_pct = tables.chat.deflection_pct,
            "📊 Metrics computed"
        );

        let path = self.exporter.write(&tables)?;
        if !path.is_file() {
            return Err(Error::ReportNotFound);
        }

        Ok(ReportOutcome {
            path,
            chats_loaded: records.len(),
            tables,
        })
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Print the report tables to stdout.
pub fn print_report(tables: &ReportTables) {
    let header = "📊 Chat Metrics";
    println!("{}", header);
    println!("{}", "-".repeat(header.chars().count()));
    for row in tables.chat.rows() {
        println!("{:20} {:>10}", row.metric, row.value);
    }

    println!("\n👤 Agent Metrics");
    if tables.agents.is_empty() {
        println!("No agent-closed chats.");
    } else {
        println!(
            "{:24} {:>12} {:>12} {:>8}",
            "Agent", "Resp (min)", "Dur (min)", "CSAT"
        );
        for row in &tables.agents {
            println!(
                "{:24} {:>12} {:>12} {:>8}",
                row.agent.chars().take(24).collect::<String>(),
                fmt_opt(row.response_minutes),
                fmt_opt(row.duration_minutes),
                fmt_opt(row.csat_score)
            );
        }
    }

    println!("\n🕘 Shift CSAT Metrics");
    if tables.shifts.is_empty() {
        println!("No agent-closed chats.");
    } else {
        for row in &tables.shifts {
            println!("{:10} {:>8}", row.shift, fmt_opt(row.csat_score));
        }
    }
}
