//! XLSX report writer
//!
//! Writes the three derived tables into one workbook named after the
//! generation time and hands back the absolute path.

use chrono::{Local, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::analytics::ReportTables;
use crate::Result;

pub const SHEET_CHAT: &str = "Chat Metrics";
pub const SHEET_AGENT: &str = "Agent Metrics";
pub const SHEET_SHIFT: &str = "Shift CSAT Metrics";

pub const CHAT_HEADERS: [&str; 2] = ["Metric", "Value"];
pub const AGENT_HEADERS: [&str; 4] = [
    "ClosedBy",
    "Response Time (mins)",
    "Chat Duration (mins)",
    "CSATScore",
];
pub const SHIFT_HEADERS: [&str; 2] = ["Shift", "CSATScore"];

pub const REPORT_EXTENSION: &str = "xlsx";

/// `report_<YYYYMMDD>_<HHMMSS>.xlsx`
pub fn report_file_name(generated_at: NaiveDateTime) -> String {
    format!(
        "report_{}.{}",
        generated_at.format("%Y%m%d_%H%M%S"),
        REPORT_EXTENSION
    )
}

/// Writes report workbooks into a fixed directory.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    reports_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Write using the current local time for the file name.
    pub fn write(&self, tables: &ReportTables) -> Result<PathBuf> {
        self.write_at(tables, Local::now().naive_local())
    }

    /// Write with an explicit generation time. The workbook is built in memory
    /// and only touches disk once all three sheets are complete.
    pub fn write_at(&self, tables: &ReportTables, generated_at: NaiveDateTime) -> Result<PathBuf> {
        let mut workbook = build_workbook(tables)?;

        fs::create_dir_all(&self.reports_dir)?;
        let path = self.reports_dir.join(report_file_name(generated_at));
        workbook.save(&path)?;

        let path = fs::canonicalize(&path)?;
        info!(path = %path.display(), "✅ Report generated");
        Ok(path)
    }
}

fn build_workbook(tables: &ReportTables) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_CHAT)?;
    write_header(sheet, &CHAT_HEADERS, &header)?;
    for (i, row) in tables.chat.rows().iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.metric)?;
        sheet.write_number(r, 1, row.value)?;
    }
    sheet.set_column_width(0, 18)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_AGENT)?;
    write_header(sheet, &AGENT_HEADERS, &header)?;
    for (i, row) in tables.agents.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.agent.as_str())?;
        write_optional(sheet, r, 1, row.response_minutes)?;
        write_optional(sheet, r, 2, row.duration_minutes)?;
        write_optional(sheet, r, 3, row.csat_score)?;
    }
    sheet.set_column_width(1, 20)?;
    sheet.set_column_width(2, 20)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_SHIFT)?;
    write_header(sheet, &SHIFT_HEADERS, &header)?;
    for (i, row) in tables.shifts.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.shift.as_str())?;
        write_optional(sheet, r, 1, row.csat_score)?;
    }

    Ok(workbook)
}

fn write_header(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<()> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

/// Absent means are left as empty cells.
fn write_optional(sheet: &mut Worksheet, row: u32, col: u16, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AgentMetricsRow, ChatSummary, ShiftMetricsRow};
    use crate::chat::Shift;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
    }

    fn sample_tables() -> ReportTables {
        ReportTables {
            chat: ChatSummary {
                total: 3,
                bot_closed: 1,
                agent_closed: 2,
                deflection_pct: 33.33,
            },
            agents: vec![AgentMetricsRow {
                agent: "agentA".to_string(),
                response_minutes: Some(1.5),
                duration_minutes: Some(12.0),
                csat_score: None,
            }],
            shifts: vec![ShiftMetricsRow {
                shift: Shift::Morning,
                csat_score: Some(4.25),
            }],
        }
    }

    #[test]
    fn file_name_has_second_resolution() {
        assert_eq!(report_file_name(generated_at()), "report_20240301_070809.xlsx");
    }

    #[test]
    fn creates_missing_reports_dir() {
        let dir = tempdir().unwrap();
        let reports = dir.path().join("nested").join("reports");
        let exporter = ReportExporter::new(&reports);

        let path = exporter.write_at(&sample_tables(), generated_at()).unwrap();

        assert!(reports.is_dir());
        assert!(path.is_file());
        assert!(path.is_absolute());
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("report_20240301_070809.xlsx")
        );
    }

    #[test]
    fn writes_empty_tables() {
        let dir = tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path());
        let tables = ReportTables::compute(&[]);

        let path = exporter.write_at(&tables, generated_at()).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn write_uses_current_time() {
        let dir = tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path());

        let path = exporter.write(&sample_tables()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        assert!(name.starts_with("report_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(name.len(), "report_YYYYMMDD_HHMMSS.xlsx".len());
    }
}
