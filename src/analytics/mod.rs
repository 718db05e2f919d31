//! Transcript analytics
//!
//! Provides:
//! - Chat-level volume and bot deflection
//! - Per-agent response time, duration and CSAT
//! - Per-shift CSAT

pub mod agent_metrics;
pub mod chat_metrics;
pub mod shift_metrics;

use serde::Serialize;

use crate::chat::ChatRecord;

pub use agent_metrics::{agent_summary, AgentMetricsRow};
pub use chat_metrics::{chat_summary, ChatMetricsRow, ChatSummary};
pub use shift_metrics::{shift_summary, ShiftMetricsRow};

/// The three derived tables a report is built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTables {
    pub chat: ChatSummary,
    pub agents: Vec<AgentMetricsRow>,
    pub shifts: Vec<ShiftMetricsRow>,
}

impl ReportTables {
    pub fn compute(records: &[ChatRecord]) -> Self {
        Self {
            chat: chat_summary(records),
            agents: agent_summary(records),
            shifts: shift_summary(records),
        }
    }
}

/// Round to two decimals, ties to even (`0.125` → `0.12`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Running mean that skips missing values.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    pub(crate) fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// Rounded mean, or `None` when nothing was pushed.
    pub(crate) fn rounded(&self) -> Option<f64> {
        (self.count > 0).then(|| round2(self.sum / self.count as f64))
    }
}

/// Chats closed by a human agent, in input order.
pub(crate) fn agent_closed(records: &[ChatRecord]) -> impl Iterator<Item = &ChatRecord> {
    records.iter().filter(|r| !r.closed_by_system())
}
