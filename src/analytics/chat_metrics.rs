//! Chat volume and bot deflection.

use serde::Serialize;

use super::round2;
use crate::chat::ChatRecord;

pub const METRIC_TOTAL: &str = "Total Chats";
pub const METRIC_BOT: &str = "Closed by Bot";
pub const METRIC_AGENT: &str = "Closed by Agent";
pub const METRIC_DEFLECTION: &str = "Bot Deflection %";

/// Top-level counts for the whole transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSummary {
    pub total: u64,
    pub bot_closed: u64,
    pub agent_closed: u64,
    /// Share of chats closed by the bot, in percent, two decimals. 0 for an empty table.
    pub deflection_pct: f64,
}

/// One `(Metric, Value)` row of the chat sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMetricsRow {
    pub metric: &'static str,
    pub value: f64,
}

impl ChatSummary {
    /// Rows in sheet order: total, bot, agent, deflection.
    pub fn rows(&self) -> [ChatMetricsRow; 4] {
        [
            ChatMetricsRow {
                metric: METRIC_TOTAL,
                value: self.total as f64,
            },
            ChatMetricsRow {
                metric: METRIC_BOT,
                value: self.bot_closed as f64,
            },
            ChatMetricsRow {
                metric: METRIC_AGENT,
                value: self.agent_closed as f64,
            },
            ChatMetricsRow {
                metric: METRIC_DEFLECTION,
                value: self.deflection_pct,
            },
        ]
    }
}

pub fn chat_summary(records: &[ChatRecord]) -> ChatSummary {
    let total = records.len() as u64;
    let bot_closed = records.iter().filter(|r| r.closed_by_system()).count() as u64;
    let deflection_pct = if total > 0 {
        round2(bot_closed as f64 / total as f64 * 100.0)
    } else {
        0.0
    };

    ChatSummary {
        total,
        bot_closed,
        agent_closed: total - bot_closed,
        deflection_pct,
    }
}
