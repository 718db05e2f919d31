//! CSAT by shift over agent-closed chats.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{agent_closed, Mean};
use crate::chat::{ChatRecord, Shift};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftMetricsRow {
    pub shift: Shift,
    pub csat_score: Option<f64>,
}

/// Mean CSAT for each shift present, ordered Morning, Evening, Night.
pub fn shift_summary(records: &[ChatRecord]) -> Vec<ShiftMetricsRow> {
    let mut groups: BTreeMap<Shift, Mean> = BTreeMap::new();
    for record in agent_closed(records) {
        groups.entry(record.shift()).or_default().push(record.csat_score);
    }

    groups
        .into_iter()
        .map(|(shift, csat)| ShiftMetricsRow {
            shift,
            csat_score: csat.rounded(),
        })
        .collect()
}

/// Agent-closed chat count per shift.
pub fn shift_chat_counts(records: &[ChatRecord]) -> BTreeMap<Shift, u64> {
    let mut counts = BTreeMap::new();
    for record in agent_closed(records) {
        *counts.entry(record.shift()).or_insert(0) += 1;
    }
    counts
}
