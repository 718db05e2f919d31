//! Per-agent performance over agent-closed chats.

use serde::Serialize;
use std::collections::HashMap;

use super::{agent_closed, Mean};
use crate::chat::ChatRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentMetricsRow {
    pub agent: String,
    pub response_minutes: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub csat_score: Option<f64>,
}

#[derive(Default)]
struct AgentAccumulator {
    response: Mean,
    duration: Mean,
    csat: Mean,
}

/// One row per agent, in order of first appearance. Chats with a blank
/// `ClosedBy` have no agent and are left out.
pub fn agent_summary(records: &[ChatRecord]) -> Vec<AgentMetricsRow> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, AgentAccumulator> = HashMap::new();

    for record in agent_closed(records) {
        let Some(agent) = record.agent() else {
            continue;
        };
        let acc = groups.entry(agent).or_insert_with(|| {
            order.push(agent);
            AgentAccumulator::default()
        });
        acc.response.push(record.response_minutes());
        acc.duration.push(record.duration_minutes());
        acc.csat.push(record.csat_score);
    }

    order
        .into_iter()
        .map(|agent| {
            let acc = &groups[agent];
            AgentMetricsRow {
                agent: agent.to_string(),
                response_minutes: acc.response.rounded(),
                duration_minutes: acc.duration.rounded(),
                csat_score: acc.csat.rounded(),
            }
        })
        .collect()
}
