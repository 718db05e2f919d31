//! Chat transcript rows and the shift buckets derived from them

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::fmt;

/// `ClosedBy` value marking chats closed by the bot, compared case-insensitively.
pub const SYSTEM_CLOSER: &str = "system";

/// One row of the transcript dump.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRecord {
    /// Who closed the chat. `None` when the cell was empty.
    pub closed_by: Option<String>,
    /// `None` when the cell was blank.
    pub chat_start: Option<NaiveDateTime>,
    /// `None` when the cell was blank, e.g. a chat still open at export time.
    pub chat_end: Option<NaiveDateTime>,
    /// Seconds until the first agent reply.
    pub first_response_secs: Option<f64>,
    pub csat_score: Option<f64>,
}

impl ChatRecord {
    /// True when the chat was closed by the bot rather than an agent.
    pub fn closed_by_system(&self) -> bool {
        self.closed_by
            .as_deref()
            .is_some_and(|who| who.to_lowercase() == SYSTEM_CLOSER)
    }

    /// Agent identity for agent-closed chats with a non-empty `ClosedBy`.
    pub fn agent(&self) -> Option<&str> {
        if self.closed_by_system() {
            return None;
        }
        self.closed_by.as_deref()
    }

    pub fn response_minutes(&self) -> Option<f64> {
        self.first_response_secs.map(|secs| secs / 60.0)
    }

    /// Wall-clock chat length in minutes. Negative if the end precedes the start,
    /// `None` if either end is missing.
    pub fn duration_minutes(&self) -> Option<f64> {
        let (start, end) = (self.chat_start?, self.chat_end?);
        Some((end - start).num_milliseconds() as f64 / 60_000.0)
    }

    /// Shift of the start hour. A chat without a start time has no hour and
    /// lands in Night, like any hour outside the day shifts.
    pub fn shift(&self) -> Shift {
        self.chat_start
            .map_or(Shift::Night, |start| Shift::from_hour(start.hour()))
    }
}

/// Time-of-day bucket a chat falls into, by start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Shift {
    Morning,
    Evening,
    Night,
}

impl Shift {
    /// `[9,15)` Morning, `[15,21)` Evening, everything else Night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            9..=14 => Shift::Morning,
            15..=20 => Shift::Evening,
            _ => Shift::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Morning => "Morning",
            Shift::Evening => "Evening",
            Shift::Night => "Night",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
