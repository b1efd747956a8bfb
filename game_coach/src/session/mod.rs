//! Per-(profile, zone) coaching session state.

use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use zone_progress::ProgressSnapshot;

/// Categories of coaching message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Welcome,
    Celebration,
    Mastery,
    Encouragement,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageKind::Welcome => "welcome",
            MessageKind::Celebration => "celebration",
            MessageKind::Mastery => "mastery",
            MessageKind::Encouragement => "encouragement",
        };
        f.write_str(name)
    }
}

/// Everything the coach remembers about one player in one zone.
///
/// Stored as JSON; a record from an earlier calendar day is replaced by a
/// fresh one on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachSession {
    pub session_id: Uuid,
    pub first_visit: bool,
    pub visit_count: u32,
    /// Epoch ms of the last message actually shown.
    pub last_coach_time: Option<i64>,
    /// Oldest first.
    pub messages_shown: VecDeque<MessageKind>,
    pub last_progress: ProgressSnapshot,
    pub stuck_counter: u32,
    pub last_visit_time: i64,
    pub session_start_time: i64,
}

impl CoachSession {
    /// A session that has not seen any decision yet.
    pub fn fresh(now_ms: i64) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            first_visit: true,
            visit_count: 0,
            last_coach_time: None,
            messages_shown: VecDeque::new(),
            last_progress: ProgressSnapshot::new(),
            stuck_counter: 0,
            last_visit_time: now_ms,
            session_start_time: now_ms,
        }
    }

    /// Append to the shown history, evicting the oldest entries past `limit`.
    pub fn push_shown(&mut self, kind: MessageKind, limit: usize) {
        self.messages_shown.push_back(kind);
        while self.messages_shown.len() > limit {
            self.messages_shown.pop_front();
        }
    }

    pub fn has_shown(&self, kind: MessageKind) -> bool {
        self.messages_shown.contains(&kind)
    }

    /// Whether `kind` is among the latest `window` history entries.
    pub fn shown_recently(&self, kind: MessageKind, window: usize) -> bool {
        self.messages_shown.iter().rev().take(window).any(|k| *k == kind)
    }

    /// True while `now_ms` is within `cooldown_ms` of the last shown message.
    pub fn in_cooldown(&self, now_ms: i64, cooldown_ms: i64) -> bool {
        self.last_coach_time
            .map(|shown| now_ms.saturating_sub(shown) < cooldown_ms)
            .unwrap_or(false)
    }

    /// Whether the last visit happened on a different calendar day than `now_ms`.
    pub fn is_stale(&self, now_ms: i64, utc_offset_minutes: i32) -> bool {
        match (
            calendar_day(self.last_visit_time, utc_offset_minutes),
            calendar_day(now_ms, utc_offset_minutes),
        ) {
            (Some(last), Some(today)) => last != today,
            _ => true,
        }
    }
}

/// The calendar date of an epoch-ms timestamp at the given UTC offset.
pub fn calendar_day(epoch_ms: i64, utc_offset_minutes: i32) -> Option<NaiveDate> {
    let offset = FixedOffset::east_opt(utc_offset_minutes.checked_mul(60)?)?;
    offset
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|dt| dt.date_naive())
}
