//! Temporary message ids.

use chrono::Utc;

/// Issues ids for messages that exist only locally.
///
/// Ids follow the wall clock in milliseconds and are bumped past the last
/// issued id, so they are strictly increasing even when several are taken
/// within the same millisecond or the clock steps backwards.
#[derive(Debug, Clone, Default)]
pub struct TempIdGenerator {
    last: i64,
}

impl TempIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_ms: i64) -> i64 {
        let id = now_ms.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    /// The most recently issued id, or 0.
    pub fn last_id(&self) -> i64 {
        self.last
    }
}
