//! Counts per event kind and the consecutive-day streak
//!
//! Always recomputed from the full record set; nothing is cached.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::events::{EventKind, EventMapper};
use crate::tracker::{IssueTracker, Record, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub thought_count: usize,
    pub pomodoro_count: usize,
    pub mood_count: usize,
    pub streak_days: u32,
}

/// Derive statistics from records, with "today" taken from `now` in the
/// mapper's reference zone.
///
/// Kind counts are independent: a record labelled both `thought` and
/// `pomodoro` counts once for each.
pub fn compute_statistics(records: &[Record], mapper: &EventMapper, now: DateTime<Utc>) -> Statistics {
    let mut stats = Statistics::default();
    for record in records {
        for kind in mapper.labels().kinds_of(record) {
            match kind {
                EventKind::Mood => stats.mood_count += 1,
                EventKind::Thought => stats.thought_count += 1,
                EventKind::Pomodoro => stats.pomodoro_count += 1,
            }
        }
    }

    let dates: BTreeSet<NaiveDate> = records
        .iter()
        .map(|r| mapper.local_date(r.created_at))
        .collect();
    stats.streak_days = streak_from(&dates, mapper.local_date(now));
    stats
}

/// Consecutive days present in `dates`, walking back from `today`.
/// Zero when `today` itself is missing.
pub fn streak_from(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut expected = Some(today);
    while let Some(day) = expected {
        if !dates.contains(&day) {
            break;
        }
        streak += 1;
        expected = day.checked_sub_days(Days::new(1));
    }
    streak
}

/// Fetch every record in the namespace (one page) and compute statistics
pub fn fetch_statistics<T: IssueTracker + ?Sized>(
    tracker: &T,
    mapper: &EventMapper,
    now: DateTime<Utc>,
) -> Statistics {
    let records = tracker.list(&mapper.namespace_filter().page_size(MAX_PAGE_SIZE));
    compute_statistics(&records, mapper, now)
}
