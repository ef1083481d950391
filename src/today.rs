//! Today's record lookup and the once-per-day mood upsert
//!
//! Every call starts fresh: query the tracker, keep the records created today
//! in the reference zone, and take the first one in the tracker's newest-first
//! order as canonical. Nothing is cached between calls.
//!
//! Two concurrent `save_today_mood` calls can still both create a record;
//! the tracker is the only serialization point.

use chrono::{DateTime, Utc};

use crate::events::{DomainEvent, EventKind, EventMapper, MoodEntry};
use crate::github::Result;
use crate::tracker::{IssuePatch, IssueTracker, ListFilter, Record, MAX_PAGE_SIZE};

/// Outcome of looking for today's record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodayState {
    NoExistingRecord,
    ExistingRecord(u64),
}

pub struct TodayResolver<'a, T: IssueTracker + ?Sized> {
    tracker: &'a T,
    mapper: &'a EventMapper,
}

impl<'a, T: IssueTracker + ?Sized> TodayResolver<'a, T> {
    pub fn new(tracker: &'a T, mapper: &'a EventMapper) -> Self {
        Self { tracker, mapper }
    }

    fn kind_filter(&self, kind: EventKind) -> ListFilter {
        self.mapper.filter_for(kind).page_size(MAX_PAGE_SIZE)
    }

    /// Records of `kind` created on `now`'s calendar day, in tracker order
    pub fn todays_records_at(&self, kind: EventKind, now: DateTime<Utc>) -> Vec<Record> {
        let today = self.mapper.local_date(now);
        self.tracker
            .list(&self.kind_filter(kind))
            .into_iter()
            .filter(|r| self.mapper.local_date(r.created_at) == today)
            .collect()
    }

    pub fn todays_records(&self, kind: EventKind) -> Vec<Record> {
        self.todays_records_at(kind, Utc::now())
    }

    /// Today's canonical mood record, if any
    pub fn today_mood_at(&self, now: DateTime<Utc>) -> Option<Record> {
        self.todays_records_at(EventKind::Mood, now).into_iter().next()
    }

    pub fn today_mood(&self) -> Option<Record> {
        self.today_mood_at(Utc::now())
    }

    pub fn resolve_at(&self, now: DateTime<Utc>) -> TodayState {
        match self.today_mood_at(now) {
            Some(record) => TodayState::ExistingRecord(record.number),
            None => TodayState::NoExistingRecord,
        }
    }

    /// Create today's mood or overwrite its body.
    ///
    /// Updating touches only the body; title and labels stay as created.
    pub fn save_today_mood_at(&self, content: &str, now: DateTime<Utc>) -> Result<Record> {
        match self.resolve_at(now) {
            TodayState::ExistingRecord(number) => {
                log::info!("updating today's mood (#{})", number);
                self.tracker.update(number, &IssuePatch::body(content))
            }
            TodayState::NoExistingRecord => {
                let encoded = self.mapper.encode(
                    &DomainEvent::Mood(MoodEntry {
                        content: content.to_string(),
                        date: None,
                    }),
                    now,
                );
                self.tracker
                    .create(&encoded.title, &encoded.body, &encoded.labels)
            }
        }
    }

    pub fn save_today_mood(&self, content: &str) -> Result<Record> {
        self.save_today_mood_at(content, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LabelScheme;
    use crate::github::TrackerError;
    use crate::tracker::{InMemoryTracker, IssueState};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap()
    }

    fn mood_labels() -> BTreeSet<String> {
        LabelScheme::default().labels_for(EventKind::Mood)
    }

    fn seed(tracker: &InMemoryTracker, number: u64, created_at: DateTime<Utc>, body: &str) {
        tracker.insert(Record {
            number,
            title: "Mood".to_string(),
            body: body.to_string(),
            labels: mood_labels(),
            state: IssueState::Open,
            created_at,
            author: None,
            html_url: None,
        });
    }

    #[test]
    fn test_no_record_today_creates_one() {
        let tracker = InMemoryTracker::new();
        let mapper = EventMapper::default();
        seed(&tracker, 1, at(17, 9), "yesterday");
        tracker.set_now(at(18, 10));

        let resolver = TodayResolver::new(&tracker, &mapper);
        assert_eq!(resolver.resolve_at(at(18, 10)), TodayState::NoExistingRecord);

        let rec = resolver.save_today_mood_at("fresh", at(18, 10)).unwrap();
        assert_eq!(rec.title, "Mood 2026-10-18");
        assert_eq!(rec.body, "fresh");
        assert_eq!(tracker.records().len(), 2);
    }

    #[test]
    fn test_save_twice_same_day_is_idempotent() {
        let tracker = InMemoryTracker::new();
        let mapper = EventMapper::default();
        let resolver = TodayResolver::new(&tracker, &mapper);

        tracker.set_now(at(18, 8));
        let first = resolver.save_today_mood_at("first", at(18, 8)).unwrap();
        tracker.set_now(at(18, 21));
        let second = resolver.save_today_mood_at("second", at(18, 21)).unwrap();

        assert_eq!(first.number, second.number);
        let moods: Vec<Record> = tracker
            .records()
            .into_iter()
            .filter(|r| r.has_label("mood"))
            .collect();
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].body, "second");
        assert_eq!(moods[0].title, "Mood 2026-10-18");
    }

    #[test]
    fn test_newest_record_of_the_day_wins() {
        let tracker = InMemoryTracker::new();
        let mapper = EventMapper::default();
        seed(&tracker, 1, at(18, 7), "early");
        seed(&tracker, 2, at(18, 12), "noon");

        let resolver = TodayResolver::new(&tracker, &mapper);
        assert_eq!(resolver.resolve_at(at(18, 22)), TodayState::ExistingRecord(2));

        resolver.save_today_mood_at("evening", at(18, 22)).unwrap();
        let records = tracker.records();
        assert_eq!(records[0].body, "early");
        assert_eq!(records[1].body, "evening");
    }

    #[test]
    fn test_day_boundary_follows_reference_zone() {
        let tracker = InMemoryTracker::new();
        // 2026-10-18 20:00 UTC is already the 19th in Shanghai
        seed(&tracker, 1, at(18, 20), "late");

        let utc = EventMapper::default();
        let shanghai = EventMapper::new(LabelScheme::default(), chrono_tz::Asia::Shanghai);

        let now = at(19, 1);
        assert_eq!(
            TodayResolver::new(&tracker, &utc).resolve_at(now),
            TodayState::NoExistingRecord
        );
        assert_eq!(
            TodayResolver::new(&tracker, &shanghai).resolve_at(now),
            TodayState::ExistingRecord(1)
        );
    }

    #[test]
    fn test_update_leaves_title_and_labels() {
        let tracker = InMemoryTracker::new();
        let mapper = EventMapper::default();
        seed(&tracker, 4, at(18, 9), "old");

        let rec = TodayResolver::new(&tracker, &mapper)
            .save_today_mood_at("new", at(18, 10))
            .unwrap();
        assert_eq!(rec.title, "Mood");
        assert_eq!(rec.labels, mood_labels());
    }

    #[test]
    fn test_closed_mood_is_not_reused() {
        let tracker = InMemoryTracker::new();
        let mapper = EventMapper::default();
        let resolver = TodayResolver::new(&tracker, &mapper);

        tracker.set_now(at(18, 8));
        let first = resolver.save_today_mood_at("first", at(18, 8)).unwrap();
        tracker.close(first.number).unwrap();
        assert_eq!(resolver.today_mood_at(at(18, 9)), None);

        tracker.set_now(at(18, 9));
        let second = resolver.save_today_mood_at("second", at(18, 9)).unwrap();
        assert_ne!(first.number, second.number);
        assert_eq!(second.state, IssueState::Open);

        let records = tracker.records();
        assert_eq!(records[0].body, "first");
        assert_eq!(records[0].state, IssueState::Closed);
        assert_eq!(resolver.today_mood_at(at(18, 10)).map(|r| r.body), Some("second".to_string()));
    }

    #[test]
    fn test_anonymous_save_fails_with_auth() {
        let tracker = InMemoryTracker::anonymous();
        let mapper = EventMapper::default();
        let err = TodayResolver::new(&tracker, &mapper)
            .save_today_mood_at("hi", at(18, 9))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Auth));
    }

    #[test]
    fn test_todays_pomodoros() {
        let tracker = InMemoryTracker::new();
        let mapper = EventMapper::default();
        let labels = mapper.labels().labels_for(EventKind::Pomodoro);
        for (day, hour) in [(17, 9), (18, 9), (18, 11)] {
            tracker.set_now(at(day, hour));
            tracker.create("Pomodoro", "{}", &labels).unwrap();
        }

        let today = TodayResolver::new(&tracker, &mapper).todays_records_at(EventKind::Pomodoro, at(18, 12));
        assert_eq!(today.len(), 2);
        assert!(today[0].created_at > today[1].created_at);
    }
}
