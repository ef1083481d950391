//! Domain events and their mapping onto tracker records
//!
//! Moods, thoughts and pomodoro sessions are stored as issues. `EventMapper`
//! turns a `DomainEvent` into `(title, body, labels)` and reads it back.
//!
//! | Kind | Title | Body |
//! |------|-------|------|
//! | mood | `Mood YYYY-MM-DD` | raw text |
//! | thought | first 50 chars of content | `{"content","timestamp","images"}` |
//! | pomodoro | `Pomodoro - 25 min work` | `{"duration","timestamp","type","completed"}` |

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::tracker::{ListFilter, Record, StateFilter};

/// Characters of thought content kept in the title
pub const TITLE_MAX_CHARS: usize = 50;
pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;

/// Domain category of a logged event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Mood,
    Thought,
    Pomodoro,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Mood, EventKind::Thought, EventKind::Pomodoro];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Mood => "mood",
            EventKind::Thought => "thought",
            EventKind::Pomodoro => "pomodoro",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which labels mark a record as ours and as which kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelScheme {
    /// Marker present on every record this tool writes
    pub namespace: String,
    pub mood: String,
    pub thought: String,
    pub pomodoro: String,
}

impl Default for LabelScheme {
    fn default() -> Self {
        Self {
            namespace: "personal-blog".to_string(),
            mood: "mood".to_string(),
            thought: "thought".to_string(),
            pomodoro: "pomodoro".to_string(),
        }
    }
}

impl LabelScheme {
    pub fn kind_label(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::Mood => &self.mood,
            EventKind::Thought => &self.thought,
            EventKind::Pomodoro => &self.pomodoro,
        }
    }

    /// Kind label plus the namespace marker
    pub fn labels_for(&self, kind: EventKind) -> BTreeSet<String> {
        [self.kind_label(kind).to_string(), self.namespace.clone()]
            .into_iter()
            .collect()
    }

    /// Every kind whose label the record carries. Not exclusive.
    pub fn kinds_of(&self, record: &Record) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| record.has_label(self.kind_label(*kind)))
            .collect()
    }

    /// First matching kind in `EventKind::ALL` order
    pub fn kind_of(&self, record: &Record) -> Option<EventKind> {
        self.kinds_of(record).into_iter().next()
    }

    /// (name, description, color) for every label this scheme uses
    pub fn label_specs(&self) -> Vec<(String, &'static str, &'static str)> {
        vec![
            (self.namespace.clone(), "Written by lifelog", "0e8a16"),
            (self.mood.clone(), "Daily mood entry", "f9d0c4"),
            (self.thought.clone(), "Short thought post", "c5def5"),
            (self.pomodoro.clone(), "Completed pomodoro session", "e99695"),
        ]
    }
}

/// Work or break interval of a pomodoro session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::ShortBreak => "short-break",
            SessionKind::LongBreak => "long-break",
        }
    }

    pub fn default_minutes(&self) -> u32 {
        match self {
            SessionKind::Work => DEFAULT_WORK_MINUTES,
            SessionKind::ShortBreak => DEFAULT_SHORT_BREAK_MINUTES,
            SessionKind::LongBreak => DEFAULT_LONG_BREAK_MINUTES,
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionKind::Work)
    }

    fn describe(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::ShortBreak => "short break",
            SessionKind::LongBreak => "long break",
        }
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            // "pomodoro" is what older bodies carry in their type field
            "work" | "focus" | "pomodoro" => Ok(SessionKind::Work),
            "short-break" | "short" | "break" => Ok(SessionKind::ShortBreak),
            "long-break" | "long" => Ok(SessionKind::LongBreak),
            other => Err(format!(
                "unknown session kind '{}' (expected work, short-break or long-break)",
                other
            )),
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodEntry {
    pub content: String,
    /// Calendar day in the reference zone, filled in on decode
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThoughtPost {
    pub content: String,
    /// When absent, encode stamps the current time
    pub timestamp: Option<DateTime<Utc>>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroRecord {
    pub duration_minutes: u32,
    pub kind: SessionKind,
    pub completed: bool,
    pub timestamp: Option<DateTime<Utc>>,
    /// Free text recovered from bodies that were not JSON
    pub note: Option<String>,
}

impl PomodoroRecord {
    pub fn completed(kind: SessionKind, duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            kind,
            completed: true,
            timestamp: None,
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    Mood(MoodEntry),
    Thought(ThoughtPost),
    Pomodoro(PomodoroRecord),
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::Mood(_) => EventKind::Mood,
            DomainEvent::Thought(_) => EventKind::Thought,
            DomainEvent::Pomodoro(_) => EventKind::Pomodoro,
        }
    }
}

/// Tracker-level representation of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEvent {
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
}

/// Malformed structured body. Always absorbed by `decode`.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("body is not a {kind} payload: {source}")]
    Payload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize)]
struct ThoughtPayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct PomodoroPayload {
    #[serde(default = "default_duration")]
    duration: u32,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(rename = "type", default)]
    session: Option<String>,
    #[serde(default = "default_completed")]
    completed: bool,
}

fn default_duration() -> u32 {
    DEFAULT_WORK_MINUTES
}

fn default_completed() -> bool {
    true
}

/// Encodes and decodes domain events against one label scheme and zone
#[derive(Debug, Clone)]
pub struct EventMapper {
    labels: LabelScheme,
    tz: Tz,
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new(LabelScheme::default(), Tz::UTC)
    }
}

impl EventMapper {
    pub fn new(labels: LabelScheme, tz: Tz) -> Self {
        Self { labels, tz }
    }

    pub fn labels(&self) -> &LabelScheme {
        &self.labels
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Calendar day of an instant in the reference zone
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// Open records of one kind, newest first. Closed records count as deleted.
    pub fn filter_for(&self, kind: EventKind) -> ListFilter {
        ListFilter::with_labels(self.labels.labels_for(kind)).state(StateFilter::Open)
    }

    /// Every open record this tool wrote, newest first
    pub fn namespace_filter(&self) -> ListFilter {
        ListFilter::with_labels([self.labels.namespace.clone()]).state(StateFilter::Open)
    }

    fn stamp(&self, at: DateTime<Utc>) -> String {
        at.trunc_subsecs(0)
            .with_timezone(&self.tz)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn parse_stamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
        raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Build the title, body and labels for an event.
    ///
    /// Output depends only on the event and `now` truncated to whole seconds.
    pub fn encode(&self, event: &DomainEvent, now: DateTime<Utc>) -> EncodedEvent {
        let now = now.trunc_subsecs(0);
        let labels = self.labels.labels_for(event.kind());

        match event {
            DomainEvent::Mood(mood) => {
                let date = mood.date.unwrap_or_else(|| self.local_date(now));
                EncodedEvent {
                    title: format!("Mood {}", date.format("%Y-%m-%d")),
                    body: mood.content.clone(),
                    labels,
                }
            }
            DomainEvent::Thought(post) => {
                let at = post.timestamp.unwrap_or(now);
                let payload = ThoughtPayload {
                    content: post.content.clone(),
                    timestamp: Some(self.stamp(at)),
                    images: post.images.clone(),
                };
                EncodedEvent {
                    title: self.thought_title(&post.content, at),
                    body: serde_json::json!(payload).to_string(),
                    labels,
                }
            }
            DomainEvent::Pomodoro(session) => {
                let at = session.timestamp.unwrap_or(now);
                let payload = PomodoroPayload {
                    duration: session.duration_minutes,
                    timestamp: Some(self.stamp(at)),
                    session: Some(session.kind.as_str().to_string()),
                    completed: session.completed,
                };
                EncodedEvent {
                    title: format!(
                        "Pomodoro - {} min {}",
                        session.duration_minutes,
                        session.kind.describe()
                    ),
                    body: serde_json::json!(payload).to_string(),
                    labels,
                }
            }
        }
    }

    fn thought_title(&self, content: &str, at: DateTime<Utc>) -> String {
        let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.is_empty() {
            let local = at.with_timezone(&self.tz);
            return format!("Thought {}", local.format("%Y-%m-%d %H:%M:%S"));
        }
        truncate_title(&flat, TITLE_MAX_CHARS)
    }

    /// Read a record back into a domain event.
    ///
    /// Returns `None` only when the record carries none of the kind labels.
    /// Bodies that are not valid structured payloads never fail: the raw body
    /// (or the title when the body is empty) becomes the content.
    pub fn decode(&self, record: &Record) -> Option<DomainEvent> {
        let event = match self.labels.kind_of(record)? {
            EventKind::Mood => DomainEvent::Mood(MoodEntry {
                content: record.body.clone(),
                date: Some(self.local_date(record.created_at)),
            }),
            EventKind::Thought => DomainEvent::Thought(match parse_thought(&record.body) {
                Ok(payload) => {
                    let content = if payload.content.trim().is_empty() {
                        log::debug!("issue #{}: thought payload has no content", record.number);
                        record.title.clone()
                    } else {
                        payload.content
                    };
                    ThoughtPost {
                        content,
                        timestamp: Self::parse_stamp(payload.timestamp.as_deref())
                            .or(Some(record.created_at)),
                        images: payload.images,
                    }
                }
                Err(e) => {
                    log::debug!("issue #{}: {}", record.number, e);
                    ThoughtPost {
                        content: fallback_content(record),
                        timestamp: Some(record.created_at),
                        images: vec![],
                    }
                }
            }),
            EventKind::Pomodoro => DomainEvent::Pomodoro(match parse_pomodoro(&record.body) {
                Ok(payload) => PomodoroRecord {
                    duration_minutes: payload.duration,
                    kind: payload
                        .session
                        .as_deref()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(SessionKind::Work),
                    completed: payload.completed,
                    timestamp: Self::parse_stamp(payload.timestamp.as_deref())
                        .or(Some(record.created_at)),
                    note: None,
                },
                Err(e) => {
                    log::debug!("issue #{}: {}", record.number, e);
                    PomodoroRecord {
                        duration_minutes: DEFAULT_WORK_MINUTES,
                        kind: SessionKind::Work,
                        completed: true,
                        timestamp: Some(record.created_at),
                        note: Some(fallback_content(record)),
                    }
                }
            }),
        };
        Some(event)
    }
}

fn parse_thought(body: &str) -> Result<ThoughtPayload, DecodeError> {
    serde_json::from_str(body).map_err(|source| DecodeError::Payload {
        kind: EventKind::Thought,
        source,
    })
}

fn parse_pomodoro(body: &str) -> Result<PomodoroPayload, DecodeError> {
    serde_json::from_str(body).map_err(|source| DecodeError::Payload {
        kind: EventKind::Pomodoro,
        source,
    })
}

fn fallback_content(record: &Record) -> String {
    if record.body.trim().is_empty() {
        record.title.clone()
    } else {
        record.body.clone()
    }
}

/// Keep at most `max` characters, appending "..." when cut
pub fn truncate_title(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::IssueState;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn record(labels: &[&str], title: &str, body: &str) -> Record {
        Record {
            number: 3,
            title: title.to_string(),
            body: body.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            state: IssueState::Open,
            created_at: at(2026, 10, 18, 9, 0),
            author: None,
            html_url: None,
        }
    }

    fn as_record(encoded: &EncodedEvent) -> Record {
        Record {
            number: 1,
            title: encoded.title.clone(),
            body: encoded.body.clone(),
            labels: encoded.labels.clone(),
            state: IssueState::Open,
            created_at: at(2026, 10, 18, 9, 0),
            author: None,
            html_url: None,
        }
    }

    #[test]
    fn test_mood_encoding() {
        let mapper = EventMapper::default();
        let encoded = mapper.encode(
            &DomainEvent::Mood(MoodEntry {
                content: "calm, a bit tired".to_string(),
                date: None,
            }),
            at(2026, 10, 18, 23, 59),
        );

        assert_eq!(encoded.title, "Mood 2026-10-18");
        assert_eq!(encoded.body, "calm, a bit tired");
        assert!(encoded.labels.contains("mood"));
        assert!(encoded.labels.contains("personal-blog"));
    }

    #[test]
    fn test_mood_title_uses_reference_zone() {
        let mapper = EventMapper::new(LabelScheme::default(), chrono_tz::Asia::Shanghai);
        let encoded = mapper.encode(
            &DomainEvent::Mood(MoodEntry {
                content: "late".to_string(),
                date: None,
            }),
            at(2026, 10, 18, 20, 0),
        );
        assert_eq!(encoded.title, "Mood 2026-10-19");
    }

    #[test]
    fn test_every_encoding_carries_namespace_marker() {
        let mapper = EventMapper::default();
        let now = at(2026, 1, 1, 0, 0);
        let events = [
            DomainEvent::Mood(MoodEntry {
                content: String::new(),
                date: None,
            }),
            DomainEvent::Thought(ThoughtPost {
                content: "x".to_string(),
                timestamp: None,
                images: vec![],
            }),
            DomainEvent::Pomodoro(PomodoroRecord::completed(SessionKind::Work, 25)),
        ];
        for event in &events {
            let encoded = mapper.encode(event, now);
            assert!(encoded.labels.contains("personal-blog"));
            assert_eq!(encoded.labels.len(), 2);
        }
    }

    #[test]
    fn test_thought_title_truncates_long_content() {
        let mapper = EventMapper::default();
        let content = "a".repeat(60);
        let encoded = mapper.encode(
            &DomainEvent::Thought(ThoughtPost {
                content,
                timestamp: None,
                images: vec![],
            }),
            at(2026, 10, 18, 9, 0),
        );
        assert_eq!(encoded.title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_thought_title_without_content_is_timestamp() {
        let mapper = EventMapper::default();
        let encoded = mapper.encode(
            &DomainEvent::Thought(ThoughtPost {
                content: "   ".to_string(),
                timestamp: None,
                images: vec!["https://img.example/1.png".to_string()],
            }),
            at(2026, 10, 18, 9, 5),
        );
        assert_eq!(encoded.title, "Thought 2026-10-18 09:05:00");
    }

    #[test]
    fn test_thought_body_is_explicit_json() {
        let mapper = EventMapper::default();
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap()
            + chrono::Duration::milliseconds(640);
        let encoded = mapper.encode(
            &DomainEvent::Thought(ThoughtPost {
                content: "hello".to_string(),
                timestamp: None,
                images: vec![],
            }),
            now,
        );
        let body: serde_json::Value = serde_json::from_str(&encoded.body).unwrap();
        assert_eq!(body["content"], "hello");
        assert_eq!(body["timestamp"], "2026-10-18T09:05:07Z");
        assert_eq!(body["images"], serde_json::json!([]));
    }

    #[test]
    fn test_encode_is_deterministic_at_second_granularity() {
        let mapper = EventMapper::default();
        let event = DomainEvent::Pomodoro(PomodoroRecord::completed(SessionKind::Work, 25));
        let base = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap();
        let a = mapper.encode(&event, base + chrono::Duration::milliseconds(10));
        let b = mapper.encode(&event, base + chrono::Duration::milliseconds(990));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pomodoro_encoding() {
        let mapper = EventMapper::default();
        let encoded = mapper.encode(
            &DomainEvent::Pomodoro(PomodoroRecord::completed(SessionKind::ShortBreak, 5)),
            at(2026, 10, 18, 9, 0),
        );
        assert_eq!(encoded.title, "Pomodoro - 5 min short break");
        let body: serde_json::Value = serde_json::from_str(&encoded.body).unwrap();
        assert_eq!(body["duration"], 5);
        assert_eq!(body["type"], "short-break");
        assert_eq!(body["completed"], true);
        assert!(encoded.labels.contains("pomodoro"));
    }

    #[test]
    fn test_thought_round_trip() {
        let mapper = EventMapper::new(LabelScheme::default(), chrono_tz::Asia::Shanghai);
        let post = ThoughtPost {
            content: "Rust lifetimes finally clicked".to_string(),
            timestamp: Some(at(2026, 10, 18, 1, 2)),
            images: vec!["https://img.example/a.png".to_string()],
        };
        let encoded = mapper.encode(&DomainEvent::Thought(post.clone()), at(2026, 10, 18, 3, 0));
        let decoded = mapper.decode(&as_record(&encoded)).unwrap();
        assert_eq!(decoded, DomainEvent::Thought(post));
    }

    #[test]
    fn test_pomodoro_round_trip() {
        let mapper = EventMapper::default();
        let mut session = PomodoroRecord::completed(SessionKind::LongBreak, 15);
        session.timestamp = Some(at(2026, 10, 18, 10, 30));
        let encoded = mapper.encode(&DomainEvent::Pomodoro(session.clone()), at(2026, 10, 18, 11, 0));
        let decoded = mapper.decode(&as_record(&encoded)).unwrap();
        assert_eq!(decoded, DomainEvent::Pomodoro(session));
    }

    #[test]
    fn test_decode_plain_text_thought_falls_back_to_body() {
        let mapper = EventMapper::default();
        let rec = record(&["thought"], "Thought", "not json at all");
        match mapper.decode(&rec).unwrap() {
            DomainEvent::Thought(post) => {
                assert_eq!(post.content, "not json at all");
                assert_eq!(post.timestamp, Some(rec.created_at));
                assert!(post.images.is_empty());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_thought_body_falls_back_to_title() {
        let mapper = EventMapper::default();
        let rec = record(&["thought", "personal-blog"], "Thought 2026-10-18", "");
        match mapper.decode(&rec).unwrap() {
            DomainEvent::Thought(post) => assert_eq!(post.content, "Thought 2026-10-18"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_thought_payload_without_content_uses_title() {
        let mapper = EventMapper::default();
        for body in ["{}", r#"{"text":"hello"}"#, r#"{"content":"  ","images":["a.png"]}"#] {
            let rec = record(&["thought", "personal-blog"], "My real title", body);
            match mapper.decode(&rec).unwrap() {
                DomainEvent::Thought(post) => assert_eq!(post.content, "My real title"),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_kind_filters_skip_closed_records() {
        let mapper = EventMapper::default();
        assert_eq!(mapper.filter_for(EventKind::Mood).state, StateFilter::Open);
        assert_eq!(mapper.namespace_filter().state, StateFilter::Open);
    }

    #[test]
    fn test_decode_legacy_pomodoro_payload() {
        let mapper = EventMapper::default();
        let rec = record(
            &["pomodoro"],
            "Pomodoro",
            r#"{"duration":25,"timestamp":"2025/1/2 10:00:00","type":"pomodoro"}"#,
        );
        match mapper.decode(&rec).unwrap() {
            DomainEvent::Pomodoro(session) => {
                assert_eq!(session.duration_minutes, 25);
                assert_eq!(session.kind, SessionKind::Work);
                assert!(session.completed);
                // Unparseable timestamp falls back to creation time
                assert_eq!(session.timestamp, Some(rec.created_at));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_plain_text_pomodoro_keeps_note() {
        let mapper = EventMapper::default();
        let rec = record(&["pomodoro", "personal-blog"], "Pomodoro", "finished 25 minutes");
        match mapper.decode(&rec).unwrap() {
            DomainEvent::Pomodoro(session) => {
                assert_eq!(session.duration_minutes, DEFAULT_WORK_MINUTES);
                assert_eq!(session.note.as_deref(), Some("finished 25 minutes"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_mood_carries_local_date() {
        let mapper = EventMapper::new(LabelScheme::default(), chrono_tz::America::New_York);
        let rec = record(&["mood", "personal-blog"], "Mood", "ok");
        match mapper.decode(&rec).unwrap() {
            DomainEvent::Mood(mood) => {
                assert_eq!(mood.content, "ok");
                assert_eq!(mood.date, NaiveDate::from_ymd_opt(2026, 10, 18));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unrelated_record_is_none() {
        let mapper = EventMapper::default();
        assert!(mapper.decode(&record(&["bug"], "crash", "")).is_none());
        assert!(mapper.decode(&record(&["personal-blog"], "x", "")).is_none());
    }

    #[test]
    fn test_kinds_are_not_exclusive() {
        let scheme = LabelScheme::default();
        let rec = record(&["thought", "pomodoro"], "both", "");
        assert_eq!(
            scheme.kinds_of(&rec),
            vec![EventKind::Thought, EventKind::Pomodoro]
        );
        assert_eq!(scheme.kind_of(&rec), Some(EventKind::Thought));
    }

    #[test]
    fn test_session_kind_parse() {
        assert_eq!("work".parse::<SessionKind>().unwrap(), SessionKind::Work);
        assert_eq!("short_break".parse::<SessionKind>().unwrap(), SessionKind::ShortBreak);
        assert_eq!("Long-Break".parse::<SessionKind>().unwrap(), SessionKind::LongBreak);
        assert!("nap".parse::<SessionKind>().is_err());
    }

    #[test]
    fn test_truncate_title_multibyte() {
        assert_eq!(truncate_title("心情很好", 2), "心情...");
        assert_eq!(truncate_title("short", 50), "short");
    }

    proptest! {
        #[test]
        fn prop_truncated_title_is_prefix_within_limit(s in "\\PC{0,120}") {
            let title = truncate_title(&s, TITLE_MAX_CHARS);
            let kept = title.strip_suffix("...").unwrap_or(&title);
            prop_assert!(s.starts_with(kept));
            prop_assert!(kept.chars().count() <= TITLE_MAX_CHARS);
            if s.chars().count() <= TITLE_MAX_CHARS {
                prop_assert_eq!(&title, &s);
            }
        }
    }
}
