//! Generic issue-tracker records and the `IssueTracker` seam
//!
//! A `Record` is one persisted row (a GitHub Issue). Everything above this
//! module talks to the tracker through the `IssueTracker` trait so the same
//! mapper/resolver/statistics code runs against GitHub or an in-memory store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use crate::github::{Result, TrackerError};

/// Default number of records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page the GitHub API will return
pub const MAX_PAGE_SIZE: u32 = 100;

/// Open/closed state of a record. "Deleting" a record means closing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(IssueState::Open),
            "closed" => Ok(IssueState::Closed),
            other => Err(format!("unknown issue state '{}'", other)),
        }
    }
}

/// A single tracker-backed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    /// Login of the author. Read-only, absent for records we built locally.
    pub author: Option<String>,
    pub html_url: Option<String>,
}

impl Record {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// State filter for `list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StateFilter {
    Open,
    Closed,
    #[default]
    All,
}

impl StateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }

    fn matches(&self, state: IssueState) -> bool {
        match self {
            StateFilter::Open => state == IssueState::Open,
            StateFilter::Closed => state == IssueState::Closed,
            StateFilter::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Query for `IssueTracker::list`. Labels are AND-ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub labels: BTreeSet<String>,
    pub state: StateFilter,
    pub page_size: u32,
    pub page: u32,
    pub direction: SortDirection,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            labels: BTreeSet::new(),
            state: StateFilter::All,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
            direction: SortDirection::Desc,
        }
    }
}

impl ListFilter {
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn state(mut self, state: StateFilter) -> Self {
        self.state = state;
        self
    }

    /// Page size clamped to what the backend accepts
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Query-string pairs in the order GitHub documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("state", self.state.as_str().to_string()),
            ("per_page", self.effective_page_size().to_string()),
            ("page", self.effective_page().to_string()),
            ("sort", "created".to_string()),
            ("direction", self.direction.as_str().to_string()),
        ];
        if !self.labels.is_empty() {
            let joined: Vec<&str> = self.labels.iter().map(String::as_str).collect();
            pairs.push(("labels", joined.join(",")));
        }
        pairs
    }
}

/// Partial update. `None` fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeSet<String>>,
}

impl IssuePatch {
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn state(state: IssueState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}

/// List/create/update against one labeled-issue collection.
///
/// `list` is best-effort: implementations log failures and return an empty
/// vector. Writes fail with `TrackerError::Auth` before touching the network
/// when no credentials are configured.
pub trait IssueTracker {
    fn list(&self, filter: &ListFilter) -> Vec<Record>;

    fn create(&self, title: &str, body: &str, labels: &BTreeSet<String>) -> Result<Record>;

    fn update(&self, number: u64, patch: &IssuePatch) -> Result<Record>;

    fn close(&self, number: u64) -> Result<Record> {
        self.update(number, &IssuePatch::state(IssueState::Closed))
    }

    fn reopen(&self, number: u64) -> Result<Record> {
        self.update(number, &IssuePatch::state(IssueState::Open))
    }
}

/// Tracker kept entirely in memory.
///
/// Mirrors the GitHub semantics the rest of the crate relies on (AND-ed label
/// filters, newest-first ordering, pagination, credential checks). Used by the
/// test suites and handy for dry runs.
#[derive(Debug)]
pub struct InMemoryTracker {
    records: RefCell<Vec<Record>>,
    next_number: Cell<u64>,
    now: Cell<Option<DateTime<Utc>>>,
    writable: bool,
    fail_reads: Cell<bool>,
}

impl Default for InMemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTracker {
    /// Tracker with write credentials
    pub fn new() -> Self {
        Self {
            records: RefCell::new(Vec::new()),
            next_number: Cell::new(1),
            now: Cell::new(None),
            writable: true,
            fail_reads: Cell::new(false),
        }
    }

    /// Tracker without credentials: reads work, writes fail with `Auth`
    pub fn anonymous() -> Self {
        Self {
            writable: false,
            ..Self::new()
        }
    }

    /// Pin the clock used for `created_at` of new records
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.now.set(Some(now));
    }

    /// Make every subsequent `list` behave like a failing backend
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Seed an existing record, keeping its number
    pub fn insert(&self, record: Record) {
        if record.number >= self.next_number.get() {
            self.next_number.set(record.number + 1);
        }
        self.records.borrow_mut().push(record);
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    fn clock(&self) -> DateTime<Utc> {
        self.now.get().unwrap_or_else(Utc::now)
    }
}

impl IssueTracker for InMemoryTracker {
    fn list(&self, filter: &ListFilter) -> Vec<Record> {
        if self.fail_reads.get() {
            log::warn!("in-memory tracker: list failed (simulated)");
            return vec![];
        }

        let mut rows: Vec<Record> = self
            .records
            .borrow()
            .iter()
            .filter(|r| filter.state.matches(r.state))
            .filter(|r| filter.labels.iter().all(|l| r.labels.contains(l)))
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps
        rows.sort_by(|a, b| match filter.direction {
            SortDirection::Asc => a.created_at.cmp(&b.created_at),
            SortDirection::Desc => b.created_at.cmp(&a.created_at),
        });

        let size = filter.effective_page_size() as usize;
        let skip = (filter.effective_page() as usize - 1) * size;
        rows.into_iter().skip(skip).take(size).collect()
    }

    fn create(&self, title: &str, body: &str, labels: &BTreeSet<String>) -> Result<Record> {
        if !self.writable {
            return Err(TrackerError::Auth);
        }
        let number = self.next_number.get();
        self.next_number.set(number + 1);

        let record = Record {
            number,
            title: title.to_string(),
            body: body.to_string(),
            labels: labels.clone(),
            state: IssueState::Open,
            created_at: self.clock(),
            author: Some("local".to_string()),
            html_url: None,
        };
        self.records.borrow_mut().push(record.clone());
        Ok(record)
    }

    fn update(&self, number: u64, patch: &IssuePatch) -> Result<Record> {
        if !self.writable {
            return Err(TrackerError::Auth);
        }
        let mut records = self.records.borrow_mut();
        let record = records
            .iter_mut()
            .find(|r| r.number == number)
            .ok_or_else(|| TrackerError::Remote {
                status: 404,
                message: "Not Found".to_string(),
            })?;

        if let Some(title) = &patch.title {
            record.title = title.clone();
        }
        if let Some(body) = &patch.body {
            record.body = body.clone();
        }
        if let Some(state) = patch.state {
            record.state = state;
        }
        if let Some(labels) = &patch.labels {
            record.labels = labels.clone();
        }
        Ok(record.clone())
    }
}
