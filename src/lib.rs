//! Lifelog - moods, thoughts and pomodoro sessions stored as GitHub Issues
//!
//! Every entry is an issue in one repository, tagged with a namespace label
//! plus one label per kind. Reads go straight to the tracker; nothing is
//! cached locally except the login session.
//!
//! # Event kinds
//!
//! | Kind | Label | Body |
//! |------|-------|------|
//! | mood | `mood` | plain text, one record per day |
//! | thought | `thought` | `{content, timestamp, images}` |
//! | pomodoro | `pomodoro` | `{duration, timestamp, type, completed}` |
//!
//! # Quick Start
//!
//! ```no_run
//! use lifelog::{Config, GitHubClient, TodayResolver};
//!
//! let config = Config::load();
//! let mapper = config.mapper().unwrap();
//! let client = GitHubClient::new(
//!     &config.repo.api_base,
//!     config.repo_ref().unwrap(),
//!     std::env::var("LIFELOG_TOKEN").ok(),
//!     &config.http,
//! )
//! .unwrap();
//!
//! // Create or overwrite today's mood
//! let record = TodayResolver::new(&client, &mapper).save_today_mood("calm").unwrap();
//! println!("#{} {}", record.number, record.title);
//!
//! let stats = lifelog::fetch_statistics(&client, &mapper, chrono::Utc::now());
//! println!("streak: {} days", stats.streak_days);
//! ```

pub mod config;
pub mod events;
pub mod github;
pub mod oauth;
pub mod serve;
pub mod session;
pub mod stats;
pub mod timer;
pub mod today;
pub mod tracker;

pub use config::Config;
pub use events::{
    DomainEvent, EncodedEvent, EventKind, EventMapper, LabelScheme, MoodEntry, PomodoroRecord,
    SessionKind, ThoughtPost,
};
pub use github::{ensure_labels, Connection, GitHubClient, RepoRef, TrackerError};
pub use oauth::{authorize_url, CodeExchange, OAuthExchanger, TokenExchange};
pub use session::{Session, SessionStore};
pub use stats::{compute_statistics, fetch_statistics, Statistics};
pub use timer::{PomodoroTimer, TimerEvent};
pub use today::{TodayResolver, TodayState};
pub use tracker::{InMemoryTracker, IssuePatch, IssueState, IssueTracker, ListFilter, Record};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Core types are reachable from the crate root
        let mapper = EventMapper::default();
        let tracker = InMemoryTracker::new();
        assert_eq!(
            TodayResolver::new(&tracker, &mapper).resolve_at(chrono::Utc::now()),
            TodayState::NoExistingRecord
        );
        assert_eq!(
            fetch_statistics(&tracker, &mapper, chrono::Utc::now()),
            Statistics::default()
        );
    }
}
