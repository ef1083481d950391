//! GitHub REST API integration
//!
//! Thin, retry-free wrapper around the issues endpoints of one repository.
//! Reads work anonymously and degrade to an empty result on failure; writes
//! need a token and surface every failure as a typed error.

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::events::LabelScheme;
use crate::tracker::{IssuePatch, IssueState, IssueTracker, ListFilter, Record};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Error type for tracker operations
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Not authenticated with GitHub. Run 'lifelog login' or set LIFELOG_TOKEN.")]
    Auth,

    #[error("GitHub API error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse GitHub response: {0}")]
    Parse(String),
}

impl TrackerError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TrackerError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// `owner/repo` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| format!("invalid repository '{}', expected owner/repo", raw))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(format!("invalid repository '{}', expected owner/repo", raw));
        }
        Ok(Self::new(owner, name))
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// Token is valid, authenticated as this login
    User(String),
    /// No token, but the repository is publicly readable
    PublicRepo(String),
}

// Labels come back as objects; very old payloads used bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelRef {
    Named { name: String },
    Plain(String),
}

impl LabelRef {
    fn into_name(self) -> String {
        match self {
            LabelRef::Named { name } => name,
            LabelRef::Plain(name) => name,
        }
    }
}

#[derive(Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Deserialize)]
struct IssueResponse {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<LabelRef>,
    state: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl IssueResponse {
    fn into_record(self) -> Record {
        Record {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            labels: self.labels.into_iter().map(LabelRef::into_name).collect(),
            state: self.state.parse().unwrap_or(IssueState::Open),
            created_at: self.created_at,
            author: self.user.map(|u| u.login),
            html_url: self.html_url,
        }
    }
}

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a BTreeSet<String>,
}

/// GitHub client for one repository
pub struct GitHubClient {
    http: Client,
    api_base: String,
    repo: RepoRef,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client. An empty token counts as no token.
    pub fn new(
        api_base: &str,
        repo: RepoRef,
        token: Option<String>,
        http: &HttpConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_base, self.repo.owner, self.repo.name, suffix
        )
    }

    fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    fn require_token(&self) -> Result<()> {
        if self.token.is_none() {
            return Err(TrackerError::Auth);
        }
        Ok(())
    }

    fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, action: &str) -> Result<T> {
        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(TrackerError::Remote {
                status: status.as_u16(),
                message: remote_message(&text, status.canonical_reason()),
            });
        }
        resp.json::<T>()
            .map_err(|e| TrackerError::Parse(format!("{}: {}", action, e)))
    }

    /// List issues, propagating failures. Pull requests are dropped.
    pub fn try_list_issues(&self, filter: &ListFilter) -> Result<Vec<Record>> {
        let req = self
            .request(Method::GET, self.repo_url("/issues"))
            .query(&filter.query_pairs());
        let items: Vec<IssueResponse> = self.send_json(req, "list issues")?;

        Ok(items
            .into_iter()
            .filter(|item| item.pull_request.is_none())
            .map(IssueResponse::into_record)
            .collect())
    }

    /// Create a new issue
    pub fn create_issue(&self, title: &str, body: &str, labels: &BTreeSet<String>) -> Result<Record> {
        self.require_token()?;
        let req = self
            .request(Method::POST, self.repo_url("/issues"))
            .json(&CreateIssueRequest { title, body, labels });
        let issue: IssueResponse = self.send_json(req, "create issue")?;
        log::info!("created issue #{} in {}", issue.number, self.repo);
        Ok(issue.into_record())
    }

    /// Apply a partial update to an issue
    pub fn update_issue(&self, number: u64, patch: &IssuePatch) -> Result<Record> {
        self.require_token()?;
        let req = self
            .request(Method::PATCH, self.repo_url(&format!("/issues/{}", number)))
            .json(patch);
        let issue: IssueResponse = self.send_json(req, "update issue")?;
        log::info!("updated issue #{} in {}", issue.number, self.repo);
        Ok(issue.into_record())
    }

    /// Authenticated: who am I. Anonymous: is the repository readable.
    pub fn check_connection(&self) -> Result<Connection> {
        #[derive(Deserialize)]
        struct RepoResponse {
            full_name: String,
        }

        if self.token.is_some() {
            let req = self.request(Method::GET, format!("{}/user", self.api_base));
            let user: UserRef = self.send_json(req, "fetch user")?;
            Ok(Connection::User(user.login))
        } else {
            let req = self.request(Method::GET, self.repo_url(""));
            let repo: RepoResponse = self.send_json(req, "fetch repository")?;
            Ok(Connection::PublicRepo(repo.full_name))
        }
    }

    fn label_url(&self, name: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.repo_url("/labels"))
            .map_err(|e| TrackerError::Parse(format!("invalid API base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| TrackerError::Parse("API base cannot carry a path".to_string()))?
            .push(name);
        Ok(url)
    }

    /// Check if a label exists
    pub fn label_exists(&self, name: &str) -> Result<bool> {
        let resp = self.request(Method::GET, self.label_url(name)?).send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(true);
        }
        if status.as_u16() == 404 {
            return Ok(false);
        }
        let text = resp.text().unwrap_or_default();
        Err(TrackerError::Remote {
            status: status.as_u16(),
            message: remote_message(&text, status.canonical_reason()),
        })
    }

    /// Create a label
    pub fn create_label(&self, name: &str, description: &str, color: &str) -> Result<()> {
        self.require_token()?;
        let req = self
            .request(Method::POST, self.repo_url("/labels"))
            .json(&serde_json::json!({
                "name": name,
                "description": description,
                "color": color,
            }));
        let _: serde_json::Value = self.send_json(req, "create label")?;
        Ok(())
    }
}

impl IssueTracker for GitHubClient {
    fn list(&self, filter: &ListFilter) -> Vec<Record> {
        match self.try_list_issues(filter) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("listing issues in {} failed: {}", self.repo, e);
                vec![]
            }
        }
    }

    fn create(&self, title: &str, body: &str, labels: &BTreeSet<String>) -> Result<Record> {
        self.create_issue(title, body, labels)
    }

    fn update(&self, number: u64, patch: &IssuePatch) -> Result<Record> {
        self.update_issue(number, patch)
    }
}

/// Prefer the `message` field GitHub puts in error bodies
fn remote_message(text: &str, reason: Option<&str>) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    if let Ok(body) = serde_json::from_str::<ErrorBody>(text) {
        return body.message;
    }
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    reason.unwrap_or("Unknown error").to_string()
}

/// Ensure every label of the scheme exists, creating the missing ones.
/// Returns the names that were created.
pub fn ensure_labels(client: &GitHubClient, scheme: &LabelScheme) -> Result<Vec<String>> {
    client.require_token()?;
    let mut created = Vec::new();
    for (name, description, color) in scheme.label_specs() {
        if !client.label_exists(&name)? {
            client.create_label(&name, description, color)?;
            created.push(name);
        }
    }
    Ok(created)
}
