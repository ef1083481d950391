use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use lifelog::config::Config;
use lifelog::events::{DomainEvent, EventKind, EventMapper, PomodoroRecord, SessionKind, ThoughtPost};
use lifelog::github::{ensure_labels, Connection, GitHubClient};
use lifelog::oauth::{authorize_url, CodeExchange, OAuthExchanger};
use lifelog::session::{Session, SessionStore};
use lifelog::stats::fetch_statistics;
use lifelog::timer::{PomodoroTimer, TimerEvent, MAX_SESSION_MINUTES};
use lifelog::today::TodayResolver;
use lifelog::tracker::{IssueTracker, Record};
use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "lifelog")]
#[command(author, version, about = "Log moods, thoughts and pomodoro sessions as GitHub Issues")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show today's mood, or set it
    Mood {
        #[command(subcommand)]
        action: Option<MoodAction>,
    },

    /// Post or list thoughts
    Thought {
        #[command(subcommand)]
        action: ThoughtAction,
    },

    /// Record, list or run pomodoro sessions
    Pomodoro {
        #[command(subcommand)]
        action: PomodoroAction,
    },

    /// Record counts and the current daily streak
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Close a record
    Close { number: u64 },

    /// Reopen a closed record
    Reopen { number: u64 },

    /// Create any missing labels in the repository
    Labels,

    /// Verify the repository and token
    Check,

    /// Log in with GitHub OAuth
    Login {
        /// Authorization code from the OAuth redirect
        #[arg(long)]
        code: Option<String>,
    },

    /// Forget the stored token and user
    Logout,

    /// Serve the OAuth code exchange endpoint
    Serve {
        /// Port to listen on (default from config, 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum MoodAction {
    /// Create or overwrite today's mood
    Set { text: String },
}

#[derive(Subcommand, Debug)]
enum ThoughtAction {
    /// Publish a thought
    Post {
        text: String,

        /// Attach an image URL (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
    },

    /// Most recent thoughts
    List {
        /// Default from [store] page_size
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
enum PomodoroAction {
    /// Log a finished session
    Record {
        /// Session length (default depends on --kind)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SESSION_MINUTES)))]
        minutes: Option<u32>,

        /// work, short-break or long-break
        #[arg(short, long, default_value = "work")]
        kind: SessionKind,
    },

    /// Sessions logged today
    Today,

    /// Run a countdown and log it when it finishes
    Start {
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SESSION_MINUTES)))]
        minutes: Option<u32>,

        #[arg(short, long, default_value = "work")]
        kind: SessionKind,

        /// Don't log the session on completion
        #[arg(long)]
        no_record: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("LIFELOG_LOG", "warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> CliResult {
    let config = Config::load();

    match command {
        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "lifelog", &mut io::stdout());
            Ok(())
        }
        Command::Logout => logout(),
        Command::Login { code } => login(&config, code),
        Command::Serve { port } => serve(&config, port),
        Command::Mood { action } => Store::open(&config)?.mood(action),
        Command::Thought { action } => Store::open(&config)?.thought(action),
        Command::Pomodoro { action } => Store::open(&config)?.pomodoro(action),
        Command::Stats { json } => Store::open(&config)?.stats(json),
        Command::Close { number } => Store::open(&config)?.close(number),
        Command::Reopen { number } => Store::open(&config)?.reopen(number),
        Command::Labels => Store::open(&config)?.labels(),
        Command::Check => Store::open(&config)?.check(),
    }
}

/// Token from LIFELOG_TOKEN, else the saved session
fn resolve_token() -> Option<String> {
    std::env::var("LIFELOG_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| match SessionStore::locate().load() {
            Ok(session) => session.map(|s| s.access_token),
            Err(e) => {
                log::warn!("ignoring session: {}", e);
                None
            }
        })
}

/// Client and mapper for commands that touch the repository
struct Store {
    client: GitHubClient,
    mapper: EventMapper,
    page_size: u32,
}

impl Store {
    fn open(config: &Config) -> Result<Self, Box<dyn Error>> {
        let client = GitHubClient::new(
            &config.repo.api_base,
            config.repo_ref()?,
            resolve_token(),
            &config.http,
        )?;
        Ok(Self {
            client,
            mapper: config.mapper()?,
            page_size: config.store.page_size,
        })
    }

    fn resolver(&self) -> TodayResolver<'_, GitHubClient> {
        TodayResolver::new(&self.client, &self.mapper)
    }

    fn create_event(&self, event: &DomainEvent) -> Result<Record, Box<dyn Error>> {
        let encoded = self.mapper.encode(event, Utc::now());
        Ok(self
            .client
            .create(&encoded.title, &encoded.body, &encoded.labels)?)
    }

    fn mood(&self, action: Option<MoodAction>) -> CliResult {
        match action {
            None => match self.resolver().today_mood() {
                Some(record) => {
                    println!("{} {}", record.title.cyan(), format!("#{}", record.number).dimmed());
                    println!("{}", record.body);
                }
                None => println!("No mood logged today. Set one with: lifelog mood set \"...\""),
            },
            Some(MoodAction::Set { text }) => {
                let record = self.resolver().save_today_mood(&text)?;
                println!(
                    "{} Saved today's mood ({})",
                    "✓".green(),
                    format!("#{}", record.number).cyan()
                );
            }
        }
        Ok(())
    }

    fn thought(&self, action: ThoughtAction) -> CliResult {
        match action {
            ThoughtAction::Post { text, images } => {
                let record = self.create_event(&DomainEvent::Thought(ThoughtPost {
                    content: text,
                    timestamp: None,
                    images,
                }))?;
                println!(
                    "{} Posted {} {}",
                    "✓".green(),
                    format!("#{}", record.number).cyan(),
                    record.title
                );
            }
            ThoughtAction::List { limit } => {
                let filter = self
                    .mapper
                    .filter_for(EventKind::Thought)
                    .page_size(limit.unwrap_or(self.page_size));
                let records = self.client.list(&filter);
                if records.is_empty() {
                    println!("No thoughts yet.");
                }
                for record in &records {
                    if let Some(DomainEvent::Thought(post)) = self.mapper.decode(record) {
                        let at = post.timestamp.unwrap_or(record.created_at);
                        println!(
                            "{} {}",
                            local_time(&self.mapper, at).dimmed(),
                            format!("#{}", record.number).cyan()
                        );
                        println!("  {}", post.content);
                        for image in &post.images {
                            println!("  {} {}", "image:".dimmed(), image);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn pomodoro(&self, action: PomodoroAction) -> CliResult {
        match action {
            PomodoroAction::Record { minutes, kind } => {
                let session =
                    PomodoroRecord::completed(kind, minutes.unwrap_or(kind.default_minutes()));
                let record = self.create_event(&DomainEvent::Pomodoro(session))?;
                println!("{} Logged {}", "✓".green(), record.title);
            }
            PomodoroAction::Today => {
                let records = self.resolver().todays_records(EventKind::Pomodoro);
                if records.is_empty() {
                    println!("No sessions logged today.");
                }
                let mut focus_minutes: u32 = 0;
                for record in &records {
                    if let Some(DomainEvent::Pomodoro(session)) = self.mapper.decode(record) {
                        if !session.kind.is_break() {
                            focus_minutes = focus_minutes.saturating_add(session.duration_minutes);
                        }
                        let at = session.timestamp.unwrap_or(record.created_at);
                        println!(
                            "{} {:>3} min {}",
                            local_time(&self.mapper, at).dimmed(),
                            session.duration_minutes,
                            session.kind
                        );
                    }
                }
                if focus_minutes > 0 {
                    println!("{} {} min focused", "Total:".bold(), focus_minutes);
                }
            }
            PomodoroAction::Start {
                minutes,
                kind,
                no_record,
            } => {
                let session = run_timer(kind, minutes.unwrap_or(kind.default_minutes()))?;
                if no_record {
                    println!("{} Session finished", "✓".green());
                } else {
                    let record = self.create_event(&DomainEvent::Pomodoro(session))?;
                    println!("{} Logged {}", "✓".green(), record.title);
                }
            }
        }
        Ok(())
    }

    fn stats(&self, json: bool) -> CliResult {
        let stats = fetch_statistics(&self.client, &self.mapper, Utc::now());
        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("{}", "Statistics".bold());
            println!("  Thoughts:  {}", stats.thought_count);
            println!("  Pomodoros: {}", stats.pomodoro_count);
            println!("  Moods:     {}", stats.mood_count);
            println!("  Streak:    {} day(s)", stats.streak_days.to_string().green());
        }
        Ok(())
    }

    fn close(&self, number: u64) -> CliResult {
        let record = self.client.close(number)?;
        println!("{} Closed #{} {}", "✓".green(), record.number, record.title);
        Ok(())
    }

    fn reopen(&self, number: u64) -> CliResult {
        let record = self.client.reopen(number)?;
        println!("{} Reopened #{} {}", "✓".green(), record.number, record.title);
        Ok(())
    }

    fn labels(&self) -> CliResult {
        let created = ensure_labels(&self.client, self.mapper.labels())?;
        if created.is_empty() {
            println!("All labels already exist in {}", self.client.repo());
        }
        for name in created {
            println!("{} Created label {}", "✓".green(), name.cyan());
        }
        Ok(())
    }

    fn check(&self) -> CliResult {
        match self.client.check_connection()? {
            Connection::User(login) => println!(
                "{} Authenticated as {} ({})",
                "✓".green(),
                login.cyan(),
                self.client.repo()
            ),
            Connection::PublicRepo(name) => println!(
                "{} {} is readable. Not logged in, so writes are disabled",
                "✓".green(),
                name.cyan()
            ),
        }
        Ok(())
    }
}

fn local_time(mapper: &EventMapper, at: DateTime<Utc>) -> String {
    at.with_timezone(&mapper.timezone())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Drive the countdown once per second until it completes
fn run_timer(kind: SessionKind, minutes: u32) -> Result<PomodoroRecord, Box<dyn Error>> {
    let mut timer = PomodoroTimer::new(kind, minutes);
    timer.start();
    println!("{} {} for {} min. Ctrl+C to abandon", "▶".green(), kind, minutes);

    loop {
        match timer.tick() {
            TimerEvent::Completed(session) => {
                println!();
                return Ok(session);
            }
            TimerEvent::Ticked { .. } => {
                print!("\r  {}  ", timer.display().bold());
                io::stdout().flush()?;
            }
            TimerEvent::Idle => return Err("timer stopped unexpectedly".into()),
        }
        std::thread::sleep(Duration::from_secs(1));
    }
}

fn login(config: &Config, code: Option<String>) -> CliResult {
    let Some(code) = code else {
        println!("Open this URL in a browser and authorize the app:");
        println!("  {}", authorize_url(&config.oauth)?.cyan());
        println!();
        println!("Then run: lifelog login --code <code from the redirect>");
        return Ok(());
    };

    let exchanger = OAuthExchanger::new(config.oauth.clone(), &config.repo.api_base, &config.http)?;
    let token = exchanger.exchange(&code, None)?;
    let session = Session::from(token);

    let store = SessionStore::locate();
    store.save(&session)?;
    println!(
        "{} Logged in as {} (session saved to {})",
        "✓".green(),
        session.login().unwrap_or("unknown").cyan(),
        store.path().display()
    );
    Ok(())
}

fn logout() -> CliResult {
    if SessionStore::locate().clear()? {
        println!("{} Logged out", "✓".green());
    } else {
        println!("Not logged in");
    }
    Ok(())
}

fn serve(config: &Config, port: Option<u16>) -> CliResult {
    let exchanger = OAuthExchanger::new(config.oauth.clone(), &config.repo.api_base, &config.http)?;
    if config.oauth.client_id.is_none() || config.oauth.client_secret.is_none() {
        eprintln!(
            "{} GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET not set; exchanges will fail",
            "Warning:".yellow()
        );
    }
    lifelog::serve::start_auth_server(
        port.unwrap_or(config.oauth.port),
        &config.oauth.endpoint_path,
        &exchanger,
    )?;
    Ok(())
}
