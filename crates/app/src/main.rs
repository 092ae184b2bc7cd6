use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{ApiConfig, AppServices, Clock, ProgressionTiming, SignupForm};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};
use url::Url;

const MEMORY_DB: &str = "sqlite::memory:";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ui     [--db <sqlite_url>] [--api <url>]");
    eprintln!("  cargo run -p app -- signup [--db <sqlite_url>] [--api <url>] \\");
    eprintln!("      --team <name> --leader <name> --leader-email <email> \\");
    eprintln!("      --member1 <name> --member1-email <email> \\");
    eprintln!("      --member2 <name> --member2-email <email> --password <password>");
    eprintln!("  cargo run -p app -- logout [--db <sqlite_url>] [--api <url>]");
    eprintln!("  cargo run -p app -- status [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:cicada.sqlite3");
    eprintln!("  --api http://localhost:5000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CICADA_DB_URL, CICADA_API_URL, CICADA_API_TIMEOUT_SECS, CICADA_EMAIL_DOMAIN, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Signup,
    Logout,
    Status,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "signup" => Some(Self::Signup),
            "logout" => Some(Self::Logout),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    api_url: Option<Url>,
    signup: SignupForm,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("CICADA_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://cicada.sqlite3".into(), normalize_sqlite_url);
        let mut api_url = None;
        let mut signup = SignupForm::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => {
                    let value = require_value(args, "--api")?;
                    let parsed = Url::parse(value.trim())
                        .map_err(|_| ArgsError::InvalidApiUrl { raw: value.clone() })?;
                    api_url = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if cmd == Command::Signup => {
                    let (field, name): (&mut String, &'static str) = match flag {
                        "--team" => (&mut signup.team_name, "--team"),
                        "--leader" => (&mut signup.leader_name, "--leader"),
                        "--leader-email" => (&mut signup.leader_email, "--leader-email"),
                        "--member1" => (&mut signup.member1_name, "--member1"),
                        "--member1-email" => (&mut signup.member1_email, "--member1-email"),
                        "--member2" => (&mut signup.member2_name, "--member2"),
                        "--member2-email" => (&mut signup.member2_email, "--member2-email"),
                        "--password" => (&mut signup.password, "--password"),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    };
                    *field = require_value(args, name)?;
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            api_url,
            signup,
        })
    }

    fn api_config(&self) -> ApiConfig {
        let config = ApiConfig::from_env();
        match &self.api_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        }
    }
}

/// Turn `sqlite:relative/path` or a bare path into an absolute `sqlite://` URL.
fn normalize_sqlite_url(raw: String) -> String {
    if raw == MEMORY_DB || raw.starts_with("sqlite://") {
        return raw;
    }
    let trimmed = raw.trim();
    let path = PathBuf::from(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand launches the UI.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    ensure_db_dir(&parsed.db_url)?;
    let api_config = parsed.api_config();
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        &api_config,
        ProgressionTiming::default(),
        Clock::system(),
    )
    .await?;
    info!(db = %parsed.db_url, command = ?cmd, "starting");

    match cmd {
        Command::Ui => {
            let app: Arc<dyn UiApp> = Arc::new(services);
            let context = build_app_context(&app);

            // Some dev setups default the window to always-on-top.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("CICADA")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::Signup => {
            let team = services.auth().signup(&parsed.signup).await?;
            println!(
                "Signed up team {} (level {}).",
                team.team_name(),
                team.current_level()
            );
            Ok(())
        }
        Command::Logout => {
            services.auth().logout().await?;
            println!("Signed out.");
            Ok(())
        }
        Command::Status => {
            let store = services.session_store();
            let Some(team) = store.restore_from_persisted().await? else {
                println!("No team is signed in.");
                return Ok(());
            };
            let catalog = services.catalog();
            println!("Team:  {}", team.team_name());
            if team.has_finished(&catalog) {
                println!("Level: all {} levels solved", catalog.final_level());
                return Ok(());
            }
            let level = team.current_level();
            let solved = store.completed_parts(level).await?;
            let total = catalog.get(level).map_or(0, |level| level.parts().len());
            println!("Level: {level} ({}/{total} parts solved)", solved.len());
            Ok(())
        }
    }
}

/// Create the directory holding the database file; `SQLite` creates the file itself.
fn ensure_db_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == MEMORY_DB {
        return Ok(());
    }
    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() {
        return Err(invalid().into());
    }
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // Binary glue: report once and exit.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_string());
        Args::parse(cmd, &mut iter)
    }

    #[test]
    fn relative_sqlite_path_becomes_absolute() {
        let url = normalize_sqlite_url("sqlite:data/cicada.sqlite3".to_string());
        assert!(url.starts_with("sqlite:///"), "{url}");
        assert!(url.ends_with("data/cicada.sqlite3"), "{url}");
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".to_string()),
            "sqlite::memory:"
        );
    }

    #[test]
    fn api_flag_overrides_base_url() {
        let args = parse(Command::Ui, &["--api", "https://hunt.example/"]).unwrap();
        assert_eq!(args.api_config().base_url.as_str(), "https://hunt.example/");
    }

    #[test]
    fn signup_flags_fill_the_form() {
        let args = parse(
            Command::Signup,
            &["--team", "Cicadas", "--leader-email", "lead@x.in", "--password", "pw"],
        )
        .unwrap();
        assert_eq!(args.signup.team_name, "Cicadas");
        assert_eq!(args.signup.leader_email, "lead@x.in");
        assert_eq!(args.signup.password, "pw");
        assert!(args.signup.has_blank_field());
    }

    #[test]
    fn signup_flags_are_rejected_elsewhere() {
        let err = parse(Command::Status, &["--team", "Cicadas"]).err().unwrap();
        assert!(matches!(err, ArgsError::UnknownArg(_)));
    }

    #[test]
    fn missing_flag_value_is_reported() {
        let err = parse(Command::Signup, &["--team"]).err().unwrap();
        assert!(matches!(err, ArgsError::MissingValue { flag: "--team" }));
        let err = parse(Command::Ui, &["--api", "not a url"]).err().unwrap();
        assert!(matches!(err, ArgsError::InvalidApiUrl { .. }));
    }

    #[test]
    fn db_dir_requires_a_file_url() {
        assert!(ensure_db_dir(MEMORY_DB).is_ok());
        assert!(ensure_db_dir("sqlite://").is_err());
        assert!(ensure_db_dir("postgres://hunt").is_err());
    }
}
