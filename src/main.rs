//! CLI entry point for wechat-ax.
//!
//! # Usage
//!
//! ```bash
//! # List every chat in the sidebar
//! wechat-ax list
//!
//! # Show the messages of one chat, grouped by date
//! wechat-ax show "文件传输助手"
//!
//! # Send a message
//! wechat-ax send "文件传输助手" "hello"
//!
//! # Replay a recorded tree instead of the live client
//! wechat-ax --snapshot wechat.json --format json list
//! ```
//!
//! Results go to stdout, diagnostics to stderr. A chat or message that
//! cannot be found exits with status 1.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use wechat_extractor::render::{self, OutputFormat};
use wechat_extractor::session::MAIN_WINDOW_PREFIX;
use wechat_extractor::snapshot::{record_tree, SnapshotElement};
use wechat_extractor::{ChatSession, Config, Host, Lookup, UnreadPolicy, WeChatError, WeChatExtractor};

#[derive(Debug, Parser)]
#[command(name = "wechat-ax", version, about = "Read and drive WeChat through the Accessibility API")]
struct Cli {
    /// WeChat layout dialect (v38, v40)
    #[arg(long, global = true)]
    dialect: Option<String>,

    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// How unread counts are credited (budget_gated, count_above_one, count_above_one_or_flagged)
    #[arg(long, global = true)]
    unread_policy: Option<UnreadPolicy>,

    /// Replay a recorded UI tree instead of the running client
    #[arg(long, global = true, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// List chats
    List {
        /// Only rows currently on screen
        #[arg(long)]
        visible: bool,
    },
    /// Show the messages of a chat
    Show {
        title: String,
        #[arg(long)]
        visible: bool,
    },
    /// Send a message to a chat
    Send { title: String, message: String },
    /// Open the message at INDEX in a chat
    Preview {
        title: String,
        index: usize,
        #[arg(long)]
        visible: bool,
    },
    /// Print debounced change notifications until interrupted
    Monitor,
    /// Record the application's accessibility tree as JSON
    Dump {
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Check if accessibility permissions are granted
    CheckPermissions,
}

#[derive(Debug, Serialize)]
struct PermissionStatus {
    enabled: bool,
    message: &'static str,
}

/// Settings after merging the config file with command-line flags.
#[derive(Debug, Clone)]
struct Resolved {
    dialect: String,
    format: OutputFormat,
    policy: UnreadPolicy,
    max_depth: usize,
}

impl Resolved {
    fn new(cli: &Cli, config: &Config) -> Self {
        Resolved {
            dialect: cli.dialect.clone().unwrap_or_else(|| config.general.dialect.clone()),
            format: cli.format.unwrap_or(config.general.output),
            policy: cli.unread_policy.unwrap_or(config.decoder.unread_policy),
            max_depth: config.decoder.max_depth,
        }
    }
}

/// Handle the check-permissions command
fn handle_check_permissions() -> Result<i32, WeChatError> {
    let enabled = WeChatExtractor::is_enabled();
    let status = PermissionStatus {
        enabled,
        message: if enabled {
            "Accessibility permissions are granted"
        } else {
            "Accessibility permissions are not granted"
        },
    };
    println!("{}", serde_json::to_string_pretty(&status)?);

    if enabled {
        Ok(0)
    } else {
        eprintln!("{}", WeChatExtractor::permission_instructions());
        WeChatExtractor::request_permissions();
        Ok(1)
    }
}

/// Report a missing chat or message on stderr and pick the exit code.
fn not_found(what: String) -> i32 {
    eprintln!("Not found: {}", what);
    1
}

/// Run a tree command against any host.
fn execute<H: Host>(
    session: &mut ChatSession<H>,
    command: &Command,
    settings: &Resolved,
) -> Result<i32, WeChatError> {
    let format = settings.format;
    if !matches!(command, Command::Dump { .. }) {
        match session.main_window() {
            Lookup::Found(_) => {}
            Lookup::NotFound => {
                return Err(WeChatError::WindowNotFound(format!(
                    "no window titled '{}...'",
                    MAIN_WINDOW_PREFIX
                )))
            }
            Lookup::PlatformError(failure) => return Err(failure.into()),
        }
    }

    match command {
        Command::List { visible } => {
            let chats = session.list_chats(*visible);
            println!("{}", render::render_chats(&chats, format)?);
            Ok(0)
        }
        Command::Show { title, visible } => match session.show(title, *visible) {
            Lookup::Found(chat) => {
                println!("{}", render::render_chat_messages(&chat, format)?);
                Ok(0)
            }
            Lookup::NotFound => Ok(not_found(format!("chat '{}'", title))),
            Lookup::PlatformError(failure) => Err(failure.into()),
        },
        Command::Send { title, message } => match session.send(title, message) {
            Lookup::Found(chat) => {
                match format {
                    OutputFormat::Text => println!("Sent to {}", chat.title),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chat)?),
                }
                Ok(0)
            }
            Lookup::NotFound => Ok(not_found(format!("chat '{}'", title))),
            Lookup::PlatformError(failure) => Err(failure.into()),
        },
        Command::Preview { title, index, visible } => {
            match session.preview_message(title, *index, *visible) {
                Lookup::Found(message) => {
                    match format {
                        OutputFormat::Text => println!("{}", render::message_line(&message)),
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&message)?),
                    }
                    Ok(0)
                }
                Lookup::NotFound => Ok(not_found(format!("message {} in '{}'", index, title))),
                Lookup::PlatformError(failure) => Err(failure.into()),
            }
        }
        Command::Dump { depth } => match session.host().application() {
            Lookup::Found(app) => {
                let tree = record_tree(&app, depth.unwrap_or(settings.max_depth));
                println!("{}", serde_json::to_string_pretty(&tree)?);
                Ok(0)
            }
            Lookup::NotFound => Ok(not_found("application element".to_string())),
            Lookup::PlatformError(failure) => Err(failure.into()),
        },
        Command::Monitor | Command::CheckPermissions => Err(WeChatError::Unsupported(format!(
            "{:?} does not run inside a chat session",
            command
        ))),
    }
}

fn run(cli: Cli, config: Config) -> Result<i32, WeChatError> {
    if cli.command == Command::CheckPermissions {
        return handle_check_permissions();
    }
    if cli.command == Command::Monitor {
        if cli.snapshot.is_some() {
            return Err(WeChatError::Unsupported("a snapshot has no notifications to monitor".into()));
        }
        WeChatExtractor::monitor(config.monitor.debounce())?;
        return Ok(0);
    }

    let settings = Resolved::new(&cli, &config);
    let locator = WeChatExtractor::locator(&settings.dialect, settings.max_depth)?;
    log::debug!(
        "[WX-CLI] dialect={} policy={} format={:?}",
        settings.dialect,
        settings.policy.as_str(),
        settings.format
    );

    if let Some(path) = &cli.snapshot {
        let mut session = WeChatExtractor::open_snapshot(path, locator, settings.policy)?;
        let code = execute(&mut session, &cli.command, &settings)?;
        log_journal(session.host().app());
        return Ok(code);
    }

    #[cfg(target_os = "macos")]
    {
        let mut session = WeChatExtractor::connect(locator, settings.policy)?;
        execute(&mut session, &cli.command, &settings)
    }

    #[cfg(not(target_os = "macos"))]
    {
        Err(WeChatError::Unsupported(
            "the live client is only reachable on macOS; use --snapshot".into(),
        ))
    }
}

/// Writes made while replaying a snapshot never reach a real client.
fn log_journal(app: &SnapshotElement) {
    for entry in app.journal() {
        log::info!("[WX-CLI] snapshot write: {:?}", entry);
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.general.log_level.as_str()),
    )
    .init();

    log::debug!("wechat-ax starting: {:?}", cli.command);

    let exit_code = match run(cli, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    log::debug!("Exiting with code: {}", exit_code);
    process::exit(exit_code);
}
