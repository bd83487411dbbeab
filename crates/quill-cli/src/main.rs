//! quill - a terminal coding agent
//!
//! Talks to any OpenAI-compatible endpoint and edits the workspace only
//! through reviewed unified diffs that can be undone.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use quill_core::diff::AutoApprove;
use quill_core::{
    paths, AgentCancellation, AgentRunner, EditSession, OpenAiClient, Operator, QuillConfig,
    SessionStore, ToolContext, ToolRegistry, Workspace,
};

mod chat;
mod terminal;

use chat::ChatSession;
use terminal::{Prompter, TerminalOperator};

/// quill - coding agent for your terminal
#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Terminal coding agent with reviewed, undoable edits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Working directory (defaults to current)
    #[arg(short, long)]
    directory: Option<String>,

    /// Apply edits and run commands without asking
    #[arg(short, long)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (the default)
    Chat {
        /// Resume a stored session by id
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Run a single task and exit
    Run {
        /// Task description
        #[arg(required = true)]
        task: Vec<String>,
    },

    /// Apply a unified diff file to the workspace
    Apply { diff_file: PathBuf },

    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        action: Option<SessionCommands>,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List stored sessions, most recent first
    List,
    /// Delete a session
    Delete { id: String },
}

fn init_logging() {
    // Log to file, stdout belongs to the conversation
    let log_dir = paths::logs_dir();
    std::fs::create_dir_all(&log_dir).ok();

    #[cfg(unix)]
    let null_device = "/dev/null";
    #[cfg(windows)]
    let null_device = "NUL";

    let log_file = match std::fs::File::create(paths::log_file())
        .or_else(|_| std::fs::File::create(null_device))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
}

fn open_workspace(directory: Option<&str>) -> Result<Workspace> {
    let root = match directory {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };
    Workspace::open(&root).with_context(|| format!("Cannot open workspace {}", root.display()))
}

/// Everything a chat or one-shot run needs, wired together
struct App {
    runner: AgentRunner,
    cancellation: Arc<AgentCancellation>,
    printer: tokio::task::JoinHandle<()>,
}

fn build_app(
    workspace: Workspace,
    config: Arc<QuillConfig>,
    operator: Arc<dyn Operator>,
) -> Result<App> {
    let model = OpenAiClient::from_config(&config)?;
    tracing::info!(model = model.model(), base_url = %config.base_url, "Using model");

    let session = Arc::new(EditSession::new(workspace, operator));
    let ctx = ToolContext::new(session, config.clone());
    let registry = ToolRegistry::from_config(&config);

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = terminal::spawn_event_printer(rx);
    let runner = AgentRunner::new(Arc::new(model), registry, ctx).with_events(tx);

    let cancellation = Arc::new(AgentCancellation::new());
    spawn_interrupt_handler(cancellation.clone());

    Ok(App {
        runner,
        cancellation,
        printer,
    })
}

/// Ctrl-C cancels the running generation, or exits when idle
fn spawn_interrupt_handler(cancellation: Arc<AgentCancellation>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !cancellation.cancel() {
                tracing::info!("Interrupted while idle, exiting");
                std::process::exit(130);
            }
            tracing::info!("Generation cancelled by interrupt");
        }
    });
}

fn operator_for(yes: bool, config: &QuillConfig, prompter: &Arc<Prompter>) -> Arc<dyn Operator> {
    if yes || config.auto_approve {
        Arc::new(AutoApprove)
    } else {
        Arc::new(TerminalOperator::new(prompter.clone()))
    }
}

fn open_store() -> Result<SessionStore> {
    SessionStore::open(&paths::database_file())
}

async fn run_chat(
    directory: Option<&str>,
    yes: bool,
    config: Arc<QuillConfig>,
    prompter: Arc<Prompter>,
    resume: Option<String>,
) -> Result<()> {
    let workspace = open_workspace(directory)?;
    let operator = operator_for(yes, &config, &prompter);
    let app = build_app(workspace, config, operator)?;
    let mut chat = ChatSession::new(app.runner, app.cancellation, open_store()?, prompter);
    if let Some(id) = resume {
        chat.resume(&id)?;
    }
    chat.run_loop().await
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Arc::new(QuillConfig::load()?);
    let prompter = Arc::new(Prompter::new());

    match cli.command {
        Some(Commands::Sessions { action }) => {
            let store = open_store()?;
            match action.unwrap_or(SessionCommands::List) {
                SessionCommands::List => {
                    let sessions = store.list_sessions()?;
                    if sessions.is_empty() {
                        println!("No stored sessions.");
                    }
                    for info in sessions {
                        println!(
                            "{}  {}  {:>4} msgs  {}",
                            info.id,
                            info.updated_at.format("%Y-%m-%d %H:%M"),
                            info.message_count,
                            info.title
                        );
                    }
                }
                SessionCommands::Delete { id } => {
                    if store.delete_session(&id)? {
                        println!("Deleted session {}", id);
                    } else {
                        println!("No session with id {}", id);
                    }
                }
            }
        }
        Some(Commands::Apply { diff_file }) => {
            let workspace = open_workspace(cli.directory.as_deref())?;
            let text = tokio::fs::read_to_string(&diff_file)
                .await
                .with_context(|| format!("Cannot read {}", diff_file.display()))?;
            let session = EditSession::new(workspace, operator_for(cli.yes, &config, &prompter));
            match session.apply_patch_text(&text).await {
                Ok(outcome) => println!("{}", outcome.summary()),
                Err(e) => {
                    tracing::warn!(kind = e.kind(), "Diff rejected: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Run { task }) => {
            let workspace = open_workspace(cli.directory.as_deref())?;
            let operator = operator_for(cli.yes, &config, &prompter);
            let app = build_app(workspace, config.clone(), operator)?;
            let mut chat =
                ChatSession::new(app.runner, app.cancellation, open_store()?, prompter);
            chat.send(&task.join(" ")).await?;
            drop(chat);
            app.printer.await.ok();
            println!();
        }
        Some(Commands::Chat { session }) => {
            run_chat(cli.directory.as_deref(), cli.yes, config, prompter, session).await?
        }
        None => run_chat(cli.directory.as_deref(), cli.yes, config, prompter, None).await?,
    }

    Ok(())
}
