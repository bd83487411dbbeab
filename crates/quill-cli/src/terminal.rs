//! Line-oriented terminal front end: prompts, change review and event output

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, Mutex};

use quill_core::diff::{DriftDecision, DriftReport, Operator, PreviewSession, ReviewDecision};
use quill_core::AgentEvent;

/// Shared stdin reader
///
/// The chat loop and the operator both read answers from stdin, so they
/// must share a single buffered reader.
pub struct Prompter {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Print `prompt` and read one line. `None` on end of input.
    pub async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        Ok(self.lines.lock().await.next_line().await?)
    }

    /// Yes/no question, defaulting to no
    pub async fn confirm(&self, question: &str) -> bool {
        match self.read_line(&format!("{} [y/N] ", question)).await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// What the user typed at the review prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewKey {
    Apply,
    Cancel,
    Next,
    Prev,
    All,
}

fn parse_review_key(answer: &str) -> Option<ReviewKey> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "a" | "y" | "yes" | "apply" => Some(ReviewKey::Apply),
        "c" | "no" | "q" | "cancel" => Some(ReviewKey::Cancel),
        "" | "n" | "j" | "next" => Some(ReviewKey::Next),
        "k" | "p" | "prev" => Some(ReviewKey::Prev),
        "d" | "all" => Some(ReviewKey::All),
        _ => None,
    }
}

/// Asks the person at the terminal before anything touches the workspace
pub struct TerminalOperator {
    prompter: Arc<Prompter>,
}

impl TerminalOperator {
    pub fn new(prompter: Arc<Prompter>) -> Self {
        Self { prompter }
    }

    fn show_current(preview: &PreviewSession) {
        let (position, total) = preview.position();
        if let Some(entry) = preview.current() {
            println!(
                "\n── {} [{}/{}] {} {}",
                preview.title,
                position,
                total,
                entry.action.label(),
                entry.relative_path
            );
            print!("{}", entry.rendered);
            if !entry.rendered.ends_with('\n') {
                println!();
            }
        }
    }
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn review(&self, preview: &mut PreviewSession) -> ReviewDecision {
        if preview.is_empty() {
            return ReviewDecision::Cancel;
        }
        Self::show_current(preview);

        loop {
            let prompt = format!(
                "Apply {} file(s)? [a]pply [c]ancel [n]ext [p]rev [d]iff all: ",
                preview.len()
            );
            let answer = match self.prompter.read_line(&prompt).await {
                Ok(Some(answer)) => answer,
                Ok(None) => return ReviewDecision::Cancel,
                Err(e) => {
                    tracing::warn!("Failed to read review answer: {}", e);
                    return ReviewDecision::Cancel;
                }
            };

            match parse_review_key(&answer) {
                Some(ReviewKey::Apply) => return ReviewDecision::Apply,
                Some(ReviewKey::Cancel) => return ReviewDecision::Cancel,
                Some(ReviewKey::Next) => {
                    preview.next();
                    Self::show_current(preview);
                }
                Some(ReviewKey::Prev) => {
                    preview.prev();
                    Self::show_current(preview);
                }
                Some(ReviewKey::All) => {
                    for entry in preview.entries() {
                        println!("\n── {} {}", entry.action.label(), entry.relative_path);
                        print!("{}", entry.rendered);
                    }
                }
                None => println!("Unrecognized answer '{}'", answer.trim()),
            }
        }
    }

    async fn resolve_drift(&self, reports: &[DriftReport]) -> DriftDecision {
        println!("\nFiles changed on disk since the edit was made:");
        for report in reports {
            println!("  {}", report);
        }
        if self.prompter.confirm("Overwrite them anyway?").await {
            DriftDecision::Override
        } else {
            DriftDecision::Cancel
        }
    }

    async fn confirm_command(&self, command: &str) -> bool {
        println!("\nThe agent wants to run:\n  {}", command);
        self.prompter.confirm("Run it?").await
    }
}

/// Print agent events until the sender side is dropped
pub fn spawn_event_printer(
    mut rx: mpsc::UnboundedReceiver<AgentEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::Chunk(text) => {
                    print!("{}", text);
                    let _ = stdout.flush();
                }
                AgentEvent::ToolStarted { tool, args } => {
                    println!("\n⚙ {} {}", tool, args);
                }
                AgentEvent::ToolFinished {
                    tool,
                    output,
                    is_error,
                } => {
                    let marker = if is_error { "✗" } else { "✓" };
                    println!("{} {} ({} chars)", marker, tool, output.chars().count());
                }
                AgentEvent::Final(answer) => {
                    println!("\n\n{}", answer);
                }
                AgentEvent::State(state) => {
                    tracing::debug!(%state, "Agent state");
                }
                AgentEvent::Thought(_) | AgentEvent::Plan(_) => {}
            }
        }
    })
}
