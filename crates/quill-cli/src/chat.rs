//! Interactive chat loop with slash commands and session persistence

use std::sync::Arc;

use anyhow::{bail, Result};

use quill_core::ai::Role;
use quill_core::{
    AgentCancellation, AgentError, AgentRunner, AgentState, ChatMessage, SessionStore,
};

use crate::terminal::Prompter;

const HELP: &str = "\
Commands:
  /apply <file>   Apply a unified diff from a file
  /undo           Revert the last applied change
  /pin <path>     Always include a file as context
  /unpin <path>   Stop including a pinned file
  /pins           List pinned files
  /help           Show this help
  /quit           Exit

Mention files with @path to include them in a single message.
Ctrl-C cancels a running generation.";

/// Parsed `/command` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Apply(String),
    Undo,
    Pin(String),
    Unpin(String),
    Pins,
    Help,
    Quit,
    /// Known command missing its argument
    Usage(&'static str),
    Unknown(String),
}

/// `None` when the line is an ordinary message
pub fn parse_slash(line: &str) -> Option<SlashCommand> {
    let line = line.trim();
    let rest = line.strip_prefix('/')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let with_arg = |usage: &'static str, make: fn(String) -> SlashCommand| {
        if arg.is_empty() {
            SlashCommand::Usage(usage)
        } else {
            make(arg.to_string())
        }
    };

    Some(match name {
        "apply" => with_arg("/apply <diff-file>", SlashCommand::Apply),
        "undo" => SlashCommand::Undo,
        "pin" => with_arg("/pin <path>", SlashCommand::Pin),
        "unpin" => with_arg("/unpin <path>", SlashCommand::Unpin),
        "pins" => SlashCommand::Pins,
        "help" | "?" => SlashCommand::Help,
        "quit" | "exit" | "q" => SlashCommand::Quit,
        other => SlashCommand::Unknown(other.to_string()),
    })
}

/// Session title from the first user message
pub fn title_from(message: &str) -> String {
    const MAX_TITLE_CHARS: usize = 60;
    let first_line = message.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return "New session".to_string();
    }
    let mut title: String = first_line.chars().take(MAX_TITLE_CHARS).collect();
    if first_line.chars().count() > MAX_TITLE_CHARS {
        title.push('…');
    }
    title
}

/// Ensure a resumed transcript starts with a system prompt
pub fn restore_history(mut messages: Vec<ChatMessage>, system: ChatMessage) -> Vec<ChatMessage> {
    if messages.first().map(|m| m.role) != Some(Role::System) {
        messages.insert(0, system);
    }
    messages
}

/// One conversation: the runner, its transcript and where it is stored
pub struct ChatSession {
    runner: AgentRunner,
    cancellation: Arc<AgentCancellation>,
    store: SessionStore,
    prompter: Arc<Prompter>,
    session_id: Option<String>,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(
        runner: AgentRunner,
        cancellation: Arc<AgentCancellation>,
        store: SessionStore,
        prompter: Arc<Prompter>,
    ) -> Self {
        let history = runner.start_history();
        Self {
            runner,
            cancellation,
            store,
            prompter,
            session_id: None,
            history,
        }
    }

    /// Continue a stored session
    pub fn resume(&mut self, id: &str) -> Result<()> {
        let Some(stored) = self.store.get_session(id)? else {
            bail!("Session not found: {}", id);
        };
        let system = self.runner.start_history().remove(0);
        println!(
            "Resuming \"{}\" ({} messages)",
            stored.info.title, stored.info.message_count
        );
        self.history = restore_history(stored.messages, system);
        self.session_id = Some(stored.info.id);
        Ok(())
    }

    /// Read-eval loop until `/quit` or end of input
    pub async fn run_loop(&mut self) -> Result<()> {
        println!(
            "quill in {} (type /help for commands)",
            self.runner.context().workspace().root().display()
        );

        loop {
            let Some(line) = self.prompter.read_line("\n> ").await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_slash(line) {
                Some(SlashCommand::Quit) => break,
                Some(command) => self.handle_command(command).await,
                None => self.send(line).await?,
            }
        }
        Ok(())
    }

    /// Run one user message through the agent and persist the transcript
    pub async fn send(&mut self, message: &str) -> Result<()> {
        let generation = self.cancellation.begin();
        let turn = self.runner.compose_user_turn(message).await;
        self.history.push(turn);

        let result = self.runner.run(&mut self.history, &generation.token).await;
        self.cancellation.finish(&generation);

        match result {
            Ok(run) if run.status == AgentState::StepLimitReached => {
                println!(
                    "\nStopped after {} steps without a final answer. Send another message to continue.",
                    run.steps
                );
            }
            Ok(run) => {
                tracing::info!(steps = run.steps, "Generation finished");
            }
            Err(AgentError::Cancelled) => println!("\n[cancelled]"),
            Err(e) => eprintln!("\nError: {}", e),
        }

        self.persist(message)
    }

    fn persist(&mut self, first_message: &str) -> Result<()> {
        let id = match &self.session_id {
            Some(id) => id.clone(),
            None => {
                let root = self.runner.context().workspace().root().display();
                let root = root.to_string();
                let id = self
                    .store
                    .create_session(&title_from(first_message), Some(&root))?;
                self.session_id = Some(id.clone());
                id
            }
        };
        self.store.save_session(&id, &self.history)
    }

    async fn handle_command(&mut self, command: SlashCommand) {
        let session = self.runner.context().session.clone();
        match command {
            SlashCommand::Apply(file) => {
                let path = self.runner.context().workspace().root().join(&file);
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => match session.apply_patch_text(&text).await {
                        Ok(outcome) => println!("{}", outcome.summary()),
                        Err(e) => eprintln!("{}", e),
                    },
                    Err(e) => eprintln!("Cannot read {}: {}", path.display(), e),
                }
            }
            SlashCommand::Undo => match session.undo_last().await {
                Ok(outcome) => println!("{}", outcome.summary()),
                Err(e) => eprintln!("{}", e),
            },
            SlashCommand::Pin(path) => match session.pin(&path) {
                Ok(true) => println!("Pinned {}", path),
                Ok(false) => println!("{} is already pinned", path),
                Err(e) => eprintln!("{}", e),
            },
            SlashCommand::Unpin(path) => {
                if session.unpin(&path) {
                    println!("Unpinned {}", path);
                } else {
                    println!("{} is not pinned", path);
                }
            }
            SlashCommand::Pins => {
                let pinned = session.pinned();
                if pinned.is_empty() {
                    println!("No pinned files");
                }
                for path in pinned {
                    println!("  {}", path);
                }
            }
            SlashCommand::Help => println!("{}", HELP),
            SlashCommand::Usage(usage) => println!("Usage: {}", usage),
            SlashCommand::Unknown(name) => println!("Unknown command /{} (try /help)", name),
            SlashCommand::Quit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quill_core::ai::{ChunkStream, ModelError};
    use quill_core::diff::AutoApprove;
    use quill_core::{ChatModel, EditSession, QuillConfig, ToolContext, ToolRegistry, Workspace};
    use tempfile::TempDir;

    /// Answers every request with the same completion
    struct FixedModel(&'static str);

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn stream_chat(&self, _messages: &[ChatMessage]) -> Result<ChunkStream, ModelError> {
            let chunks = vec![Ok(self.0.to_string())];
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    fn chat_in(dir: &TempDir) -> ChatSession {
        let workspace = Workspace::open(dir.path()).unwrap();
        let config = Arc::new(QuillConfig::default());
        let session = Arc::new(EditSession::new(workspace, Arc::new(AutoApprove)));
        let ctx = ToolContext::new(session, config.clone());
        let runner = AgentRunner::new(
            Arc::new(FixedModel("Thought: trivial\nFinal Answer: done")),
            ToolRegistry::from_config(&config),
            ctx,
        );
        let store = SessionStore::open(&dir.path().join(".quill").join("quill.db")).unwrap();
        ChatSession::new(
            runner,
            Arc::new(AgentCancellation::new()),
            store,
            Arc::new(Prompter::new()),
        )
    }

    #[tokio::test]
    async fn test_first_message_creates_titled_session() {
        let dir = TempDir::new().unwrap();
        let mut chat = chat_in(&dir);

        chat.send("fix the bug\nin the parser").await.unwrap();
        chat.send("thanks").await.unwrap();

        let sessions = chat.store.list_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "fix the bug");
        // system + two user/assistant exchanges
        assert_eq!(sessions[0].message_count, 5);
    }

    #[tokio::test]
    async fn test_resume_restores_transcript() {
        let dir = TempDir::new().unwrap();
        let mut first = chat_in(&dir);
        first.send("hello").await.unwrap();
        let id = first.session_id.clone().unwrap();
        drop(first);

        let mut resumed = chat_in(&dir);
        resumed.resume(&id).unwrap();
        assert_eq!(resumed.history.len(), 3);
        assert_eq!(resumed.history[0].role, Role::System);
        assert_eq!(resumed.history[2].content, "Thought: trivial\nFinal Answer: done");

        resumed.send("again").await.unwrap();
        let stored = resumed.store.get_session(&id).unwrap().unwrap();
        assert_eq!(stored.messages.len(), 5);
    }

    #[tokio::test]
    async fn test_resume_unknown_session_fails() {
        let dir = TempDir::new().unwrap();
        let mut chat = chat_in(&dir);
        let err = chat.resume("missing").unwrap_err();
        assert!(err.to_string().contains("Session not found"));
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_slash("fix the parser"), None);
        assert_eq!(parse_slash("  please /undo that"), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_slash("/undo"), Some(SlashCommand::Undo));
        assert_eq!(parse_slash(" /pins "), Some(SlashCommand::Pins));
        assert_eq!(parse_slash("/exit"), Some(SlashCommand::Quit));
        assert_eq!(
            parse_slash("/apply  fix.patch "),
            Some(SlashCommand::Apply("fix.patch".to_string()))
        );
        assert_eq!(
            parse_slash("/pin src/lib.rs"),
            Some(SlashCommand::Pin("src/lib.rs".to_string()))
        );
        assert_eq!(
            parse_slash("/frobnicate"),
            Some(SlashCommand::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_missing_argument_shows_usage() {
        assert_eq!(
            parse_slash("/apply"),
            Some(SlashCommand::Usage("/apply <diff-file>"))
        );
        assert_eq!(
            parse_slash("/unpin "),
            Some(SlashCommand::Usage("/unpin <path>"))
        );
    }

    #[test]
    fn test_title_from_first_line() {
        assert_eq!(title_from("Fix the bug\nmore detail"), "Fix the bug");
        assert_eq!(title_from("   "), "New session");
        let long = "x".repeat(80);
        let title = title_from(&long);
        assert_eq!(title.chars().count(), 61);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn test_restore_history_prepends_system_prompt() {
        let system = ChatMessage::system("sys");
        let restored = restore_history(vec![ChatMessage::user("hi")], system.clone());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0], system);

        let already = restore_history(
            vec![ChatMessage::system("old"), ChatMessage::user("hi")],
            system,
        );
        assert_eq!(already.len(), 2);
        assert_eq!(already[0].content, "old");
    }
}
