//! Run tool - Execute shell commands in the workspace root

use serde_json::json;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::limits::MAX_COMMAND_OUTPUT_CHARS;
use crate::tools::args::RunArgs;
use crate::tools::{ToolContext, ToolResult};

pub(super) async fn execute(args: RunArgs, ctx: &ToolContext) -> ToolResult {
    let command = args.command.trim();
    if command.is_empty() {
        return ToolResult::error("Command is empty");
    }

    if !ctx.operator().confirm_command(command).await {
        tracing::info!(command = %command, "Command rejected by operator");
        return ToolResult::failure(format!("Command rejected by user: {}", command));
    }
    tracing::info!(command = %command, "Executing shell command");

    // Build command based on platform
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    cmd.current_dir(ctx.workspace().root());
    cmd.kill_on_drop(true);
    cmd.stdin(Stdio::null()); // Prevent hanging on input
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let timeout_duration = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.tool_timeout());

    let child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return ToolResult::error(format!("Failed to spawn command: {}", e)),
    };

    // Dropping the wait future drops the child, which kills it
    tokio::select! {
        _ = ctx.cancel.cancelled() => {
            tracing::info!(command = %command, "Command cancelled");
            killed("Command cancelled")
        }
        result = timeout(timeout_duration, child.wait_with_output()) => match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let exit_code = output.status.code().unwrap_or(-1);

                let combined = match (stdout.is_empty(), stderr.is_empty()) {
                    (true, true) => String::new(),
                    (false, true) => stdout.into_owned(),
                    (true, false) => stderr.into_owned(),
                    (false, false) => format!("{}\n{}", stdout, stderr),
                };

                ToolResult {
                    output: json!({
                        "output": truncate_output(&combined, MAX_COMMAND_OUTPUT_CHARS),
                        "exitCode": exit_code,
                        "killed": false
                    })
                    .to_string(),
                    is_error: exit_code != 0,
                }
            }
            Ok(Err(e)) => ToolResult::error(format!("Failed to execute command: {}", e)),
            Err(_) => killed(&format!(
                "Command timed out after {} seconds",
                timeout_duration.as_secs()
            )),
        }
    }
}

fn killed(message: &str) -> ToolResult {
    ToolResult {
        output: json!({
            "output": message,
            "exitCode": -1,
            "killed": true
        })
        .to_string(),
        is_error: true,
    }
}

/// Keep the head and tail of `text` within `max_chars`, marking the cut
pub fn truncate_output(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let head_len = max_chars / 2;
    let tail_len = max_chars - head_len;
    let head: String = text.chars().take(head_len).collect();
    let tail: String = text.chars().skip(total - tail_len).collect();
    format!(
        "{}\n... [{} characters truncated] ...\n{}",
        head,
        total - max_chars,
        tail
    )
}
