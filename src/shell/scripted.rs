use super::{CommandLine, ExecOptions, Shell, ShellError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct Reply {
    output: String,
    exit_code: i32,
}

#[derive(Debug, Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    received: Vec<(String, ExecOptions)>,
}

/// A [`Shell`] that replays canned output instead of spawning processes
///
/// Replies are keyed by the full command string (e.g. `"git branch -a"`).
/// Several replies queued for one command are handed out in order; the last
/// one repeats. Every command received is recorded.
#[derive(Debug, Default)]
pub struct ScriptedShell {
    script: Mutex<Script>,
}

impl ScriptedShell {
    /// Create a shell with no scripted replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue successful output for a command
    pub fn reply(self, command: &str, output: &str) -> Self {
        self.reply_with_status(command, output, 0)
    }

    /// Queue output and an exit status for a command
    pub fn reply_with_status(self, command: &str, output: &str, exit_code: i32) -> Self {
        self.lock()
            .replies
            .entry(command.to_string())
            .or_default()
            .push_back(Reply {
                output: output.to_string(),
                exit_code,
            });
        self
    }

    /// Commands received so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.lock().received.iter().map(|(cmd, _)| cmd.clone()).collect()
    }

    /// Options passed with the most recent command
    pub fn last_options(&self) -> Option<ExecOptions> {
        self.lock().received.last().map(|(_, opts)| opts.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn play(&self, cmd: &CommandLine, opts: &ExecOptions) -> Result<Reply, ShellError> {
        let command = cmd.to_string();
        let mut script = self.lock();
        script.received.push((command.clone(), opts.clone()));

        let queue = script
            .replies
            .get_mut(&command)
            .ok_or_else(|| ShellError::Unscripted(command.clone()))?;
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
        .ok_or_else(|| ShellError::Unscripted(command.clone()))?;

        if reply.exit_code != 0 && opts.raise_on_failure {
            return Err(ShellError::Failed {
                command,
                exit_code: reply.exit_code,
            });
        }
        Ok(reply)
    }
}

impl Shell for ScriptedShell {
    fn execute(&self, cmd: &CommandLine, opts: &ExecOptions) -> Result<i32, ShellError> {
        self.play(cmd, opts).map(|reply| reply.exit_code)
    }

    fn output_for(&self, cmd: &CommandLine, opts: &ExecOptions) -> Result<String, ShellError> {
        self.play(cmd, opts).map(|reply| reply.output)
    }
}
