use super::{CommandLine, ExecOptions, Shell, ShellError};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, ExitStatus};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs commands as real child processes
///
/// stdout and stderr of the child share a single pipe so output arrives in
/// the order the child wrote it. Environment overrides apply to the child
/// only; the parent environment is never touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultShell;

impl DefaultShell {
    /// Create a shell that spawns real processes
    pub fn new() -> Self {
        Self
    }

    /// Spawn the command and feed each output line to `sink`
    fn run(
        &self,
        cmd: &CommandLine,
        opts: &ExecOptions,
        sink: &mut dyn FnMut(&str),
    ) -> Result<i32, ShellError> {
        let command = cmd.to_string();
        info!("+ {}", command);

        let io_error = |source: io::Error| ShellError::Io {
            command: command.clone(),
            source,
        };

        let (reader, writer) = io::pipe().map_err(io_error)?;
        let stderr_writer = writer.try_clone().map_err(io_error)?;

        // The Command owns our copies of the write end; it must be dropped
        // before reading or the pipe never reaches EOF.
        let mut child = {
            let mut process = Command::new(&cmd.program);
            process.args(&cmd.args).stdout(writer).stderr(stderr_writer);
            if let Some(dir) = &opts.directory {
                process.current_dir(dir);
            }
            for name in &opts.clear_env_vars {
                process.env_remove(name);
            }
            for (name, value) in &opts.set_env_vars {
                process.env(name, value);
            }
            process.spawn().map_err(|source| ShellError::Spawn {
                command: command.clone(),
                source,
            })?
        };

        let (tx, rx) = mpsc::channel::<io::Result<String>>();
        let pump = thread::spawn(move || {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf).into_owned();
                        if tx.send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });

        let deadline = opts.timeout.map(|timeout| Instant::now() + timeout);
        loop {
            let received = match deadline {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Ok(line)) => sink(&line),
                Ok(Err(source)) => {
                    kill(&mut child);
                    return Err(io_error(source));
                }
                Err(RecvTimeoutError::Timeout) => {
                    kill(&mut child);
                    return Err(self.timed_out(&command, opts));
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        let _ = pump.join();

        let status = match self.wait(&mut child, deadline).map_err(io_error)? {
            Some(status) => status,
            None => {
                kill(&mut child);
                return Err(self.timed_out(&command, opts));
            }
        };

        let exit_code = status.code().unwrap_or(-1);
        debug!(command = %command, exit_code, "command finished");

        if !status.success() && opts.raise_on_failure {
            return Err(ShellError::Failed { command, exit_code });
        }

        Ok(exit_code)
    }

    /// Wait for the child to exit, giving up at `deadline`
    fn wait(&self, child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
        let Some(deadline) = deadline else {
            return child.wait().map(Some);
        };

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    fn timed_out(&self, command: &str, opts: &ExecOptions) -> ShellError {
        let timeout = opts.timeout.unwrap_or_default();
        warn!(command = %command, ?timeout, "command timed out; killed child process");
        ShellError::Timeout {
            command: command.to_string(),
            timeout,
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Shell for DefaultShell {
    fn execute(&self, cmd: &CommandLine, opts: &ExecOptions) -> Result<i32, ShellError> {
        let stdout = io::stdout();
        self.run(cmd, opts, &mut |line| {
            let mut out = stdout.lock();
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        })
    }

    fn output_for(&self, cmd: &CommandLine, opts: &ExecOptions) -> Result<String, ShellError> {
        let mut output = String::new();
        self.run(cmd, opts, &mut |line| output.push_str(line))?;
        Ok(output)
    }
}
