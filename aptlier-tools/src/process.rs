//! Blocking child-process invocation with the run's environment overlay.
//!
//! Every aptly and gpg call goes through [`Runner`], which layers the
//! configured variables (at least `GNUPGHOME`) onto the inherited
//! environment. A non-zero exit is always an error.

use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};

use aptlier_core::ToolError;

#[derive(Debug, Clone, Default)]
pub struct Runner {
    env: Vec<(OsString, OsString)>,
    verbose: bool,
}

impl Runner {
    pub fn new(verbose: bool) -> Self {
        Self {
            env: Vec::new(),
            verbose,
        }
    }

    /// Add a variable to the child environment overlay.
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Value of `key` in the overlay, if set.
    pub fn env_var(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// Run with inherited stdio; output goes straight to the terminal.
    pub fn run<I, S>(&self, program: impl AsRef<OsStr>, args: I) -> Result<(), ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, line) = self.command(program.as_ref(), args);
        self.log('+', &line);
        let status = cmd.status().map_err(|source| ToolError::Spawn {
            command: line.clone(),
            source,
        })?;
        if !status.success() {
            return Err(ToolError::Failed {
                command: line,
                status,
                stderr: String::new(),
            });
        }
        Ok(())
    }

    /// Run and return stdout.
    ///
    /// stderr is echoed to the terminal and kept on failure so the error
    /// says why the command failed.
    pub fn capture<I, S>(&self, program: impl AsRef<OsStr>, args: I) -> Result<String, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, line) = self.command(program.as_ref(), args);
        self.log('<', &line);
        let output = cmd
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ToolError::Spawn {
                command: line.clone(),
                source,
            })?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        eprint!("{stderr}");
        if !output.status.success() {
            return Err(ToolError::Failed {
                command: line,
                status: output.status,
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn command<I, S>(&self, program: &OsStr, args: I) -> (Command, String)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let line = display_command(program, &args);
        let mut cmd = Command::new(program);
        cmd.args(&args);
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        (cmd, line)
    }

    fn log(&self, marker: char, line: &str) {
        if self.verbose {
            tracing::info!("{marker} {line}");
        } else {
            tracing::debug!("{marker} {line}");
        }
    }
}

/// Render a command line for logs and error messages, single-quoting
/// arguments the shell would otherwise split or expand.
pub fn display_command(program: &OsStr, args: &[OsString]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(OsString::as_os_str))
        .map(|arg| shell_quote(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%~".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
