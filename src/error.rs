use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub const SHELL_NAME: &str = "shellgibi";

/// Malformed input detected while turning a line into a chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unmatched quote in `{0}`")]
    UnmatchedQuote(String),
    #[error("missing redirect target after `{0}`")]
    MissingRedirectTarget(String),
    #[error("missing command around `|`")]
    EmptyStage,
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("command not found")]
    Resolution { name: String },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Sys(#[from] nix::Error),
    #[error("{reason}")]
    Usage { command: String, reason: String },
}

impl ShellError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ShellError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn usage(command: &str, reason: impl Into<String>) -> Self {
        ShellError::Usage {
            command: command.to_string(),
            reason: reason.into(),
        }
    }

    /// Line printed on stderr: `shellgibi: <command>: <reason>`.
    pub fn report_line(&self, command: &str) -> String {
        let command = match self {
            ShellError::Resolution { name } => name.as_str(),
            ShellError::Usage { command, .. } => command.as_str(),
            _ => command,
        };
        format!("{}: {}: {}", SHELL_NAME, command, self)
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_uses_program_and_command_names() {
        let err = ShellError::Resolution {
            name: "nosuchprog".to_string(),
        };
        assert_eq!(
            err.report_line("ignored"),
            "shellgibi: nosuchprog: command not found"
        );
    }

    #[test]
    fn io_error_names_the_path() {
        let err = ShellError::io(
            "/nope/out.txt",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.report_line("echo"),
            "shellgibi: echo: /nope/out.txt: No such file or directory"
        );
    }
}
