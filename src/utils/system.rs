use std::borrow::Cow;
use std::env;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, ExitStatus, Stdio};

use log::debug;

use crate::shell::signals;

/// Hands a whole command string to `sh -c`, the way `system(3)` does.
pub fn run(command: &str) -> io::Result<ExitStatus> {
    debug!("delegating to sh: {}", command);
    create_command(command)
        .current_dir(env::current_dir()?)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
}

fn create_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    // SAFETY: only resets signal dispositions, which is async-signal-safe.
    unsafe {
        cmd.pre_exec(|| {
            signals::restore_default_signals();
            Ok(())
        });
    }
    cmd
}

/// Quotes one argument so `sh` sees it as a single word.
pub fn quote(arg: &str) -> Cow<'_, str> {
    shell_words::quote(arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_keeps_arguments_whole() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("two words"), "'two words'");
        assert_eq!(quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn exit_status_comes_from_the_system_shell() {
        assert!(run("exit 0").unwrap().success());
        assert_eq!(run("exit 3").unwrap().code(), Some(3));
    }
}
