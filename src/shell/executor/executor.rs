use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;

use libc::{STDIN_FILENO, STDOUT_FILENO};
use log::{debug, error, warn};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{dup2, fork, pipe2, ForkResult, Pid};

use super::redirect::Redirection;
use crate::error::{Result, ShellError};
use crate::shell::jobs::wait_for;
use crate::shell::parser::{CommandChain, Stage};
use crate::shell::signals;
use crate::utils::path::PathResolver;

const EXIT_NOT_FOUND: i32 = 127;
const EXIT_NOT_EXECUTABLE: i32 = 126;
const EXIT_SETUP_FAILED: i32 = 1;

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Blank line, nothing spawned.
    Skipped,
    /// Foreground chain finished with the status of its last stage.
    Finished(i32),
    /// Background chain still running.
    Detached(Vec<Pid>),
}

/// Everything a child needs, built before forking so the child itself never
/// allocates. `argv_ptrs` points into `argv` and ends with a null pointer.
struct StagePlan {
    name: String,
    image: Option<CString>,
    argv: Vec<CString>,
    argv_ptrs: Vec<*const libc::c_char>,
    redirection: Option<Redirection>,
}

pub struct Executor {
    search_path: Option<String>,
}

impl Executor {
    pub fn new() -> Self {
        Self { search_path: None }
    }

    /// Searches `search_path` instead of the process environment.
    pub fn with_search_path(search_path: impl Into<String>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    pub fn resolver(&self) -> PathResolver {
        match &self.search_path {
            Some(search_path) => PathResolver::from_search_path(search_path),
            None => PathResolver::from_env(),
        }
    }

    /// Runs every stage of `chain` as its own process, wired by pipes. A
    /// foreground chain is waited for as a whole; a background one is handed
    /// back still running.
    pub fn execute(&self, chain: CommandChain, background: bool) -> Result<Outcome> {
        if chain.is_noop() {
            return Ok(Outcome::Skipped);
        }

        let plans = self.plan(&chain)?;
        let pids = spawn(&plans)?;
        drop(plans);
        debug!("spawned {:?} for `{}`", pids, chain);

        if background {
            return Ok(Outcome::Detached(pids));
        }

        let mut status = 0;
        for pid in pids {
            status = wait_for(pid)?;
        }
        debug!("`{}` finished with {}", chain, status);
        Ok(Outcome::Finished(status))
    }

    fn plan(&self, chain: &CommandChain) -> Result<Vec<StagePlan>> {
        let resolver = self.resolver();
        let last = chain.len() - 1;

        chain
            .stages()
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                // a piped stage writes to its successor, never to a file
                let redirection = if i == last {
                    Redirection::open(&stage.redirects)?
                } else {
                    if !stage.redirects.is_empty() {
                        warn!("{}: redirects ignored inside a pipeline", stage.name);
                    }
                    None
                };
                let argv = argv(stage)?;
                let argv_ptrs = argv
                    .iter()
                    .map(|arg| arg.as_ptr())
                    .chain(std::iter::once(std::ptr::null()))
                    .collect();
                Ok(StagePlan {
                    name: stage.name.clone(),
                    image: resolve_image(&resolver, stage)?,
                    argv,
                    argv_ptrs,
                    redirection,
                })
            })
            .collect()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_image(resolver: &PathResolver, stage: &Stage) -> Result<Option<CString>> {
    match resolver.resolve(&stage.name) {
        Some(path) => Ok(Some(cstring(&stage.name, path.as_os_str().as_bytes())?)),
        None => {
            // the stage still gets a process so the pipeline stays intact
            let err = ShellError::Resolution {
                name: stage.name.clone(),
            };
            error!("{}", err.report_line(&stage.name));
            eprintln!("{}", err.report_line(&stage.name));
            Ok(None)
        }
    }
}

fn argv(stage: &Stage) -> Result<Vec<CString>> {
    stage
        .argv()
        .into_iter()
        .map(|arg| cstring(&stage.name, arg.as_bytes()))
        .collect()
}

fn cstring(command: &str, bytes: &[u8]) -> Result<CString> {
    CString::new(bytes).map_err(|_| ShellError::usage(command, "argument contains a NUL byte"))
}

fn spawn(plans: &[StagePlan]) -> Result<Vec<Pid>> {
    let mut pids = Vec::with_capacity(plans.len());
    let mut upstream: Option<OwnedFd> = None;

    for (i, plan) in plans.iter().enumerate() {
        let (next_upstream, downstream) = if i + 1 < plans.len() {
            let (read, write) = pipe2(OFlag::O_CLOEXEC)?;
            (Some(read), Some(write))
        } else {
            (None, None)
        };

        // SAFETY: the child only calls async-signal-safe functions before it
        // execs or exits.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => exec_stage(plan, upstream.as_ref(), downstream.as_ref()),
            Ok(ForkResult::Parent { child }) => {
                debug!("stage {} {:?} is pid {}", i, plan.argv, child);
                pids.push(child);
            }
            Err(e) => {
                error!("fork failed for {}: {}", plan.name, e);
                drop(upstream);
                drop(downstream);
                drop(next_upstream);
                for pid in &pids {
                    let _ = wait_for(*pid);
                }
                return Err(e.into());
            }
        }

        // the children own these now
        drop(downstream);
        upstream = next_upstream;
    }
    Ok(pids)
}

/// Child side: rewire stdio, then load the image. Never returns.
fn exec_stage(plan: &StagePlan, stdin: Option<&OwnedFd>, stdout: Option<&OwnedFd>) -> ! {
    signals::restore_default_signals();

    if let Some(fd) = stdin {
        if dup2(fd.as_raw_fd(), STDIN_FILENO).is_err() {
            exit_child(EXIT_SETUP_FAILED);
        }
    }
    if let Some(fd) = stdout {
        if dup2(fd.as_raw_fd(), STDOUT_FILENO).is_err() {
            exit_child(EXIT_SETUP_FAILED);
        }
    }
    if let Some(redirection) = &plan.redirection {
        if redirection.apply().is_err() {
            exit_child(EXIT_SETUP_FAILED);
        }
    }

    let Some(image) = &plan.image else {
        exit_child(EXIT_NOT_FOUND);
    };
    // SAFETY: both pointers come from CStrings owned by `plan`, and
    // `argv_ptrs` is null-terminated.
    unsafe { libc::execv(image.as_ptr(), plan.argv_ptrs.as_ptr()) };
    let err = Errno::last();
    exit_child(if err == Errno::ENOENT {
        EXIT_NOT_FOUND
    } else {
        EXIT_NOT_EXECUTABLE
    })
}

fn exit_child(code: i32) -> ! {
    // SAFETY: _exit skips atexit handlers and buffered-stream flushing that
    // belong to the parent.
    unsafe { libc::_exit(code) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shell::parser::parse;
    use std::fs;
    use std::time::{Duration, Instant};

    const SYSTEM_PATH: &str = "/usr/bin:/bin";

    fn run(line: &str) -> Result<Outcome> {
        let chain = parse(line).unwrap();
        let background = chain.background;
        Executor::with_search_path(SYSTEM_PATH).execute(chain, background)
    }

    #[test]
    fn empty_line_is_a_successful_noop() {
        assert_eq!(run("   ").unwrap(), Outcome::Skipped);
    }

    #[test]
    fn single_stage_writes_through_truncate_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        fs::write(&out, "stale content that must go away\n").unwrap();

        let outcome = run(&format!("echo 'hello world' >{}", out.display())).unwrap();
        assert_eq!(outcome, Outcome::Finished(0));
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello world\n");
    }

    #[test]
    fn append_redirect_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("log.txt");
        fs::write(&out, "first\n").unwrap();

        run(&format!("echo second >>{}", out.display())).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn only_the_last_parsed_output_redirect_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let truncated = dir.path().join("a.txt");
        let appended = dir.path().join("b.txt");

        run(&format!(
            "echo once >{} >>{}",
            truncated.display(),
            appended.display()
        ))
        .unwrap();
        assert!(!truncated.exists());
        assert_eq!(fs::read_to_string(&appended).unwrap(), "once\n");
    }

    #[test]
    fn input_redirect_becomes_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        fs::write(&input, "abc\n").unwrap();
        let out = dir.path().join("out.txt");

        let outcome = run(&format!(
            "sh -c \"tr a-z A-Z >{}\" <{}",
            out.display(),
            input.display()
        ))
        .unwrap();
        assert_eq!(outcome, Outcome::Finished(0));
        assert_eq!(fs::read_to_string(&out).unwrap(), "ABC\n");
    }

    #[test]
    fn three_stage_pipeline_streams_through_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("count.txt");

        let outcome = run(&format!(
            "printf 'b\\na\\nb\\n' | sort | uniq >{}",
            out.display()
        ))
        .unwrap();
        assert_eq!(outcome, Outcome::Finished(0));
        assert_eq!(fs::read_to_string(&out).unwrap(), "a\nb\n");
    }

    #[test]
    fn inner_stage_redirect_is_not_applied() {
        let dir = tempfile::tempdir().unwrap();
        let skipped = dir.path().join("x");
        let out = dir.path().join("out.txt");

        let outcome = run(&format!(
            "echo hi >{} | cat >{}",
            skipped.display(),
            out.display()
        ))
        .unwrap();
        assert_eq!(outcome, Outcome::Finished(0));
        assert!(!skipped.exists());
        assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");
    }

    #[test]
    fn pipeline_status_is_the_last_stage() {
        assert_eq!(run("true | false").unwrap(), Outcome::Finished(1));
        assert_eq!(run("false | true").unwrap(), Outcome::Finished(0));
    }

    #[test]
    fn unresolvable_program_exits_non_zero() {
        let outcome = run("definitely-not-a-real-program-xyz --flag").unwrap();
        assert_eq!(outcome, Outcome::Finished(EXIT_NOT_FOUND));
    }

    #[test]
    fn unloadable_image_exits_non_zero() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("not-executable.sh");
        fs::write(&script, "#!/bin/sh\necho never\n").unwrap();

        let outcome = run(&script.display().to_string()).unwrap();
        assert_eq!(outcome, Outcome::Finished(EXIT_NOT_EXECUTABLE));
    }

    #[test]
    fn unopenable_redirect_spawns_nothing() {
        let err = run("echo hi >/definitely/not/a/dir/out.txt").unwrap_err();
        assert!(matches!(err, ShellError::Io { .. }));
    }

    #[test]
    fn background_chain_returns_without_waiting() {
        let started = Instant::now();
        let outcome = run("sleep 5 &").unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));

        let Outcome::Detached(pids) = outcome else {
            panic!("expected a detached chain, got {:?}", outcome);
        };
        assert_eq!(pids.len(), 1);
        nix::sys::signal::kill(pids[0], nix::sys::signal::Signal::SIGKILL).unwrap();
        assert_eq!(wait_for(pids[0]).unwrap(), 128 + libc::SIGKILL);
    }
}
