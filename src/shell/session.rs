use std::io::Write;

use log::{debug, error};

use super::builtins::Builtin;
use super::executor::{complete_chain, Executor, Outcome};
use super::history::History;
use super::jobs::{Job, JobTable};
use super::parser::{parse, CommandChain};
use crate::error::{Result, ShellError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    Continue,
    Exit,
}

/// Per-shell state that outlives a single line: the executor, the command
/// history ring and the background jobs.
pub struct Session {
    executor: Executor,
    history: History,
    jobs: JobTable,
}

impl Session {
    pub fn new(executor: Executor, history_size: usize) -> Self {
        Self {
            executor,
            history: History::new(history_size),
            jobs: JobTable::new(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Interprets one completed input line. Errors are reported on stderr and
    /// never end the session.
    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> ExitSignal {
        self.history.record(line);
        let chain = match parse(line) {
            Ok(chain) => chain,
            Err(e) => {
                let command = line.split_whitespace().next().unwrap_or_default();
                report(&ShellError::from(e), command);
                return ExitSignal::Continue;
            }
        };
        if chain.is_noop() {
            return ExitSignal::Continue;
        }

        let command = chain.first().name.clone();
        match self.dispatch(chain, out) {
            Ok(signal) => signal,
            Err(e) => {
                report(&e, &command);
                ExitSignal::Continue
            }
        }
    }

    /// Background jobs that finished since the last call.
    pub fn reap_jobs(&mut self) -> Vec<Job> {
        self.jobs.reap()
    }

    fn dispatch(&mut self, mut chain: CommandChain, out: &mut dyn Write) -> Result<ExitSignal> {
        // a completion request is expanded even when the prefix names a builtin
        if chain.completion {
            if let Some(listing) = complete_chain(&mut chain, &self.executor.resolver()) {
                out.write_all(listing.as_bytes())
                    .map_err(|e| ShellError::io("<stdout>", e))?;
                return Ok(ExitSignal::Continue);
            }
        } else if !chain.is_pipeline() {
            if let Some(builtin) = Builtin::lookup(&chain.first().name) {
                return builtin.run(&chain.first().arguments, &self.history, out);
            }
        }

        let background = chain.background;
        let description = chain.to_string();
        match self.executor.execute(chain, background)? {
            Outcome::Skipped => {}
            Outcome::Finished(status) => debug!("`{}` exited with {}", description, status),
            Outcome::Detached(pids) => {
                let job = self.jobs.add_job(pids, description);
                let leader = job.pids.first().map(|pid| pid.as_raw()).unwrap_or_default();
                writeln!(out, "[{}] {}", job.index, leader)
                    .map_err(|e| ShellError::io("<stdout>", e))?;
            }
        }
        Ok(ExitSignal::Continue)
    }
}

pub fn report(err: &ShellError, command: &str) {
    let line = err.report_line(command);
    error!("{}", line);
    eprintln!("{}", line);
}
