use std::fmt;

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Done(i32),
    Killed(i32),
}

/// A background chain: every stage pid plus those not yet reaped.
#[derive(Debug, Clone)]
pub struct Job {
    pub index: usize,
    pub pids: Vec<Pid>,
    pub command: String,
    pub status: JobStatus,
    pending: Vec<Pid>,
}

impl Job {
    fn new(index: usize, pids: Vec<Pid>, command: String) -> Self {
        Self {
            index,
            pending: pids.clone(),
            pids,
            command,
            status: JobStatus::Running,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            JobStatus::Running => "running",
            JobStatus::Done(_) => "done",
            JobStatus::Killed(_) => "killed",
        };
        write!(f, "[{}] {} {}", self.index, status, self.command)
    }
}

#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    fn find_available_index(&self) -> usize {
        let mut index = 1;
        while self.jobs.iter().any(|job| job.index == index) {
            index += 1;
        }
        index
    }

    pub fn add_job(&mut self, pids: Vec<Pid>, command: String) -> &Job {
        let index = self.find_available_index();
        debug!("job [{}] {:?} started: {}", index, pids, command);
        self.jobs.push(Job::new(index, pids, command));
        &self.jobs[self.jobs.len() - 1]
    }

    /// Collects finished stages without blocking and removes jobs whose
    /// stages have all exited.
    pub fn reap(&mut self) -> Vec<Job> {
        for job in self.jobs.iter_mut() {
            let last = job.pids.last().copied();
            job.pending.retain(|&pid| match poll(pid) {
                Ok(None) => true,
                Ok(Some(status)) => {
                    if Some(pid) == last {
                        job.status = status;
                    }
                    false
                }
                Err(e) => {
                    if e != Errno::ECHILD {
                        error!("waitpid {} failed: {}", pid, e);
                    }
                    false
                }
            });
            if job.pending.is_empty() && job.status == JobStatus::Running {
                job.status = JobStatus::Done(0);
            }
        }

        let (finished, running): (Vec<Job>, Vec<Job>) =
            self.jobs.drain(..).partition(Job::is_finished);
        self.jobs = running;
        for job in &finished {
            debug!("job reaped: {}", job);
        }
        finished
    }
}

fn poll(pid: Pid) -> nix::Result<Option<JobStatus>> {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG))? {
        WaitStatus::Exited(_, code) => Ok(Some(JobStatus::Done(code))),
        WaitStatus::Signaled(_, sig, _) => Ok(Some(JobStatus::Killed(sig as i32))),
        _ => Ok(None),
    }
}

/// Blocks until `pid` terminates. Returns its exit code, or 128 plus the
/// signal number when it was killed.
pub fn wait_for(pid: Pid) -> nix::Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(128 + sig as i32),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}
