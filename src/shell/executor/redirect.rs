use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use libc::{STDIN_FILENO, STDOUT_FILENO};
use log::debug;
use nix::unistd::dup2;

use crate::error::{Result, ShellError};
use crate::shell::parser::Redirects;

/// rw-r-----
pub const OUTPUT_MODE: u32 = 0o640;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdin,
    Stdout,
}

impl Stream {
    pub fn fd(self) -> RawFd {
        match self {
            Stream::Stdin => STDIN_FILENO,
            Stream::Stdout => STDOUT_FILENO,
        }
    }
}

/// An opened redirect target waiting to replace one standard stream of a
/// child. The file is closed when this is dropped, so the parent releases its
/// copy as soon as the child has been forked.
#[derive(Debug)]
pub struct Redirection {
    file: File,
    stream: Stream,
    path: PathBuf,
}

impl Redirection {
    /// Opens the redirect a stage asked for. Only the first present slot counts:
    /// truncate, then append, then input. Relative paths resolve against the
    /// working directory at the time of the call.
    pub fn open(redirects: &Redirects) -> Result<Option<Self>> {
        let (path, stream, options) = if let Some(path) = redirects.truncate() {
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true).mode(OUTPUT_MODE);
            (path, Stream::Stdout, options)
        } else if let Some(path) = redirects.append() {
            let mut options = OpenOptions::new();
            options.append(true).create(true).mode(OUTPUT_MODE);
            (path, Stream::Stdout, options)
        } else if let Some(path) = redirects.input() {
            let mut options = OpenOptions::new();
            options.read(true);
            (path, Stream::Stdin, options)
        } else {
            return Ok(None);
        };

        let file = options
            .open(path)
            .map_err(|e| ShellError::io(path, e))?;
        debug!("opened {} for {:?}", path, stream);
        Ok(Some(Self {
            file,
            stream,
            path: PathBuf::from(path),
        }))
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Points the target stream at the file. Only `dup2`, safe after fork.
    pub fn apply(&self) -> nix::Result<()> {
        dup2(self.file.as_raw_fd(), self.stream.fd())?;
        Ok(())
    }
}
