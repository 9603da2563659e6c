use std::env;
use std::fs::{self, read_dir};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, error};
use nix::unistd::{access, AccessFlags};

pub const SEARCH_PATH_VAR: &str = "PATH";

/// Names starting with `/` or `.` are already paths and are never searched.
pub fn is_explicit_path(name: &str) -> bool {
    name.starts_with('/') || name.starts_with('.')
}

/// Regular file (after following links) the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && access(path, AccessFlags::X_OK).is_ok(),
        Err(_) => false,
    }
}

/// Ordered directory list used to turn bare program names into paths.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    dirs: Vec<PathBuf>,
}

impl PathResolver {
    /// Reads the search-path variable as it is right now.
    pub fn from_env() -> Self {
        match env::var(SEARCH_PATH_VAR) {
            Ok(value) => Self::from_search_path(&value),
            Err(e) => {
                error!("shellgibi: error with env {}: {:?}", SEARCH_PATH_VAR, e);
                Self::default()
            }
        }
    }

    /// Colon separated list; empty entries are skipped.
    pub fn from_search_path(value: &str) -> Self {
        Self {
            dirs: value
                .split(':')
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .collect(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn resolve(&self, program: &str) -> Option<PathBuf> {
        if is_explicit_path(program) {
            return Some(PathBuf::from(program));
        }
        if program.is_empty() || program.contains('/') {
            return None;
        }

        for dir in &self.dirs {
            let candidate = dir.join(program);
            if is_executable(&candidate) {
                debug!("resolved {} to {}", program, candidate.display());
                return Some(candidate);
            }
        }
        debug!("{} not found in {} directories", program, self.dirs.len());
        None
    }

    /// Executable entries of every search directory whose name starts with
    /// `prefix`, sorted by name inside each directory, directories in order.
    pub fn executables_with_prefix(&self, prefix: &str) -> Vec<(String, PathBuf)> {
        self.dirs
            .iter()
            .flat_map(|dir| executables_in(dir, prefix))
            .collect()
    }
}

pub fn executables_in(dir: &Path, prefix: &str) -> Vec<(String, PathBuf)> {
    let mut found = Vec::new();
    match read_dir(dir) {
        Ok(list) => {
            for entry in list.flatten() {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if !name.starts_with(prefix) {
                    continue;
                }
                let path = entry.path();
                if is_executable(&path) {
                    found.push((name, path));
                }
            }
        }
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                error!("shellgibi: fs read_dir error: {}: {}", dir.display(), e);
            }
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
}

pub fn current_dir() -> String {
    match env::current_dir() {
        Ok(dir) => dir.to_string_lossy().to_string(),
        Err(e) => {
            error!("shellgibi: PROMPT: env current_dir error: {}", e);
            String::new()
        }
    }
}
