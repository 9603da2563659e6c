use std::path::{Path, PathBuf};

use log::debug;

use crate::shell::parser::{CommandChain, COMPLETION_MARKER};
use crate::utils::path::{executables_in, PathResolver};

const CURRENT_DIR_PREFIX: &str = "./";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// What the listing shows.
    pub name: String,
    /// What gets executed.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Exactly one match: run it.
    Single(Candidate),
    /// None or several: show them, run nothing.
    Listing(Vec<Candidate>),
}

impl Expansion {
    pub fn listing(&self) -> String {
        match self {
            Expansion::Single(candidate) => format!("{}\n", candidate.name),
            Expansion::Listing(candidates) => candidates
                .iter()
                .map(|c| format!("{}\n", c.name))
                .collect(),
        }
    }
}

/// Matches `prefix` against executables. A `./` prefix only looks in the
/// current directory; anything else walks the search path. The same name in
/// two directories shows up twice.
pub fn expand(prefix: &str, resolver: &PathResolver) -> Expansion {
    let prefix = prefix.trim_end_matches(COMPLETION_MARKER);

    let mut candidates: Vec<Candidate> = match prefix.strip_prefix(CURRENT_DIR_PREFIX) {
        Some(local) => executables_in(Path::new("."), local)
            .into_iter()
            .map(|(name, _)| {
                let shown = format!("{}{}", CURRENT_DIR_PREFIX, name);
                Candidate {
                    path: PathBuf::from(&shown),
                    name: shown,
                }
            })
            .collect(),
        None => resolver
            .executables_with_prefix(prefix)
            .into_iter()
            .map(|(name, path)| Candidate { name, path })
            .collect(),
    };
    debug!("completion of {:?}: {} candidates", prefix, candidates.len());

    if candidates.len() == 1 {
        if let Some(only) = candidates.pop() {
            return Expansion::Single(only);
        }
    }
    Expansion::Listing(candidates)
}

/// Expands the stage the marker was typed on. Returns the listing to print,
/// or `None` once the stage name has been replaced and the chain can run.
pub fn complete_chain(chain: &mut CommandChain, resolver: &PathResolver) -> Option<String> {
    let expansion = expand(&chain.last().name, resolver);
    match expansion {
        Expansion::Single(candidate) => {
            debug!("completed {} to {}", chain.last().name, candidate.path.display());
            chain.last_mut().name = candidate.path.to_string_lossy().to_string();
            chain.completion = false;
            None
        }
        listing => Some(listing.listing()),
    }
}
