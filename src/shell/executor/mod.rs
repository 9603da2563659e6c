pub mod complete;
#[allow(clippy::module_inception)]
pub mod executor;
pub mod redirect;

pub use complete::{complete_chain, expand, Candidate, Expansion};
pub use executor::{Executor, Outcome};
