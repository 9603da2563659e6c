pub mod builtins;
pub mod executor;
pub mod history;
pub mod jobs;
pub mod parser;
pub mod readline;
pub mod session;
#[allow(clippy::module_inception)]
pub mod shell;
pub mod signals;

pub use shell::Shell;
