pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::{CommandChain, OutputRedirect, Redirects, Stage};
pub use parser::{parse, COMPLETION_MARKER};
