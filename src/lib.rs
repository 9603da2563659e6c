pub mod error;
pub mod shell;
pub mod utils;
