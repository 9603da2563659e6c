pub mod config;
pub mod log;
pub mod path;
pub mod system;
pub mod theme;
