use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::SHELL_NAME;
use crate::shell::history::DEFAULT_HISTORY_SIZE;

pub struct Config {
    pub name: String,
    pub config_dir: PathBuf,
    pub theme: String,
    pub history_file: PathBuf,
    pub history_size: usize,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub logger_stderr: bool,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config").join(SHELL_NAME)
        } else {
            env::temp_dir().join(SHELL_NAME)
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from(SHELL_NAME),
            theme: String::from("default"),
            history_file: config_dir.join(format!(".{}_history", SHELL_NAME)),
            history_size: DEFAULT_HISTORY_SIZE,
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
            logger_stderr: false,
            config_dir,
        }
    }

    pub fn new() -> io::Result<Self> {
        // .env first, real environment wins
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let config = Self::from_vars(|key| env::var(key).ok());

        if let Some(parent) = config.history_file.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(config)
    }

    /// Defaults overridden by whatever `lookup` knows about.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        let var = |suffix: &str| lookup(&format!("{}_{}", SHELL_NAME.to_uppercase(), suffix));

        if let Some(theme) = var("THEME") {
            config.theme = theme;
        }
        if let Some(editor) = var("EDITOR") {
            config.editor_mode = editor;
        }
        if let Some(history) = var("HISTORY") {
            config.history_file = PathBuf::from(history);
        }
        if let Some(size) = var("HISTORY_SIZE").and_then(|s| s.parse().ok()) {
            config.history_size = size;
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.logger_level = level;
        }
        if let Some(dir) = var("LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }
        if let Some(flag) = var("LOG_STDERR") {
            config.logger_stderr = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_without_overrides() {
        let config = Config::from_vars(|_| None);
        assert_eq!(config.name, "shellgibi");
        assert_eq!(config.history_size, 10);
        assert_eq!(config.get_edit_mode(), EditMode::Emacs);
        assert!(config.history_file.ends_with(".shellgibi_history"));
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SHELLGIBI_EDITOR", "vi"),
            ("SHELLGIBI_HISTORY_SIZE", "25"),
            ("SHELLGIBI_LOG_LEVEL", "debug"),
            ("SHELLGIBI_LOG_DIR", "/tmp/gibi-logs"),
            ("SHELLGIBI_LOG_STDERR", "1"),
        ]);
        let config = Config::from_vars(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.get_edit_mode(), EditMode::Vi);
        assert_eq!(config.history_size, 25);
        assert_eq!(config.logger_level, "debug");
        assert_eq!(config.logger_dir, PathBuf::from("/tmp/gibi-logs"));
        assert!(config.logger_stderr);
    }

    #[test]
    fn bad_history_size_keeps_default() {
        let config = Config::from_vars(|key| {
            (key == "SHELLGIBI_HISTORY_SIZE").then(|| "lots".to_string())
        });
        assert_eq!(config.history_size, DEFAULT_HISTORY_SIZE);
    }
}
