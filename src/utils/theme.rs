use colored::Colorize;

use crate::error::SHELL_NAME;
use crate::utils::path::current_dir;

pub struct Theme {
    pub user_style: Box<dyn Fn(&str) -> String>,
    pub dir_style: Box<dyn Fn(&str) -> String>,
    pub error_style: Box<dyn Fn(&str) -> String>,
    pub notice_style: Box<dyn Fn(&str) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            user_style: Box::new(|s| s.bright_green().bold().to_string()),
            dir_style: Box::new(|s| s.bright_blue().to_string()),
            error_style: Box::new(|s| s.bright_red().to_string()),
            notice_style: Box::new(|s| s.bright_magenta().to_string()),
        }
    }
}

impl Theme {
    /// `<user>@<host>:<cwd> shellgibi$ `
    pub fn prompt(&self) -> String {
        let user = std::env::var("USER").unwrap_or_default();
        let host = nix::unistd::gethostname()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_default();
        format!(
            "{}:{} {}$ ",
            (self.user_style)(&format!("{}@{}", user, host)),
            (self.dir_style)(&current_dir()),
            SHELL_NAME
        )
    }

    pub fn plain() -> Self {
        Theme {
            user_style: Box::new(str::to_string),
            dir_style: Box::new(str::to_string),
            error_style: Box::new(str::to_string),
            notice_style: Box::new(str::to_string),
        }
    }
}

pub fn load_theme(theme_name: &str) -> Theme {
    match theme_name {
        "plain" => Theme::plain(),
        _ => Theme::default(),
    }
}
