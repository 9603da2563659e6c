use log::debug;

use shellgibi::shell::Shell;
use shellgibi::utils::config::Config;
use shellgibi::utils::log::init_logger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new()?;
    init_logger(&config)?;
    debug!("config loaded from {}", config.config_dir.display());

    let mut shell = Shell::new(&config)?;
    shell.run()
}
