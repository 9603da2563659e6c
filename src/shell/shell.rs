use log::{debug, error, warn};
use std::error::Error;
use std::io::{self, Write};

use crate::shell::executor::Executor;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::session::{ExitSignal, Session};
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::theme::{load_theme, Theme};

pub struct Shell<'a> {
    theme: Theme,
    readline: ReadlineManager<'a>,
    session: Session,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ReadlineError> {
        Ok(Self {
            theme: load_theme(&config.theme),
            readline: ReadlineManager::new(config)?,
            session: Session::new(Executor::new(), config.history_size),
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("starting shell");

        signals::ignore_interactive_signals();
        self.readline.load_history()?;

        self.run_loop()?;
        self.readline.save_history()?;

        debug!("leaving shell");
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        let mut stdout = io::stdout();
        loop {
            for job in self.session.reap_jobs() {
                println!("{}", (self.theme.notice_style)(&job.to_string()));
            }
            stdout.flush()?;

            match self.readline.readline(&self.theme.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.readline.add_history(&line)?;
                    }
                    if self.session.handle_line(&line, &mut stdout) == ExitSignal::Exit {
                        debug!("exit requested");
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    warn!("end of input");
                    println!();
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("interrupted");
                }
                Err(err) => {
                    error!("readline failed: {}", err);
                    eprintln!("{}", (self.theme.error_style)(&err.to_string()));
                }
            }
        }
        Ok(())
    }
}
