use std::env;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::debug;

use super::history::History;
use super::session::ExitSignal;
use crate::error::{Result, ShellError};
use crate::utils::system::{self, quote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Cd,
    History,
    Wait,
    MyJobs,
    Pause,
    MyBg,
    MyFg,
    Alarm,
    LsHome,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            "history" => Some(Builtin::History),
            "wait" => Some(Builtin::Wait),
            "myjobs" => Some(Builtin::MyJobs),
            "pause" => Some(Builtin::Pause),
            "mybg" => Some(Builtin::MyBg),
            "myfg" => Some(Builtin::MyFg),
            "alarm" => Some(Builtin::Alarm),
            "lshome" => Some(Builtin::LsHome),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => "exit",
            Builtin::Cd => "cd",
            Builtin::History => "history",
            Builtin::Wait => "wait",
            Builtin::MyJobs => "myjobs",
            Builtin::Pause => "pause",
            Builtin::MyBg => "mybg",
            Builtin::MyFg => "myfg",
            Builtin::Alarm => "alarm",
            Builtin::LsHome => "lshome",
        }
    }

    pub fn run(self, args: &[String], history: &History, out: &mut dyn Write) -> Result<ExitSignal> {
        debug!("builtin {} {:?}", self.name(), args);
        match self {
            Builtin::Exit => return Ok(ExitSignal::Exit),
            Builtin::Cd => change_dir(args)?,
            Builtin::History => {
                for line in history.newest_first() {
                    writeln!(out, "{}", line).map_err(|e| ShellError::io("<stdout>", e))?;
                }
            }
            Builtin::Wait => {
                let secs = numeric_arg(self, args)?;
                thread::sleep(Duration::from_secs(secs));
                writeln!(out, "Waited for {} secs", secs).map_err(|e| ShellError::io("<stdout>", e))?;
            }
            _ => delegate(self, &self.delegated_command(args)?)?,
        }
        Ok(ExitSignal::Continue)
    }

    /// The `sh -c` string a delegating built-in hands off.
    pub fn delegated_command(self, args: &[String]) -> Result<String> {
        let command = match self {
            Builtin::MyJobs => {
                let user = match env::var("USER") {
                    Ok(user) => quote(&user).into_owned(),
                    Err(_) => "\"$(id -un)\"".to_string(),
                };
                format!("ps -fU {} -eo pid,cmd,stat", user)
            }
            Builtin::Pause => format!("kill -TSTP {}", numeric_arg(self, args)?),
            Builtin::MyBg | Builtin::MyFg => format!("kill -CONT {}", numeric_arg(self, args)?),
            Builtin::LsHome => format!("ls {}", quote(&shellexpand::tilde("~"))),
            Builtin::Alarm => {
                let line = cron_line(args)?;
                format!("printf '%s\\n' {} | crontab -", quote(&line))
            }
            _ => {
                return Err(ShellError::usage(self.name(), "not a delegating built-in"));
            }
        };
        Ok(command)
    }
}

fn change_dir(args: &[String]) -> Result<()> {
    let target = args.first().map(String::as_str).unwrap_or("~");
    let target = shellexpand::tilde(target);
    env::set_current_dir(target.as_ref()).map_err(|e| ShellError::usage("cd", e.to_string()))
}

fn numeric_arg(builtin: Builtin, args: &[String]) -> Result<u64> {
    let arg = args
        .first()
        .ok_or_else(|| ShellError::usage(builtin.name(), "missing argument"))?;
    arg.parse::<u64>()
        .map_err(|_| ShellError::usage(builtin.name(), format!("not a number: {}", arg)))
}

/// `alarm 7.15 music.wav` becomes `15 7 * * * aplay <cwd>/music.wav`.
fn cron_line(args: &[String]) -> Result<String> {
    let usage = || ShellError::usage("alarm", "usage: alarm <H.MM> <sound file>");
    let (time, sound) = match args {
        [time, sound, ..] => (time, sound),
        _ => return Err(usage()),
    };
    let (hour, minute) = time.split_once(['.', ':']).ok_or_else(usage)?;
    let hour: u32 = hour.parse().map_err(|_| usage())?;
    let minute: u32 = minute.parse().map_err(|_| usage())?;
    if hour > 23 || minute > 59 {
        return Err(ShellError::usage("alarm", format!("invalid time: {}", time)));
    }

    let sound = if Path::new(sound).is_absolute() {
        sound.to_string()
    } else {
        let cwd = env::current_dir().map_err(|e| ShellError::io(".", e))?;
        cwd.join(sound).display().to_string()
    };
    Ok(format!("{} {} * * * aplay {}", minute, hour, sound))
}

fn delegate(builtin: Builtin, command: &str) -> Result<()> {
    let status = system::run(command).map_err(|e| ShellError::usage(builtin.name(), e.to_string()))?;
    if !status.success() {
        debug!("{} exited with {}", command, status);
    }
    Ok(())
}
