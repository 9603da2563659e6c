use log::warn;
use nix::sys::signal::{signal, SigHandler, Signal};

// Terminal-generated signals the shell itself must survive.
const INTERACTIVE_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTSTP];

pub fn ignore_interactive_signals() {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: installs SIG_IGN, no handler code runs.
        if let Err(e) = unsafe { signal(sig, SigHandler::SigIgn) } {
            warn!("failed to ignore {}: {}", sig, e);
        }
    }
}

/// Called in a forked child before loading the program image. Ignored
/// dispositions survive exec, so they are reset here. Async-signal-safe.
pub fn restore_default_signals() {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: installs SIG_DFL, no handler code runs.
        let _ = unsafe { signal(sig, SigHandler::SigDfl) };
    }
}
