//! Fire-and-forget execution of the capture tool.
//!
//! The capture tool owns the terminal while it runs: stdio is inherited and
//! nothing is captured. Its exit status is logged but never turned into an
//! error, so camerpi's own exit code does not depend on it.

use std::process::{Command, ExitStatus};

/// Render a command line for logging, quoting tokens where the shell would need it.
pub fn display_command(tokens: &[String]) -> String {
    shell_words::join(tokens)
}

/// Run `tokens[0]` with the remaining tokens as arguments and wait for it.
///
/// Returns the exit status when the process could be started. An empty token
/// list does nothing and returns `None`, as does a spawn failure (which is
/// logged as a warning).
pub fn run_command(tokens: &[String]) -> Option<ExitStatus> {
    let (program, args) = tokens.split_first()?;

    log::info!("running: {}", display_command(tokens));

    match Command::new(program).args(args).status() {
        Ok(status) => {
            if status.success() {
                log::debug!("{} exited with {}", program, status);
            } else {
                log::warn!("{} exited with {}", program, status);
            }
            Some(status)
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                log::warn!("{} not found, is libcamera-apps installed?", program);
            } else {
                log::warn!("failed to run {}: {}", program, e);
            }
            None
        }
    }
}
