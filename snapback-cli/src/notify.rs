//! Desktop notifications via `notify-send`.
//!
//! Backups usually run from cron on a machine nobody is looking at, so the
//! result can be pushed to a desktop session, optionally on another host
//! over ssh (per-target `notify_remote`). Best-effort: a missing
//! `notify-send` is logged and otherwise ignored.

use std::io;
use std::process::{Command, Stdio};

use crate::logger::Logger;

const OK_ICON: &str = "ok";
const ERROR_ICON: &str = "error";

/// Send a desktop notification, locally or to `remote` via ssh.
pub fn send_notification<L: Logger>(
    title: &str,
    message: &str,
    error: bool,
    remote: Option<&str>,
    logger: &L,
) {
    let icon = if error { ERROR_ICON } else { OK_ICON };
    let result = match remote {
        Some(host) => {
            let command = [
                shell_quote("notify-send"),
                shell_quote(title),
                shell_quote(message),
                shell_quote("-i"),
                shell_quote(icon),
            ]
            .join(" ");
            run(Command::new("ssh").arg(host).arg(command))
        }
        None => run(Command::new("notify-send")
            .arg(title)
            .arg(message)
            .arg("-i")
            .arg(icon)),
    };

    if let Err(e) = result {
        logger.info(&format!("could not send notification \"{title} {message}\": {e}"));
    }
}

fn run(command: &mut Command) -> io::Result<()> {
    let status = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if !status.success() {
        return Err(io::Error::other(format!(
            "exit status {}",
            status.code().unwrap_or(-1)
        )));
    }
    Ok(())
}

/// Quote a string for the remote shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
