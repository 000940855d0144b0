//! Incremental file transfer via rsync.
//!
//! The sync tool is a collaborator: it must transfer `source` into the
//! staging directory, report failure distinctly from success, and support
//! running against a staging area pre-populated from the previous snapshot
//! so unchanged files cost no additional transfer or space.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Options for one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Paths excluded from the transfer (and deleted on the receiving side).
    pub ignore: Vec<String>,
    /// Detect changes by checksum instead of size and mtime.
    pub checksum: bool,
    /// Pass `--dry-run`: report what would change, transfer nothing.
    pub dry_run: bool,
    /// Stream tool output to the terminal.
    pub progress: bool,
}

/// Errors from the sync tool.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("source not reachable: {0}")]
    SourceNotReachable(String),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("sync to `{target}` failed: rsync error {code}{}", format_meaning(.meaning))]
    Failed {
        target: PathBuf,
        code: i32,
        meaning: Option<&'static str>,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for the incremental file-sync tool.
pub trait Syncer: Send + Sync {
    /// Check that `source` can be reached before any mutation is attempted.
    /// Remote sources (`user@host:path`) are probed over ssh.
    fn check_source(&self, source: &str) -> Result<(), SyncError>;

    /// Transfer `source` into `dest`.
    fn sync(&self, source: &str, dest: &Path, options: &SyncOptions) -> Result<(), SyncError>;
}

fn format_meaning(meaning: &Option<&'static str>) -> String {
    match meaning {
        Some(m) => format!(", {m}"),
        None => String::new(),
    }
}

/// Meaning of a documented rsync exit code.
pub fn rsync_error_meaning(code: i32) -> Option<&'static str> {
    match code {
        1 => Some("syntax or usage error"),
        2 => Some("protocol incompatibility"),
        3 => Some("errors selecting input/output files, dirs"),
        4 => Some("requested action not supported"),
        5 => Some("error starting client-server protocol"),
        6 => Some("daemon unable to append to log-file"),
        10 => Some("error in socket I/O"),
        11 => Some("error in file I/O, maybe disk full"),
        12 => Some("error in rsync protocol data stream"),
        13 => Some("errors with program diagnostics"),
        14 => Some("error in IPC code"),
        20 => Some("received SIGUSR1 or SIGINT"),
        21 => Some("some error returned by waitpid()"),
        22 => Some("error allocating core memory buffers"),
        23 => Some("partial transfer due to error"),
        24 => Some("partial transfer due to vanished source files"),
        25 => Some("the --max-delete limit stopped deletions"),
        30 => Some("timeout in data send/receive"),
        35 => Some("timeout waiting for daemon connection"),
        _ => None,
    }
}

/// Real implementation shelling out to `rsync`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealRsync;

impl RealRsync {
    fn run(mut command: Command, show_output: bool) -> Result<i32, SyncError> {
        if !show_output {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let status = command.status().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                SyncError::CommandNotFound(
                    command.get_program().to_string_lossy().to_string(),
                )
            } else {
                SyncError::Io(e)
            }
        })?;
        Ok(status.code().unwrap_or(-1))
    }
}

impl Syncer for RealRsync {
    fn check_source(&self, source: &str) -> Result<(), SyncError> {
        if let Some((host, path)) = split_remote(source) {
            let mut command = Command::new("ssh");
            command.arg(host).arg("ls").arg(path);
            match Self::run(command, false)? {
                0 => Ok(()),
                _ => Err(SyncError::SourceNotReachable(source.to_string())),
            }
        } else if Path::new(source).exists() {
            Ok(())
        } else {
            Err(SyncError::SourceNotReachable(source.to_string()))
        }
    }

    fn sync(&self, source: &str, dest: &Path, options: &SyncOptions) -> Result<(), SyncError> {
        let mut command = Command::new("rsync");
        command.args(["--human-readable", "--itemize-changes", "--stats"]);
        command.args(["-azv", "--sparse", "--delete", "--delete-excluded"]);
        for pattern in &options.ignore {
            command.arg(format!("--exclude={pattern}"));
        }
        if options.checksum {
            command.arg("--checksum");
        }
        if options.dry_run {
            command.arg("--dry-run");
        }
        // Trailing slash: transfer the contents of source, not source itself.
        command.arg(format!("{}/", source.trim_end_matches('/')));
        command.arg(dest);

        match Self::run(command, options.progress || options.dry_run)? {
            0 => Ok(()),
            code => Err(SyncError::Failed {
                target: dest.to_path_buf(),
                code,
                meaning: rsync_error_meaning(code),
            }),
        }
    }
}

/// Split a `user@host:path` source into `(host, path)`.
fn split_remote(source: &str) -> Option<(&str, &str)> {
    if !source.contains('@') {
        return None;
    }
    source.split_once(':')
}

/// Record of one mock sync invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCall {
    pub source: String,
    pub dest: PathBuf,
    pub options: SyncOptions,
}

/// Mock syncer recording calls, with configurable failure and payload.
/// Cloning creates a new handle to the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MockSyncer {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<SyncCall>,
    unreachable: bool,
    fail_code: Option<i32>,
    payload: Option<(String, Vec<u8>)>,
}

impl MockSyncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `check_source` report the source as unreachable.
    pub fn unreachable(&self) {
        self.state.lock().unwrap().unreachable = true;
    }

    /// Make `sync` fail with the given rsync exit code.
    pub fn fail_with(&self, code: i32) {
        self.state.lock().unwrap().fail_code = Some(code);
    }

    /// Write `name` with `data` into the destination on each successful
    /// sync, simulating transferred content.
    pub fn with_payload(&self, name: &str, data: &[u8]) {
        self.state.lock().unwrap().payload = Some((name.to_string(), data.to_vec()));
    }

    /// All recorded sync calls, in order.
    pub fn calls(&self) -> Vec<SyncCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl Syncer for MockSyncer {
    fn check_source(&self, source: &str) -> Result<(), SyncError> {
        if self.state.lock().unwrap().unreachable {
            return Err(SyncError::SourceNotReachable(source.to_string()));
        }
        Ok(())
    }

    fn sync(&self, source: &str, dest: &Path, options: &SyncOptions) -> Result<(), SyncError> {
        let payload = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(SyncCall {
                source: source.to_string(),
                dest: dest.to_path_buf(),
                options: options.clone(),
            });
            if let Some(code) = state.fail_code {
                return Err(SyncError::Failed {
                    target: dest.to_path_buf(),
                    code,
                    meaning: rsync_error_meaning(code),
                });
            }
            state.payload.clone()
        };
        if let Some((name, data)) = payload {
            if !options.dry_run {
                std::fs::write(dest.join(name), data)?;
            }
        }
        Ok(())
    }
}
