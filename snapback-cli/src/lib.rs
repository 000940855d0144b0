//! snapback CLI library.
//!
//! Command-line surface, configuration loading and the lifecycle engine
//! orchestrating setup, backup, list, prune, decay, destroy and clean
//! against one backup target at a time.

pub mod cli;
pub mod commands;
pub mod config;
pub mod exit;
pub mod logger;
pub mod notify;
pub mod prompt;

pub use cli::{parse_from, BackupArgs, Cli, Command, DeleteArgs};
pub use commands::{
    execute_backup, execute_clean, execute_decay, execute_destroy, execute_list, execute_prune,
    execute_setup, BackupOptions, BackupOutcome, CommandError, CommandResult, DeletionReport,
};
pub use config::{ConfigError, TargetConfig};
pub use logger::{Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
pub use prompt::{AlwaysYes, AssumeYes, InteractivePrompt, MockPrompt, Prompt};
