//! CLI argument parsing for snapback.
//!
//! One subcommand per lifecycle action, each taking the name of a target
//! section from the config file.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// Incremental btrfs snapshot backups with tiered retention.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "snapback")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Use the given config file.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Lower the logging threshold; may be repeated.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create the backup directory for a target.
    Setup {
        /// Target name in the config file.
        name: String,
    },
    /// Make a backup of a target.
    Backup(BackupArgs),
    /// List the snapshots of a target.
    List {
        /// Target name in the config file.
        name: String,
    },
    /// Delete snapshots not held by the retention policy.
    Prune(DeleteArgs),
    /// Delete snapshots older than the decay cutoff.
    Decay(DeleteArgs),
    /// Delete all snapshots and the backup directory itself.
    Destroy(DeleteArgs),
    /// Delete a leftover staging directory.
    Clean {
        /// Target name in the config file.
        name: String,
    },
}

impl Command {
    /// The target this command operates on.
    pub fn target_name(&self) -> &str {
        match self {
            Command::Setup { name } => name,
            Command::Backup(args) => &args.name,
            Command::List { name } => name,
            Command::Prune(args) => &args.name,
            Command::Decay(args) => &args.name,
            Command::Destroy(args) => &args.name,
            Command::Clean { name } => name,
        }
    }
}

/// Arguments for the backup command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct BackupArgs {
    /// Target name in the config file.
    pub name: String,

    /// Detect changes by checksum instead of file size and modification
    /// time; increases disk load significantly.
    #[arg(long)]
    pub checksum: bool,

    /// Pass `--dry-run` to rsync and show its output; nothing is committed.
    #[arg(long)]
    pub dry_run: bool,

    /// Stream rsync output to the terminal.
    #[arg(short, long)]
    pub progress: bool,

    /// Use the given path as backup source, replacing the configured one.
    #[arg(long, value_name = "PATH")]
    pub source: Option<String>,
}

/// Arguments for the destructive commands (prune, decay, destroy).
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct DeleteArgs {
    /// Target name in the config file.
    pub name: String,

    /// Answer yes to every deletion prompt (non-interactive).
    #[arg(long)]
    pub yes: bool,
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // Subcommand selection
    // ===========================================

    #[test]
    fn test_requires_subcommand() {
        assert!(parse_from(["snapback"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(parse_from(["snapback", "explode", "home"]).is_err());
    }

    #[test]
    fn test_setup() {
        let cli = parse_from(["snapback", "setup", "home"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Setup {
                name: "home".to_string()
            }
        );
        assert_eq!(cli.command.target_name(), "home");
    }

    #[test]
    fn test_list() {
        let cli = parse_from(["snapback", "list", "home"]).expect("parse");
        assert!(matches!(cli.command, Command::List { .. }));
    }

    #[test]
    fn test_clean() {
        let cli = parse_from(["snapback", "clean", "home"]).expect("parse");
        assert!(matches!(cli.command, Command::Clean { .. }));
    }

    #[test]
    fn test_commands_require_target_name() {
        for command in ["setup", "backup", "list", "prune", "decay", "destroy", "clean"] {
            assert!(
                parse_from(["snapback", command]).is_err(),
                "`{command}` parsed without a target"
            );
        }
    }

    // ===========================================
    // Backup flags
    // ===========================================

    #[test]
    fn test_backup_defaults() {
        let cli = parse_from(["snapback", "backup", "home"]).expect("parse");
        match cli.command {
            Command::Backup(args) => {
                assert_eq!(args.name, "home");
                assert!(!args.checksum);
                assert!(!args.dry_run);
                assert!(!args.progress);
                assert!(args.source.is_none());
            }
            _ => panic!("expected Backup"),
        }
    }

    #[test]
    fn test_backup_all_flags() {
        let cli = parse_from([
            "snapback", "backup", "home", "--checksum", "--dry-run", "--progress",
            "--source", "/mnt/elsewhere",
        ])
        .expect("parse");
        match cli.command {
            Command::Backup(args) => {
                assert!(args.checksum);
                assert!(args.dry_run);
                assert!(args.progress);
                assert_eq!(args.source, Some("/mnt/elsewhere".to_string()));
            }
            _ => panic!("expected Backup"),
        }
    }

    #[test]
    fn test_backup_progress_short() {
        let cli = parse_from(["snapback", "backup", "home", "-p"]).expect("parse");
        match cli.command {
            Command::Backup(args) => assert!(args.progress),
            _ => panic!("expected Backup"),
        }
    }

    // ===========================================
    // Destructive commands and --yes
    // ===========================================

    #[test]
    fn test_prune_defaults_interactive() {
        let cli = parse_from(["snapback", "prune", "home"]).expect("parse");
        match cli.command {
            Command::Prune(args) => assert!(!args.yes),
            _ => panic!("expected Prune"),
        }
    }

    #[test]
    fn test_prune_yes() {
        let cli = parse_from(["snapback", "prune", "home", "--yes"]).expect("parse");
        match cli.command {
            Command::Prune(args) => assert!(args.yes),
            _ => panic!("expected Prune"),
        }
    }

    #[test]
    fn test_decay_yes() {
        let cli = parse_from(["snapback", "decay", "home", "--yes"]).expect("parse");
        match cli.command {
            Command::Decay(args) => assert!(args.yes),
            _ => panic!("expected Decay"),
        }
    }

    #[test]
    fn test_destroy_yes() {
        let cli = parse_from(["snapback", "destroy", "home", "--yes"]).expect("parse");
        match cli.command {
            Command::Destroy(args) => assert!(args.yes),
            _ => panic!("expected Destroy"),
        }
    }

    // ===========================================
    // Global flags
    // ===========================================

    #[test]
    fn test_default_config_path() {
        let cli = parse_from(["snapback", "list", "home"]).expect("parse");
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_custom_config_path() {
        let cli = parse_from(["snapback", "-c", "/tmp/test.toml", "list", "home"]).expect("parse");
        assert_eq!(cli.config, PathBuf::from("/tmp/test.toml"));
    }

    #[test]
    fn test_config_after_subcommand() {
        // Global flags may follow the subcommand.
        let cli = parse_from(["snapback", "list", "home", "--config", "/tmp/test.toml"])
            .expect("parse");
        assert_eq!(cli.config, PathBuf::from("/tmp/test.toml"));
    }

    #[test]
    fn test_verbose_count() {
        let cli = parse_from(["snapback", "list", "home"]).expect("parse");
        assert_eq!(cli.verbose, 0);

        let cli = parse_from(["snapback", "-v", "list", "home"]).expect("parse");
        assert_eq!(cli.verbose, 1);

        let cli = parse_from(["snapback", "-vv", "list", "home"]).expect("parse");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_help_and_version() {
        let err = parse_from(["snapback", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

        let err = parse_from(["snapback", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_unknown_flag() {
        assert!(parse_from(["snapback", "backup", "home", "--unknown"]).is_err());
    }

    #[test]
    fn test_cli_clone_and_eq() {
        let cli1 = parse_from(["snapback", "backup", "home"]).expect("parse");
        let cli2 = cli1.clone();
        assert_eq!(cli1, cli2);
    }
}
