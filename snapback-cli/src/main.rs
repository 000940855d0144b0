//! snapback CLI binary.
//!
//! Entry point for the `snapback` command-line tool. Wires the real
//! collaborators (system clock, btrfs, rsync, lockfile) into the lifecycle
//! commands and maps every failure to a distinct exit code.

use std::process::ExitCode;

use clap::Parser;

use snapback_cli::commands::{humanize_age, DeletionReport};
use snapback_cli::exit::{codes, exit_code};
use snapback_cli::{
    config, execute_backup, execute_clean, execute_decay, execute_destroy, execute_list,
    execute_prune, execute_setup, notify, AssumeYes, BackupOptions, Cli, Command, CommandError,
    InteractivePrompt, Logger, StderrLogger, TargetConfig, Verbosity,
};
use snapback_clock::SystemClock;
use snapback_volume::{LockFile, RealBtrfs, RealRsync};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = StderrLogger::new(Verbosity::from_count(cli.verbose));

    let target = match config::load_target(&cli.config, cli.command.target_name()) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(codes::CONFIG_ERROR as u8);
        }
    };

    ExitCode::from(run(&cli.command, target, &logger) as u8)
}

fn run(command: &Command, mut target: TargetConfig, logger: &StderrLogger) -> i32 {
    let btrfs = RealBtrfs;
    let syncer = RealRsync;
    let clock = SystemClock;
    let locker = LockFile;

    match command {
        Command::Setup { .. } => {
            match execute_setup(&target, &btrfs, &locker, logger) {
                Ok(()) => codes::SUCCESS,
                Err(e) => fail(&e),
            }
        }

        Command::Backup(args) => {
            if let Some(source) = &args.source {
                target.source = source.clone();
            }
            let options = BackupOptions {
                checksum: args.checksum,
                dry_run: args.dry_run,
                progress: args.progress,
            };
            match execute_backup(&target, &options, &btrfs, &syncer, &clock, &locker, logger) {
                Ok(outcome) => {
                    if let Some(name) = outcome.snapshot {
                        println!("snapshot {name} committed");
                        notify_result(
                            &target,
                            &format!("backup {} finished: {name}", target.name),
                            false,
                            logger,
                        );
                    }
                    codes::SUCCESS
                }
                Err(e) => {
                    notify_result(
                        &target,
                        &format!("backup {} failed: {e}", target.name),
                        true,
                        logger,
                    );
                    fail(&e)
                }
            }
        }

        Command::List { .. } => match execute_list(&target, &clock) {
            Ok(entries) => {
                for entry in entries {
                    let retention = match entry.reason {
                        Some(reason) => reason.to_string(),
                        None => "prune candidate".to_string(),
                    };
                    let decay = if entry.decay_candidate {
                        "\tdecay candidate"
                    } else {
                        ""
                    };
                    println!(
                        "{}\t{} ago\t{}{}",
                        entry.name,
                        humanize_age(entry.age),
                        retention,
                        decay
                    );
                }
                codes::SUCCESS
            }
            Err(e) => fail(&e),
        },

        Command::Prune(args) => {
            let result = if args.yes {
                execute_prune(&target, &btrfs, &clock, &locker, &AssumeYes, logger)
            } else {
                execute_prune(&target, &btrfs, &clock, &locker, &InteractivePrompt, logger)
            };
            match result {
                Ok(outcome) => {
                    println!("kept {} snapshots", outcome.kept);
                    report_deletions(&outcome.report)
                }
                Err(e) => fail(&e),
            }
        }

        Command::Decay(args) => {
            let result = if args.yes {
                execute_decay(&target, &btrfs, &clock, &locker, &AssumeYes, logger)
            } else {
                execute_decay(&target, &btrfs, &clock, &locker, &InteractivePrompt, logger)
            };
            match result {
                Ok(outcome) => {
                    println!("kept {} snapshots", outcome.kept);
                    report_deletions(&outcome.report)
                }
                Err(e) => fail(&e),
            }
        }

        Command::Destroy(args) => {
            let result = if args.yes {
                execute_destroy(&target, &btrfs, &locker, &AssumeYes, logger)
            } else {
                execute_destroy(&target, &btrfs, &locker, &InteractivePrompt, logger)
            };
            match result {
                Ok(outcome) => {
                    if outcome.root_removed {
                        println!("destroyed {}", target.backups.display());
                    }
                    report_deletions(&outcome.report)
                }
                Err(e) => fail(&e),
            }
        }

        Command::Clean { .. } => match execute_clean(&target, &btrfs, &locker, logger) {
            Ok(_) => codes::SUCCESS,
            Err(e) => fail(&e),
        },
    }
}

fn fail(error: &CommandError) -> i32 {
    eprintln!("error: {error}");
    exit_code(error)
}

fn report_deletions(report: &DeletionReport) -> i32 {
    println!(
        "deleted {}, skipped {}, failed {}",
        report.deleted.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if report.is_clean() {
        codes::SUCCESS
    } else {
        codes::DELETE_FAILED
    }
}

fn notify_result(target: &TargetConfig, message: &str, error: bool, logger: &impl Logger) {
    if let Some(remote) = &target.notify_remote {
        notify::send_notification("snapback", message, error, Some(remote), logger);
    }
}
