//! CLI argument parsing for procman.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Procman: cross-process domain locking for scripts and workers.
///
/// Processes sharing a storage location agree on:
/// - how many of them may work in a domain at once (capacity)
/// - which one of them owns a subject inside the domain
///
/// Records left behind by dead processes are reclaimed automatically.
#[derive(Parser, Debug)]
#[command(name = "procman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: $PROCMAN_CONFIG, then ./procman.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the filesystem backend in this directory.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Namespace prefix of every record.
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Raise the log level (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Available commands for procman.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding a slot of a domain.
    ///
    /// Acquires a slot (and the subject, if given), runs the command as a
    /// child process, releases, and exits with the child's exit code.
    /// Exits with code 4 when the lock is denied.
    Run(RunArgs),

    /// Show the roster and subject owners of a domain.
    Status(StatusArgs),

    /// Clear dead subject owners and prune dead roster entries.
    Cleanup(CleanupArgs),

    /// Remove a record regardless of the liveness of its process.
    ///
    /// Operator escape hatch for records the automatic reclaim cannot see
    /// as dead (for example a reused pid).
    Clear(ClearArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Domain to lock.
    pub domain: String,

    /// Subject to own exclusively while the command runs.
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Maximum number of concurrent holders (default: config `default_capacity`).
    #[arg(short, long)]
    pub capacity: Option<usize>,

    /// Keep retrying until the lock is granted instead of exiting.
    #[arg(long)]
    pub wait: bool,

    /// Delay between attempts with `--wait`, in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Command to run, after `--`.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Domain to inspect.
    pub domain: String,

    /// Capacity to judge fullness against (default: config `default_capacity`).
    #[arg(short, long)]
    pub capacity: Option<usize>,

    /// Print the snapshot as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `cleanup` command.
#[derive(Parser, Debug)]
pub struct CleanupArgs {
    /// Domain to clean up.
    pub domain: String,
}

/// Arguments for the `clear` command.
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["subject", "pid"])))]
pub struct ClearArgs {
    /// Domain holding the record.
    pub domain: String,

    /// Remove the owner record of this subject.
    #[arg(long)]
    pub subject: Option<String>,

    /// Remove this pid from the roster.
    #[arg(long)]
    pub pid: Option<u32>,

    /// Force clearing the record (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_minimal() {
        let cli = Cli::try_parse_from(["procman", "run", "convert", "--", "sleep", "1"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.domain, "convert");
            assert_eq!(args.subject, None);
            assert_eq!(args.capacity, None);
            assert!(!args.wait);
            assert_eq!(args.poll_interval_ms, 500);
            assert_eq!(args.command, vec!["sleep", "1"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_full() {
        let cli = Cli::try_parse_from([
            "procman",
            "run",
            "convert",
            "-s",
            "video.mp4",
            "-c",
            "3",
            "--wait",
            "--poll-interval-ms",
            "50",
            "--",
            "ffmpeg",
            "-i",
            "video.mp4",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.subject.as_deref(), Some("video.mp4"));
            assert_eq!(args.capacity, Some(3));
            assert!(args.wait);
            assert_eq!(args.poll_interval_ms, 50);
            assert_eq!(args.command, vec!["ffmpeg", "-i", "video.mp4"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_command() {
        assert!(Cli::try_parse_from(["procman", "run", "convert"]).is_err());
    }

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["procman", "status", "convert", "--json"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.domain, "convert");
            assert!(args.json);
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn parse_cleanup() {
        let cli = Cli::try_parse_from(["procman", "cleanup", "convert"]).unwrap();
        assert!(matches!(cli.command, Command::Cleanup(args) if args.domain == "convert"));
    }

    #[test]
    fn parse_clear_subject() {
        let cli = Cli::try_parse_from([
            "procman", "clear", "convert", "--subject", "video", "--force",
        ])
        .unwrap();
        if let Command::Clear(args) = cli.command {
            assert_eq!(args.subject.as_deref(), Some("video"));
            assert_eq!(args.pid, None);
            assert!(args.force);
        } else {
            panic!("Expected Clear command");
        }
    }

    #[test]
    fn parse_clear_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["procman", "clear", "convert", "--force"]).is_err());
        assert!(
            Cli::try_parse_from([
                "procman", "clear", "convert", "--subject", "a", "--pid", "7",
            ])
            .is_err()
        );
    }

    #[test]
    fn parse_global_flags_anywhere() {
        let cli = Cli::try_parse_from([
            "procman",
            "-vv",
            "status",
            "convert",
            "--dir",
            "/tmp/locks",
            "--prefix",
            "nightly",
        ])
        .unwrap();
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.dir, Some(PathBuf::from("/tmp/locks")));
        assert_eq!(cli.global.prefix.as_deref(), Some("nightly"));
        assert_eq!(cli.global.config, None);
    }
}
