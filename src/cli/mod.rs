//! CLI argument parsing for atomfile.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// atomfile: atomic, locked file operations with pluggable formats.
///
/// The format is chosen from the file extension. Every command takes the
/// same locks the library does, so it is safe to run alongside programs
/// using atomfile on the same files.
#[derive(Parser, Debug)]
#[command(name = "atomfile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub lock: LockOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub struct LockOptions {
    /// Seconds to wait for locks (0 fails immediately when a lock is taken).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Wait for locks indefinitely.
    #[arg(long, global = true, conflicts_with = "timeout")]
    pub block: bool,

    /// YAML config file providing defaults for the options above.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands for atomfile.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read and print a file.
    ///
    /// Mappings and sequences print as JSON; strings print verbatim.
    Read(ReadArgs),

    /// Atomically write data to a file.
    ///
    /// Data is parsed as JSON; anything that is not valid JSON is written
    /// as a plain string.
    Write(WriteArgs),

    /// Merge a JSON mapping into a file and print the result.
    Update(UpdateArgs),

    /// Append text to a file (not atomic).
    Append(AppendArgs),

    /// List supported file extensions.
    Formats,

    /// Show whether a file's process lock is held, and by whom.
    Status(StatusArgs),

    /// List temporary files left behind by interrupted writes.
    Stale(StaleArgs),
}

/// Arguments for the `read` command.
#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// File to read.
    pub file: PathBuf,

    /// Write the raw bytes to stdout instead of decoding.
    #[arg(long)]
    pub as_bytes: bool,
}

/// Arguments for the `write` command.
#[derive(Parser, Debug)]
pub struct WriteArgs {
    /// File to write.
    pub file: PathBuf,

    /// Data to write.
    pub data: String,

    /// Write `data` as raw UTF-8 bytes, bypassing the format.
    #[arg(long)]
    pub as_bytes: bool,
}

/// Arguments for the `update` command.
#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// File to update.
    pub file: PathBuf,

    /// JSON value to merge in.
    pub json: String,
}

/// Arguments for the `append` command.
#[derive(Parser, Debug)]
pub struct AppendArgs {
    /// File to append to.
    pub file: PathBuf,

    /// Text to append.
    pub text: String,

    /// Add a trailing newline.
    #[arg(short = 'n', long)]
    pub newline: bool,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// File whose lock to inspect.
    pub file: PathBuf,
}

/// Arguments for the `stale` command.
#[derive(Parser, Debug)]
pub struct StaleArgs {
    /// Directory to scan (not recursive).
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Delete the temporaries found.
    #[arg(long)]
    pub remove: bool,

    /// Ignore temporaries modified less than this many seconds ago.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub min_age: u64,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
