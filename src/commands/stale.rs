//! Implementation of the `atomfile stale` command.
//!
//! Lists temporary files that interrupted writes left next to their
//! targets, and optionally removes them. A temporary younger than
//! `--min-age` may belong to a write still in progress, so it is skipped.

use crate::cli::StaleArgs;
use crate::error::Result;
use crate::fs::{delete_file, find_stale_temporaries};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Execute the `atomfile stale` command.
pub fn cmd_stale(args: StaleArgs) -> Result<()> {
    let found = stale_candidates(&args.dir, Duration::from_secs(args.min_age))?;

    if found.is_empty() {
        println!("No stale temporaries in '{}'.", args.dir.display());
        return Ok(());
    }

    for path in &found {
        if args.remove {
            delete_file(path)?;
            println!("removed  {}", path.display());
        } else {
            println!("{}", path.display());
        }
    }

    if !args.remove {
        println!();
        println!("{} stale temporar{} (use --remove to delete).", found.len(), plural(found.len()));
    }
    Ok(())
}

/// Temporaries in `dir` last modified at least `min_age` ago.
pub(crate) fn stale_candidates(dir: &Path, min_age: Duration) -> Result<Vec<PathBuf>> {
    let now = SystemTime::now();
    let found = find_stale_temporaries(dir)?
        .into_iter()
        .filter(|path| {
            let modified = std::fs::metadata(path).and_then(|m| m.modified());
            match modified {
                Ok(at) => now.duration_since(at).unwrap_or_default() >= min_age,
                // Vanished or unreadable: it is not ours to judge.
                Err(_) => false,
            }
        })
        .collect();
    Ok(found)
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "y" } else { "ies" }
}
