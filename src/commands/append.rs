//! Implementation of the `atomfile append` command.

use crate::cli::AppendArgs;
use crate::config::Config;
use crate::error::Result;
use crate::file::SafeFile;

pub fn cmd_append(args: AppendArgs, config: &Config) -> Result<()> {
    let file = SafeFile::with_config(&args.file, config)?;
    if args.newline {
        file.append(&format!("{}\n", args.text))
    } else {
        file.append(&args.text)
    }
}
