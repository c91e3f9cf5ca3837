//! Implementation of the `atomfile formats` command.

use crate::codec;
use crate::error::Result;

pub fn cmd_formats() -> Result<()> {
    println!("Supported formats: {}", codec::supported_formats().join(", "));
    Ok(())
}
