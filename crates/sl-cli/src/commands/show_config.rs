//! Config command: print the effective configuration.

use std::io::Write;

use anyhow::Result;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.api_token.is_some() {
        shown.api_token = Some("[REDACTED]".to_string());
    }
    serde_json::to_writer_pretty(&mut *writer, &shown)?;
    writeln!(writer)?;
    Ok(())
}
