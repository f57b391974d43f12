//! JSON-lines tick decoding
//!
//! One tick per line: `{"code": "BOND", "price": 50.25}`. Blank lines and
//! lines starting with `#` are skipped.

use std::io::BufRead;

use crate::core::{Error, Result, Tick};

/// Decode one line. `Ok(None)` for blank or comment lines.
pub fn parse_line(line: &str) -> Result<Option<Tick>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Lazily decode ticks from a reader. Each bad line yields its own `Err`
/// so callers can log it and keep going.
pub fn read_ticks<R: BufRead>(reader: R) -> impl Iterator<Item = Result<Tick>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) => parse_line(&line).transpose(),
        Err(e) => Some(Err(Error::Io(e))),
    })
}
