use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::line::{self, LineReader};
use crate::core::locator::SectionRange;

/// Walks the lines of `range` and hands each one to `visit` until it returns
/// `Some`. Lines before the range are skipped; reading stops after its end.
fn scan_range<T>(
    path: &Path,
    range: SectionRange,
    line_max: usize,
    mut visit: impl FnMut(usize, &[u8]) -> Option<T>,
) -> Result<Option<T>> {
    if !range.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open {} for reading", path.display()))?;

    for (index, line) in LineReader::new(BufReader::new(file), line_max).enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let number = index + 1;
        if number < range.start {
            continue;
        }
        if number > range.end {
            break;
        }
        if let Some(found) = visit(number, &line) {
            return Ok(Some(found));
        }
    }

    Ok(None)
}

/// 1-based line number of the first line in `range` that assigns `key`.
pub fn key_line(
    path: &Path,
    range: SectionRange,
    key: &str,
    line_max: usize,
) -> Result<Option<usize>> {
    scan_range(path, range, line_max, |number, line| {
        line::match_key(line, key.as_bytes()).map(|_| number)
    })
}

/// Value of the first line in `range` that assigns `key`.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn read_value(
    path: &Path,
    range: SectionRange,
    key: &str,
    line_max: usize,
) -> Result<Option<String>> {
    scan_range(path, range, line_max, |_, line| {
        line::value_of(line, key.as_bytes())
            .map(|value| String::from_utf8_lossy(value).into_owned())
    })
}
