use anyhow::{Context, Result};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::line::{self, LineReader};

/// Inclusive, 1-based line span of a section.
///
/// `start` is the header line. `end` is the last line with content, or
/// `start` itself when the body is empty. `end == 0` means no section is
/// resolved on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionRange {
    pub start: usize,
    pub end: usize,
}

impl SectionRange {
    pub const NONE: SectionRange = SectionRange { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn exists(&self) -> bool {
        self.end > 0
    }

    /// Whether `number` is part of the range, header included.
    pub fn contains(&self, number: usize) -> bool {
        self.exists() && number >= self.start && number <= self.end
    }

    /// Whether `number` is a body line, i.e. after the header.
    pub fn in_body(&self, number: usize) -> bool {
        self.exists() && number > self.start && number <= self.end
    }
}

/// Finds the `[name]` section at or after line `from` (0 scans from the top).
///
/// Blank lines inside the body are skipped without ending it; the next
/// header line ends it. Returns `Ok(None)` when no header matches.
pub fn find_section(
    path: &Path,
    name: &str,
    from: usize,
    line_max: usize,
) -> Result<Option<SectionRange>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} for reading", path.display()))?;
    let reader = LineReader::new(BufReader::new(file), line_max);

    let target = name.as_bytes();
    let mut found: Option<SectionRange> = None;

    for (index, line) in reader.enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let number = index + 1;
        if number < from {
            continue;
        }

        match found.as_mut() {
            None => {
                if line::header_name(&line) == Some(target) {
                    found = Some(SectionRange::new(number, number));
                }
            }
            Some(range) => {
                if line::is_header(&line) {
                    break;
                }
                if line::is_blank(&line) {
                    continue;
                }
                range.end = number;
            }
        }
    }

    debug!("section [{name}] in {}: {found:?}", path.display());
    Ok(found)
}
