use anyhow::{Context, Result};
use log::debug;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use crate::builders::storage::{StagedFile, StorageProvider};
use crate::core::config::Settings;
use crate::core::line::{self, LineReader};
use crate::core::locator::SectionRange;

/// Opens `path` for reading, creating it empty first if it does not exist.
fn open_or_create(path: &Path) -> Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            debug!("created empty {}", path.display());
            Ok(None)
        }
        Err(err) => {
            Err(err).with_context(|| format!("Failed to open {} for reading", path.display()))
        }
    }
}

/// Appends `line` after whatever has been staged, terminating a dangling
/// last line first.
fn append_line(staged: &mut StagedFile, line: &[u8], ending: &[u8]) -> Result<()> {
    staged.finish_line(ending)?;
    staged.write_line(line)
}

/// Writes `key=value` into section `name` and returns the section's new range.
///
/// Inside the body of `range` the first line assigning `key` is replaced and
/// any later ones are dropped. Without such a line the pair is added after
/// the last body line. When `range` is unresolved the section is appended to
/// the end of the file, after a blank separator line. All other lines are
/// copied through untouched.
///
/// Lines longer than the read cap arrive as several chunks. A replaced or
/// dropped line takes its continuation chunks with it, and nothing is ever
/// inserted between a chunk and its continuation.
pub fn modify(
    path: &Path,
    name: &str,
    range: SectionRange,
    key: &str,
    value: &str,
    settings: &Settings,
    storage: &dyn StorageProvider,
) -> Result<SectionRange> {
    let ending = settings.line_ending.as_bytes();
    let pair = line::format_pair(key, value, ending);

    let source = open_or_create(path)?;
    let mut staged = storage.stage(path)?;

    let mut written = false;
    let mut insert_due = false;
    let mut skipping_tail = false;
    let mut new_end = range.end;
    let mut number = 0;

    if let Some(file) = source {
        let reader = LineReader::new(BufReader::new(file), settings.effective_line_max());
        for line in reader {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            number += 1;

            if skipping_tail {
                skipping_tail = !line.ends_with(b"\n");
                continue;
            }

            if range.in_body(number) && line::match_key(&line, key.as_bytes()).is_some() {
                if !written {
                    staged.write_line(&pair)?;
                    written = true;
                    new_end = staged.lines_written();
                }
                skipping_tail = !line.ends_with(b"\n");
                continue;
            }

            staged.write_line(&line)?;
            if range.contains(number) {
                new_end = staged.lines_written();
            }

            if number == range.end && !written {
                insert_due = true;
            }
            if insert_due && staged.at_line_start() {
                staged.write_line(&pair)?;
                written = true;
                insert_due = false;
                new_end = staged.lines_written();
            }
        }
    }

    let new_range = if !range.exists() {
        append_line(&mut staged, ending, ending)?;
        append_line(&mut staged, &line::format_header(name, ending), ending)?;
        let start = staged.lines_written();
        append_line(&mut staged, &pair, ending)?;
        SectionRange::new(start, staged.lines_written())
    } else {
        if !written {
            // File ended before the recorded end of the section, or inside
            // its last line.
            append_line(&mut staged, &pair, ending)?;
            new_end = staged.lines_written();
        }
        SectionRange::new(range.start, new_end)
    };

    staged.commit()?;
    debug!(
        "set [{name}] {key} in {}: {range:?} -> {new_range:?}",
        path.display()
    );
    Ok(new_range)
}

/// Drops every line in the body of `range` that assigns `key`, together with
/// the continuation chunks of over-long lines.
///
/// Returns how many of the section's numbered lines were dropped, which is
/// how far its end moves up. When nothing matches, the staged copy is thrown
/// away and the file is not rewritten.
pub fn remove(
    path: &Path,
    range: SectionRange,
    key: &str,
    settings: &Settings,
    storage: &dyn StorageProvider,
) -> Result<usize> {
    if !range.exists() {
        return Ok(0);
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open {} for reading", path.display()))?;
    let mut staged = storage.stage(path)?;

    let mut removed = 0;
    let mut skipping_tail = false;
    let reader = LineReader::new(BufReader::new(file), settings.effective_line_max());
    for (index, line) in reader.enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let number = index + 1;
        let matched = !skipping_tail
            && range.in_body(number)
            && line::match_key(&line, key.as_bytes()).is_some();

        if matched || skipping_tail {
            if range.contains(number) {
                removed += 1;
            }
            skipping_tail = !line.ends_with(b"\n");
            continue;
        }
        staged.write_line(&line)?;
    }

    if removed > 0 {
        staged.commit()?;
    }
    debug!("removed {removed} line(s) for {key} from {}", path.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::storage::TempFileStorage;
    use crate::core::config::LineEnding;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn lf_settings() -> Settings {
        Settings {
            line_ending: LineEnding::Lf,
            ..Settings::default()
        }
    }

    fn setup(content: Option<&str>) -> (TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ini");
        if let Some(content) = content {
            fs::write(&path, content).unwrap();
        }
        (dir, path)
    }

    fn set(path: &Path, name: &str, range: SectionRange, key: &str, value: &str) -> SectionRange {
        let settings = lf_settings();
        let storage = TempFileStorage::new(&settings);
        modify(path, name, range, key, value, &settings, &storage).unwrap()
    }

    fn rm(path: &Path, range: SectionRange, key: &str) -> usize {
        let settings = lf_settings();
        let storage = TempFileStorage::new(&settings);
        remove(path, range, key, &settings, &storage).unwrap()
    }

    fn capped_settings() -> Settings {
        Settings {
            line_max: 16,
            ..lf_settings()
        }
    }

    fn set_capped(
        path: &Path,
        range: SectionRange,
        key: &str,
        value: &str,
    ) -> SectionRange {
        let settings = capped_settings();
        let storage = TempFileStorage::new(&settings);
        modify(path, "g", range, key, value, &settings, &storage).unwrap()
    }

    fn locate_capped(path: &Path) -> SectionRange {
        crate::core::locator::find_section(path, "g", 1, 16)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_modify_creates_missing_file() {
        let (_dir, path) = setup(None);
        let range = set(&path, "group_1", SectionRange::NONE, "key_1", "value_1");

        assert_eq!(range, SectionRange::new(2, 3));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "\n[group_1]\nkey_1=value_1\n"
        );
        assert!(!path.with_file_name("test.ini.tmp").exists());
    }

    #[test]
    fn test_modify_appends_new_section_after_content() {
        let (_dir, path) = setup(Some("[a]\nk=v"));
        let range = set(&path, "b", SectionRange::NONE, "x", "1");

        assert_eq!(range, SectionRange::new(4, 5));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[a]\nk=v\n\n[b]\nx=1\n");
    }

    #[test]
    fn test_modify_updates_in_place() {
        let (_dir, path) = setup(Some("[a]\r\nk = old\r\nother=1\r\n[b]\r\nk=keep\r\n"));
        let range = set(&path, "a", SectionRange::new(1, 3), "k", "new");

        assert_eq!(range, SectionRange::new(1, 3));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[a]\r\nk=new\nother=1\r\n[b]\r\nk=keep\r\n"
        );
    }

    #[test]
    fn test_modify_inserts_after_last_body_line() {
        let (_dir, path) = setup(Some("[a]\nx=1\n\n[b]\ny=2\n"));
        let range = set(&path, "a", SectionRange::new(1, 2), "k", "v");

        assert_eq!(range, SectionRange::new(1, 3));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[a]\nx=1\nk=v\n\n[b]\ny=2\n"
        );
    }

    #[test]
    fn test_modify_fills_empty_section() {
        let (_dir, path) = setup(Some("[a]\n\n[b]\ny=2\n"));
        let range = set(&path, "a", SectionRange::new(1, 1), "k", "v");

        assert_eq!(range, SectionRange::new(1, 2));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[a]\nk=v\n\n[b]\ny=2\n");
    }

    #[test]
    fn test_modify_terminates_unterminated_last_line() {
        let (_dir, path) = setup(Some("[a]\nx=1"));
        let range = set(&path, "a", SectionRange::new(1, 2), "k", "v");

        assert_eq!(range, SectionRange::new(1, 3));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[a]\nx=1\nk=v\n");
    }

    #[test]
    fn test_modify_collapses_duplicates() {
        let (_dir, path) = setup(Some("[a]\nk=1\nx=2\nk=3\n[b]\nk=4\n"));
        let range = set(&path, "a", SectionRange::new(1, 4), "k", "9");

        assert_eq!(range, SectionRange::new(1, 3));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[a]\nk=9\nx=2\n[b]\nk=4\n"
        );
    }

    #[test]
    fn test_modify_with_stale_range_appends_at_eof() {
        let (_dir, path) = setup(Some("[a]\nx=1\n"));
        let range = set(&path, "a", SectionRange::new(1, 5), "k", "v");

        assert_eq!(range, SectionRange::new(1, 3));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[a]\nx=1\nk=v\n");
    }

    #[test]
    fn test_modify_aborts_when_staging_fails() {
        let (_dir, path) = setup(Some("[a]\nk=v\n"));
        let settings = Settings {
            temp_suffix: "/missing/dir.tmp".to_string(),
            ..lf_settings()
        };
        let storage = TempFileStorage::new(&settings);
        let result = modify(
            &path,
            "a",
            SectionRange::new(1, 2),
            "k",
            "new",
            &settings,
            &storage,
        );

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[a]\nk=v\n");
    }

    #[test]
    fn test_modify_counts_long_pair_in_chunks() {
        let (_dir, path) = setup(None);
        let range = set_capped(&path, SectionRange::NONE, "a", "0123456789abcdefghijklmnop");

        // "a=0123456789abc" and "defghijklmnop\n" are two chunks.
        assert_eq!(range, SectionRange::new(2, 4));
        assert_eq!(range, locate_capped(&path));

        let range = set_capped(&path, range, "b", "2");
        assert_eq!(range, SectionRange::new(2, 5));
        assert_eq!(range, locate_capped(&path));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "\n[g]\na=0123456789abcdefghijklmnop\nb=2\n"
        );
    }

    #[test]
    fn test_modify_waits_for_end_of_capped_line() {
        let (_dir, path) = setup(Some("[g]\nx=0123456789abc\n"));
        let range = locate_capped(&path);
        assert_eq!(range, SectionRange::new(1, 2));

        let range = set_capped(&path, range, "k", "v");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[g]\nx=0123456789abc\nk=v\n"
        );
        assert_eq!(range, SectionRange::new(1, 4));
        assert_eq!(range, locate_capped(&path));
    }

    #[test]
    fn test_modify_replaces_long_line_whole() {
        let (_dir, path) = setup(Some("[g]\na=0123456789abcdefghij\nb=1\n"));
        let range = set_capped(&path, locate_capped(&path), "a", "x");

        assert_eq!(fs::read_to_string(&path).unwrap(), "[g]\na=x\nb=1\n");
        assert_eq!(range, SectionRange::new(1, 3));
    }

    #[test]
    fn test_remove_takes_continuation_chunks() {
        let (_dir, path) = setup(Some("[g]\na=0123456789abcdefghij\nb=1\n[h]\n"));
        let settings = capped_settings();
        let storage = TempFileStorage::new(&settings);
        let range = locate_capped(&path);
        assert_eq!(range, SectionRange::new(1, 4));

        assert_eq!(remove(&path, range, "a", &settings, &storage).unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[g]\nb=1\n[h]\n");
        assert_eq!(locate_capped(&path), SectionRange::new(1, 2));
    }

    #[test]
    fn test_remove_drops_every_match_in_section() {
        let (_dir, path) = setup(Some("[a]\nk=1\nx=2\nk =3\n[b]\nk=4\n"));
        assert_eq!(rm(&path, SectionRange::new(1, 4), "k"), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[a]\nx=2\n[b]\nk=4\n");
    }

    #[test]
    fn test_remove_without_match_leaves_file() {
        let (_dir, path) = setup(Some("[a]\nkk=1\n"));
        assert_eq!(rm(&path, SectionRange::new(1, 2), "k"), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[a]\nkk=1\n");
        assert!(!path.with_file_name("test.ini.tmp").exists());
    }

    #[test]
    fn test_remove_on_missing_file_is_an_error() {
        let (_dir, path) = setup(None);
        let settings = lf_settings();
        let storage = TempFileStorage::new(&settings);
        assert!(remove(&path, SectionRange::new(1, 2), "k", &settings, &storage).is_err());
        assert!(!path.exists());
    }
}
