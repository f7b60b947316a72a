use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::config::Settings;

/// The `StorageProvider` trait decides where a rewrite is staged before it
/// replaces the real file.
pub trait StorageProvider {
    /// Opens a fresh staging copy for `target`.
    ///
    /// # Arguments
    /// * `target`: The file the staged copy replaces on commit.
    ///
    /// # Returns
    /// A `Result<StagedFile>` holding an empty staged copy, or an error if the
    /// staging file could not be created.
    fn stage(&self, target: &Path) -> Result<StagedFile>;
}

/// Stages rewrites next to the target file and swaps them in on commit.
pub struct TempFileStorage {
    suffix: String,
    sync_before_rename: bool,
    chunk_limit: usize,
}

impl TempFileStorage {
    pub fn new(settings: &Settings) -> Self {
        Self {
            suffix: settings.temp_suffix().to_string(),
            sync_before_rename: settings.sync_before_rename,
            chunk_limit: settings.effective_line_max() - 1,
        }
    }

    pub fn temp_path(&self, target: &Path) -> PathBuf {
        let mut path = OsString::from(target.as_os_str());
        path.push(&self.suffix);
        PathBuf::from(path)
    }
}

impl StorageProvider for TempFileStorage {
    fn stage(&self, target: &Path) -> Result<StagedFile> {
        let temp_path = self.temp_path(target);
        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to create staging file {}", temp_path.display()))?;

        Ok(StagedFile {
            writer: Some(BufWriter::new(file)),
            temp_path,
            target: target.to_path_buf(),
            sync_before_rename: self.sync_before_rename,
            chunk_limit: self.chunk_limit,
            lines: 0,
            chunk_len: 0,
            at_line_start: true,
        })
    }
}

/// A rewrite in progress.
///
/// Dropping it without calling `commit` deletes the staging file and leaves
/// the target alone.
///
/// Lines are numbered the way `LineReader` will number them when the file is
/// read back: a line longer than the chunk limit counts once per chunk.
pub struct StagedFile {
    writer: Option<BufWriter<File>>,
    temp_path: PathBuf,
    target: PathBuf,
    sync_before_rename: bool,
    chunk_limit: usize,
    lines: usize,
    chunk_len: usize,
    at_line_start: bool,
}

impl StagedFile {
    /// Appends `line` exactly as given. The bytes continue whatever line or
    /// chunk is still open.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        if line.is_empty() {
            return Ok(());
        }
        self.write_raw(line)
    }

    /// Terminates a trailing unterminated line so the next write starts a
    /// line of its own.
    pub fn finish_line(&mut self, ending: &[u8]) -> Result<()> {
        if self.at_line_start {
            return Ok(());
        }
        self.write_raw(ending)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("Staging file is already closed")?;
        writer
            .write_all(bytes)
            .with_context(|| format!("Failed to write {}", self.temp_path.display()))?;

        for &byte in bytes {
            if self.chunk_len == 0 {
                self.lines += 1;
            }
            self.chunk_len += 1;
            if byte == b'\n' || self.chunk_len >= self.chunk_limit {
                self.chunk_len = 0;
            }
        }
        if let Some(&last) = bytes.last() {
            self.at_line_start = last == b'\n';
        }
        Ok(())
    }

    /// Line number of the last byte written so far, counted in reader
    /// chunks.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Whether the output so far ends with a line terminator.
    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Replaces the target with the staged content.
    ///
    /// The target is deleted before the rename. If the process dies between
    /// the two steps the target is gone and only the staging file remains.
    pub fn commit(mut self) -> Result<()> {
        let writer = self
            .writer
            .take()
            .context("Staging file is already closed")?;
        let file = writer
            .into_inner()
            .map_err(|err| err.into_error())
            .with_context(|| format!("Failed to flush {}", self.temp_path.display()))?;
        if self.sync_before_rename {
            file.sync_all()
                .with_context(|| format!("Failed to sync {}", self.temp_path.display()))?;
        }
        drop(file);

        if self.target.exists() {
            fs::remove_file(&self.target)
                .with_context(|| format!("Failed to remove {}", self.target.display()))?;
        }
        fs::rename(&self.temp_path, &self.target).with_context(|| {
            format!(
                "Failed to move {} to {}",
                self.temp_path.display(),
                self.target.display()
            )
        })?;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            drop(writer);
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_temp_path_appends_suffix() {
        let storage = TempFileStorage::new(&Settings::default());
        assert_eq!(
            storage.temp_path(Path::new("/etc/app.ini")),
            PathBuf::from("/etc/app.ini.tmp")
        );
    }

    #[test]
    fn test_commit_replaces_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("app.ini");
        fs::write(&target, "old\n").unwrap();

        let storage = TempFileStorage::new(&Settings {
            sync_before_rename: true,
            ..Settings::default()
        });
        let mut staged = storage.stage(&target).unwrap();
        staged.write_line(b"new\n").unwrap();
        staged.write_line(b"tail").unwrap();
        assert_eq!(staged.lines_written(), 2);
        staged.finish_line(b"\n").unwrap();
        let temp_path = staged.temp_path().to_path_buf();
        staged.commit().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new\ntail\n");
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_finish_line_is_noop_at_line_start() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("app.ini");
        let storage = TempFileStorage::new(&Settings::default());

        let mut staged = storage.stage(&target).unwrap();
        staged.finish_line(b"\n").unwrap();
        staged.write_line(b"a\n").unwrap();
        staged.finish_line(b"\n").unwrap();
        staged.commit().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "a\n");
    }

    #[test]
    fn test_drop_discards_staging_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("app.ini");
        fs::write(&target, "keep\n").unwrap();

        let storage = TempFileStorage::new(&Settings::default());
        let mut staged = storage.stage(&target).unwrap();
        staged.write_line(b"discarded\n").unwrap();
        let temp_path = staged.temp_path().to_path_buf();
        drop(staged);

        assert!(!temp_path.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "keep\n");
    }

    #[test]
    fn test_lines_are_counted_in_reader_chunks() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("app.ini");
        let settings = Settings {
            line_max: 5,
            ..Settings::default()
        };
        let storage = TempFileStorage::new(&settings);

        let mut staged = storage.stage(&target).unwrap();
        staged.write_line(b"ab\n").unwrap();
        assert_eq!(staged.lines_written(), 1);
        // 4-byte chunks: "abcd", "efgh", "i\n"
        staged.write_line(b"abcdefghi\n").unwrap();
        assert_eq!(staged.lines_written(), 4);
        // Exactly one chunk long, so the terminator is a chunk of its own.
        staged.write_line(b"wxyz").unwrap();
        assert!(!staged.at_line_start());
        staged.finish_line(b"\n").unwrap();
        assert_eq!(staged.lines_written(), 6);
        assert!(staged.at_line_start());
        staged.commit().unwrap();

        let content = fs::read(&target).unwrap();
        let reader = crate::core::line::LineReader::new(content.as_slice(), settings.line_max);
        assert_eq!(reader.count(), 6);
    }

    #[test]
    fn test_stage_fails_in_missing_directory() {
        let dir = tempdir().unwrap();
        let storage = TempFileStorage::new(&Settings::default());
        assert!(storage.stage(&dir.path().join("no/such/dir/app.ini")).is_err());
    }
}
