use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::builders::storage::TempFileStorage;
use crate::builders::validator::{EntryValidator, StandardValidator};
use crate::core::config::Settings;
use crate::core::locator::{self, SectionRange};
use crate::core::{mutator, scanner};

/// Accessor for one INI-style file.
///
/// A `Session` remembers the file path and the line range of the section
/// opened with [`Session::group_begin`], so several key operations on the
/// same section only locate it once.
///
/// Every operation is best-effort: I/O failures are logged and surface as
/// `false`, the caller's default, or a no-op.
///
/// ```no_run
/// use cini::Session;
///
/// let mut session = Session::new();
/// session.set_path("app.ini");
/// session.group_begin("window");
/// session.value_set("width", "800");
/// assert_eq!(session.value_get("width", "640"), "800");
/// ```
pub struct Session {
    path: PathBuf,
    group: Option<String>,
    range: SectionRange,
    settings: Settings,
    storage: TempFileStorage,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let storage = TempFileStorage::new(&settings);
        Self {
            path: PathBuf::new(),
            group: None,
            range: SectionRange::NONE,
            settings,
            storage,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Points the session at another file and closes any open section.
    pub fn set_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.path = path.into();
        self.reset();
    }

    /// Opens section `group`, returning whether it exists on disk.
    ///
    /// A missing section is still remembered by name so that the next
    /// `value_set` can create it. An empty name closes the section instead.
    pub fn group_begin(&mut self, group: &str) -> bool {
        if group.is_empty() {
            self.reset();
            return false;
        }

        let found = match locator::find_section(
            &self.path,
            group,
            0,
            self.settings.effective_line_max(),
        ) {
            Ok(found) => found,
            Err(err) => {
                debug!("treating [{group}] as absent: {err:#}");
                None
            }
        };

        self.group = Some(group.to_string());
        self.range = found.unwrap_or(SectionRange::NONE);
        found.is_some()
    }

    pub fn group_end(&mut self) {
        self.reset();
    }

    /// Name of the open section, found or pending.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Cached line range of the open section; `end == 0` when it is absent.
    pub fn section_range(&self) -> SectionRange {
        self.range
    }

    pub fn group_exists(&self) -> bool {
        self.range.exists()
    }

    /// Value of `key` in the open section, or `default` when the section or
    /// the key is missing.
    pub fn value_get(&self, key: &str, default: &str) -> String {
        if !self.group_exists() {
            return default.to_string();
        }
        match scanner::read_value(
            &self.path,
            self.range,
            key,
            self.settings.effective_line_max(),
        ) {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(err) => {
                warn!("reading {key}: {err:#}");
                default.to_string()
            }
        }
    }

    /// Writes `key=value` into the open section, creating the file, the
    /// section or the key line as needed. Returns whether the file was
    /// rewritten.
    pub fn value_set(&mut self, key: &str, value: &str) -> bool {
        let Some(group) = self.group.as_deref() else {
            debug!("no section open, ignoring set of {key}");
            return false;
        };

        let issues = StandardValidator::new().validate_entry(group, key, value);
        if !issues.is_empty() {
            for issue in &issues {
                warn!("refusing to set {key}: {issue}");
            }
            return false;
        }

        match mutator::modify(
            &self.path,
            group,
            self.range,
            key,
            value,
            &self.settings,
            &self.storage,
        ) {
            Ok(range) => {
                self.range = range;
                true
            }
            Err(err) => {
                warn!("setting {key}: {err:#}");
                false
            }
        }
    }

    /// Deletes every line assigning `key` in the open section. Returns whether
    /// anything was removed.
    pub fn value_remove(&mut self, key: &str) -> bool {
        if !self.group_exists() {
            return false;
        }
        match mutator::remove(&self.path, self.range, key, &self.settings, &self.storage) {
            Ok(removed) => {
                self.range.end = self.range.end.saturating_sub(removed).max(self.range.start);
                removed > 0
            }
            Err(err) => {
                warn!("removing {key}: {err:#}");
                false
            }
        }
    }

    pub fn value_contains(&self, key: &str) -> bool {
        self.key_line(key).is_some()
    }

    /// 1-based line number of `key` in the open section.
    pub fn key_line(&self, key: &str) -> Option<usize> {
        if !self.group_exists() {
            return None;
        }
        scanner::key_line(
            &self.path,
            self.range,
            key,
            self.settings.effective_line_max(),
        )
        .unwrap_or_else(|err| {
            warn!("looking up {key}: {err:#}");
            None
        })
    }

    fn reset(&mut self) {
        self.group = None;
        self.range = SectionRange::NONE;
    }
}
