use crate::core::config::Settings;
use crate::core::session::Session;
use std::path::Path;

/// Opens `group` in a fresh session on `path`.
fn open(path: &Path, group: &str, settings: &Settings) -> Session {
    let mut session = Session::with_settings(settings.clone());
    session.set_path(path);
    session.group_begin(group);
    session
}

/// One-shot read of `[group] key`, falling back to `default`.
pub fn get_value(
    path: &Path,
    group: &str,
    key: &str,
    default: &str,
    settings: &Settings,
) -> String {
    open(path, group, settings).value_get(key, default)
}

/// One-shot write of `[group] key=value`. Returns whether the file was rewritten.
pub fn set_value(path: &Path, group: &str, key: &str, value: &str, settings: &Settings) -> bool {
    open(path, group, settings).value_set(key, value)
}

/// One-shot removal of `[group] key`. Returns whether a line was removed.
pub fn remove_value(path: &Path, group: &str, key: &str, settings: &Settings) -> bool {
    open(path, group, settings).value_remove(key)
}

pub fn contains_value(path: &Path, group: &str, key: &str, settings: &Settings) -> bool {
    open(path, group, settings).value_contains(key)
}
