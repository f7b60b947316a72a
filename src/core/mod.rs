// This file is the module declaration file for the `core` module.
// It declares the engine's submodules and exposes them to the rest of the
// crate (and to users of the library).

// `config` module:
// Accessor settings (line ending, staging suffix, fsync, line cap) and the
// `ConfigManager` that loads and saves them as TOML.
pub mod config;

// `line` module:
// The bounded `LineReader` and the byte-level helpers every scan shares:
// terminator stripping, header/candidate classification and key matching.
pub mod line;

// `locator` module:
// Finds a `[section]` header and the line range of its body.
pub mod locator;

// `mutator` module:
// Rewrites the file through a staged copy to set or remove a key.
pub mod mutator;

// `scanner` module:
// Looks up a key's line number or value inside a section range.
pub mod scanner;

// `session` module:
// The caller-facing `Session`, which caches the open section between calls.
pub mod session;

// `version` module:
// Text printed by `cini --version`.
pub mod version;
