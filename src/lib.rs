//! Read and write single values in INI-style files.
//!
//! Files are never parsed into a document. Each operation scans the file line
//! by line, and changes are made by streaming the file into a staged copy that
//! replaces the original, so every untouched line keeps its exact bytes.
pub mod builders;
pub mod core;
pub mod utils;


pub use crate::core::config::Settings;
pub use crate::core::session::Session;
