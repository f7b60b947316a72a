// This file is the module declaration file for the `builders` module.
// It declares and makes public the supporting pieces the engine is built on.

// The `pub mod storage;` declaration exposes the `storage` module.
//
// `storage` module:
// This module provides the staging step for rewrites. It defines the
// `StorageProvider` trait and `TempFileStorage`, which writes the new content
// next to the target and swaps it into place on commit.
pub mod storage;

// The `pub mod validator;` declaration exposes the `validator` module.
//
// `validator` module:
// This module refuses group names, keys and values the line format cannot
// represent (line breaks, keys that could never be matched). It defines the
// `EntryValidator` trait and its `StandardValidator` implementation.
pub mod validator;
