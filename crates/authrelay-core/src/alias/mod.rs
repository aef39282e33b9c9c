//! Alias storage and `{name}` template resolution.
//!
//! This module provides:
//! - `AliasStore`: the store contract the client composes by reference
//! - `MemoryAliasStore`: process-lifetime store with optional TTL
//! - `FileAliasStore`: JSON-file backed store for use across runs

pub mod file;
pub mod store;
mod template;

pub use file::FileAliasStore;
pub use store::{AliasEntry, AliasStore, MemoryAliasStore};
