//! Core memory store orchestrating embedding and snapshot persistence.
//!
//! Provides a high-level API for storing and searching facts with automatic
//! embedding generation via the model manager.

mod crud;
mod search;

// pub(crate): module internals hidden; public items re-exported explicitly via lib.rs
pub(crate) mod store;

pub use store::MemoryStore;

#[cfg(test)]
mod tests;
