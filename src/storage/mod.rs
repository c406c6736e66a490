//! Storage layer.
//!
//! The node store runs on top of an ordered key-value substrate that offers
//! single-key atomicity and ordered prefix scans.
//!
//! # Modules
//!
//! - [`kv`] - Backend trait and the in-memory ordered map
//! - [`log`] - Durable backend: the in-memory map fronted by an operation log
//!
//! # Invariants
//!
//! - Every `put` and `delete` is atomic for its single key
//! - `scan_prefix` returns entries in key order
//! - The log backend appends a mutation before the in-memory map sees it

pub mod kv;
pub mod log;

pub use kv::{KvBackend, KvEntry, KvStats, MemoryKv};
pub use log::{LogKv, ReplayStats};
