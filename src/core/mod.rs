//! Core runtime infrastructure.
//!
//! - [`config`] - Configuration parsing and validation
//! - [`runtime`] - Composition root and lifecycle
//! - [`error`] - Error types and transport status mapping

pub mod config;
pub mod error;
pub mod runtime;
