//! Common types shared across Office Hours components.

#![warn(clippy::pedantic)]

/// Module for identifier, presence, and session status types
pub mod types;

/// Module for common configuration
pub mod config;
