//! Shared helpers for TUI features.

pub mod text;
