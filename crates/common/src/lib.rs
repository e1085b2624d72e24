//! Shared helpers used across the steward workspace.

pub mod ids;
pub mod text;
pub mod time;
