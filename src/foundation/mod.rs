//! Shared error taxonomy and project conventions.

/// Error type and result alias.
pub mod error;
/// Project directory layout and render quality presets.
pub mod project;
