//! Parallel scene rendering.
//!
//! A source file declares render units ([`discover`]); each unit is rendered by an external
//! engine in its own workspace ([`unit`], [`engine`]) on a bounded worker pool ([`batch`]).
//! Afterwards the [`manifest`] lists the existing outputs in declaration order and writes the
//! concatenation list for the merge tool.

/// Bounded parallel batch of unit renders.
pub mod batch;
/// Render unit discovery from source text.
pub mod discover;
/// External render engine seam.
pub mod engine;
/// Post-batch output manifest and concatenation list.
pub mod manifest;
/// Single unit render and its status.
pub mod unit;
