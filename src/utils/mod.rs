//! Utilities for Playbot.
//!
//! Submodules:
//! - `keys`: Key-name resolution and typed-text token parsing (`<enter>` etc.).

pub mod keys;
