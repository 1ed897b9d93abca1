//! Sequence module for Playbot.
//!
//! This module wires together the action/sequence data models and the
//! loading/saving helpers used throughout the crate. Import from here for a
//! convenient, stable API.
//!
//! Example:
//! use playbot::sequence::{ActionSequence, load_from_path};
//!
//! let seq = load_from_path("sequences/login.json")?;

pub mod loader;
pub mod models;

// Re-export core data models
pub use models::{
    Action, ActionKind, ActionSequence, LOOP_FOREVER, MouseButton, ScrollDirection,
    now_epoch_secs,
};

// Re-export loader utilities
pub use loader::{
    generate_schema, load_from_path, load_from_path_async, load_from_reader, load_from_str,
    save_to_path, save_to_path_async, save_to_string, save_to_writer, write_schema_to_writer,
};
