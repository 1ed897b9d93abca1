use anyhow::{Context, Result};
use schemars::{Schema, schema_for};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use super::models::ActionSequence;

/// Load a sequence from a JSON string slice.
///
/// Parsing fails outright on malformed JSON or an unknown action variant tag;
/// semantic checks live in [`ActionSequence::validate`] and are the caller's
/// pre-run concern.
pub fn load_from_str(s: &str) -> Result<ActionSequence> {
    serde_json::from_str(s).context("Failed to parse JSON sequence string")
}

/// Load a sequence from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<ActionSequence> {
    serde_json::from_reader(reader).context("Failed to parse JSON sequence from reader")
}

/// Load a sequence from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ActionSequence> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open sequence file {}", path_ref.display()))?;
    let seq = load_from_reader(file)
        .with_context(|| format!("Failed to load sequence from {}", path_ref.display()))?;
    debug!(target: "playbot::sequence", "Loaded sequence from {}", path_ref.display());
    Ok(seq)
}

/// Load a sequence from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<ActionSequence> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read sequence file {}", path_ref.display()))?;
    let seq: ActionSequence = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON sequence from {}", path_ref.display()))?;
    debug!(target: "playbot::sequence", "Loaded sequence from {}", path_ref.display());
    Ok(seq)
}

/// Serialize a sequence to pretty-printed JSON.
pub fn save_to_string(seq: &ActionSequence) -> Result<String> {
    serde_json::to_string_pretty(seq).context("Failed to serialize sequence")
}

/// Write a sequence as pretty-printed JSON to any writer.
pub fn save_to_writer<W: Write>(mut writer: W, seq: &ActionSequence) -> Result<()> {
    let json = save_to_string(seq)?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write sequence to writer")?;
    Ok(())
}

/// Write a sequence to a file path synchronously.
pub fn save_to_path<P: AsRef<Path>>(path: P, seq: &ActionSequence) -> Result<()> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref)
        .with_context(|| format!("Failed to create sequence file {}", path_ref.display()))?;
    save_to_writer(file, seq)?;
    debug!(target: "playbot::sequence", "Saved sequence to {}", path_ref.display());
    Ok(())
}

/// Write a sequence to a file path asynchronously (Tokio).
pub async fn save_to_path_async<P: AsRef<Path>>(path: P, seq: &ActionSequence) -> Result<()> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let json = save_to_string(seq)?;
    fs::write(path_ref, json)
        .await
        .with_context(|| format!("Failed to write sequence file {}", path_ref.display()))?;
    debug!(target: "playbot::sequence", "Saved sequence to {}", path_ref.display());
    Ok(())
}

/// Generate the JSON Schema for the sequence document (for external tooling).
pub fn generate_schema() -> Schema {
    schema_for!(ActionSequence)
}

/// Write the JSON Schema for the sequence document to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}
