//! Host side of the per-run scratch-directory protocol.
//!
//! Every run stages a fresh scratch directory that is preopened into the
//! guest as `work`. The host writes the harness entry point and the user
//! source in; the guest writes captured text, emitted figures (one
//! JSON-encoded payload per line, in emission order), and an error report
//! out. The directory is discarded when the run settles, so records from a
//! settled run can never leak into a later one.

use crate::harness::HARNESS_PY;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

/// Harness entry point, the guest's argv[1].
pub(crate) const ENTRY_FILE: &str = "main.py";
/// The user's source text, verbatim.
pub(crate) const SOURCE_FILE: &str = "source.py";
/// Captured stdout/stderr text, written by the harness when the run settles.
pub(crate) const TEXT_FILE: &str = "stdout.txt";
/// Emitted figure payloads, one JSON-encoded data URI per line.
pub(crate) const FIGURES_FILE: &str = "figures.ndjson";
/// Structured guest error report.
pub(crate) const ERROR_FILE: &str = "error.json";

#[derive(Debug, Deserialize)]
struct ErrorReport {
    message: String,
}

/// Write the harness and the user source into a fresh scratch directory.
pub(crate) fn stage_run(dir: &Path, source: &str) -> io::Result<()> {
    fs::write(dir.join(SOURCE_FILE), source)?;
    fs::write(dir.join(ENTRY_FILE), HARNESS_PY)
}

/// The text the guest captured, normalized to empty when the harness never
/// got far enough to write it.
pub(crate) fn read_captured_text(dir: &Path) -> io::Result<String> {
    match fs::read_to_string(dir.join(TEXT_FILE)) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err),
    }
}

/// Figure payloads in guest emission order.
///
/// Malformed records are dropped without disturbing the records around them.
pub(crate) fn read_emitted_figures(dir: &Path) -> io::Result<Vec<String>> {
    let raw = match fs::read_to_string(dir.join(FIGURES_FILE)) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut payloads = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<String>(line) {
            Ok(payload) => payloads.push(payload),
            Err(err) => tracing::warn!(error = %err, "discarding malformed figure record"),
        }
    }
    Ok(payloads)
}

/// The guest's error report, if it wrote one.
///
/// Falls back to the raw file contents when the report is not valid JSON.
pub(crate) fn read_guest_error(dir: &Path) -> Option<String> {
    let raw = fs::read_to_string(dir.join(ERROR_FILE)).ok()?;
    let message = serde_json::from_str::<ErrorReport>(&raw)
        .map(|report| report.message)
        .unwrap_or(raw);
    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
