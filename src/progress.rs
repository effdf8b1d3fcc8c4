//! Collection progress reporting.
//!
//! Reports what `kyc collect` is doing so operators can follow long
//! sweeps over large source trees. Progress is emitted on **stderr** so
//! stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a collection run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectProgressEvent {
    /// Walking the source tree. Total unknown.
    Indexing { source: String },
    /// Source tree walked; `files` candidates found.
    Indexed { files: u64 },
    /// Processing client folder `n` of `total`.
    Client { folder: String, n: u64, total: u64 },
}

/// Receives collection progress. Implementations write to stderr (human or JSON).
pub trait CollectProgressReporter: Send + Sync {
    fn report(&self, event: CollectProgressEvent);
}

/// Human-friendly progress on stderr: "collect  client  3 / 120  Jane Doe 123".
pub struct StderrProgress;

impl CollectProgressReporter for StderrProgress {
    fn report(&self, event: CollectProgressEvent) {
        let line = match &event {
            CollectProgressEvent::Indexing { source } => {
                format!("collect  indexing {}...\n", source)
            }
            CollectProgressEvent::Indexed { files } => {
                format!("collect  indexed {} files\n", format_number(*files))
            }
            CollectProgressEvent::Client { folder, n, total } => format!(
                "collect  client  {} / {}  {}\n",
                format_number(*n),
                format_number(*total),
                folder
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl CollectProgressReporter for JsonProgress {
    fn report(&self, event: CollectProgressEvent) {
        let obj = match &event {
            CollectProgressEvent::Indexing { source } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "source": source
            }),
            CollectProgressEvent::Indexed { files } => serde_json::json!({
                "event": "progress",
                "phase": "indexed",
                "files": files
            }),
            CollectProgressEvent::Client { folder, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "client",
                "folder": folder,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl CollectProgressReporter for NoProgress {
    fn report(&self, _event: CollectProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn CollectProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
