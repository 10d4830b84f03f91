//! Collection progress reporting.
//!
//! Reports observable progress during `rvh collect` so users see which
//! entity is being paginated and how far along the run is. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a collection run.
#[derive(Clone, Debug)]
pub enum CollectProgressEvent {
    /// Fetching and parsing the listing page. Entity count unknown.
    Discovering { listing_url: String },
    /// Starting entity `n` of `total`.
    Entity { n: u64, total: u64, name: String },
    /// One review page parsed for the current entity.
    Page {
        entity: String,
        page: u32,
        reviews: u64,
    },
}

/// Reports collection progress. Implementations write to stderr (human or JSON).
pub trait CollectProgressReporter: Send + Sync {
    fn report(&self, event: CollectProgressEvent);
}

/// Human-friendly progress on stderr: "collect  entity 3 / 10  Hotel Sunrise".
pub struct StderrProgress;

impl CollectProgressReporter for StderrProgress {
    fn report(&self, event: CollectProgressEvent) {
        let line = match &event {
            CollectProgressEvent::Discovering { listing_url } => {
                format!("collect  discovering {}\n", listing_url)
            }
            CollectProgressEvent::Entity { n, total, name } => {
                format!(
                    "collect  entity {} / {}  {}\n",
                    format_number(*n),
                    format_number(*total),
                    name
                )
            }
            CollectProgressEvent::Page {
                entity,
                page,
                reviews,
            } => {
                format!(
                    "collect  {}  page {}  {} reviews\n",
                    entity,
                    page,
                    format_number(*reviews)
                )
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl CollectProgressReporter for JsonProgress {
    fn report(&self, event: CollectProgressEvent) {
        let obj = match &event {
            CollectProgressEvent::Discovering { listing_url } => serde_json::json!({
                "event": "progress",
                "phase": "discovering",
                "listing_url": listing_url
            }),
            CollectProgressEvent::Entity { n, total, name } => serde_json::json!({
                "event": "progress",
                "phase": "entity",
                "n": n,
                "total": total,
                "name": name
            }),
            CollectProgressEvent::Page {
                entity,
                page,
                reviews,
            } => serde_json::json!({
                "event": "progress",
                "phase": "page",
                "entity": entity,
                "page": page,
                "reviews": reviews
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl CollectProgressReporter for NoProgress {
    fn report(&self, _event: CollectProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
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
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
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

    /// Parse a `--progress` value; `None` means "decide from the TTY".
    pub fn from_flag(flag: Option<&str>) -> anyhow::Result<Self> {
        match flag {
            None => Ok(Self::default_for_tty()),
            Some("off") => Ok(ProgressMode::Off),
            Some("human") => Ok(ProgressMode::Human),
            Some("json") => Ok(ProgressMode::Json),
            Some(other) => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be off, human, or json.",
                other
            ),
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

    #[test]
    fn progress_flag_parsing() {
        assert_eq!(ProgressMode::from_flag(Some("json")).unwrap(), ProgressMode::Json);
        assert_eq!(ProgressMode::from_flag(Some("off")).unwrap(), ProgressMode::Off);
        assert!(ProgressMode::from_flag(Some("loud")).is_err());
    }
}
