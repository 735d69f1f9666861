//! Command log / replay recorder.
//!
//! Every externally visible invocation — foreground, background, unmount,
//! fixture copy — is appended here in shell-reproducible form before it
//! runs. When a test case fails, the recorded lines are printed so the
//! operator can paste them into a shell and replay the failing scenario
//! exactly.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Completed-command record kept alongside the replay lines, serializable
/// for post-mortem artifact capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub program: String,
    pub args: Vec<String>,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Ordered log of one test case's command invocations.
#[derive(Debug, Default)]
pub struct ReplayLog {
    entries: Vec<String>,
    records: Vec<CommandRecord>,
}

impl ReplayLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one invocation, quoted so each line is a single shell-safe
    /// token sequence. Called before the process is spawned, so an entry
    /// exists even if the process hangs.
    pub fn record(&mut self, program: &str, args: &[String]) {
        let mut line = shell_escape::escape(Cow::Borrowed(program)).into_owned();
        for arg in args {
            line.push(' ');
            line.push_str(&shell_escape::escape(Cow::Borrowed(arg.as_str())));
        }
        debug!(command = %line, "recorded invocation");
        self.entries.push(line);
    }

    /// Append the completion record of a finished command.
    pub fn record_result(
        &mut self,
        program: &str,
        args: &[String],
        exit_code: i32,
        duration: Duration,
    ) {
        self.records.push(CommandRecord {
            program: program.to_string(),
            args: args.to_vec(),
            exit_code,
            duration_ms: duration.as_millis() as u64,
            finished_at: Utc::now(),
        });
    }

    /// Clear the log at test-case start.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.records.clear();
    }

    /// The recorded lines, in execution order. Reading does not clear.
    pub fn dump(&self) -> &[String] {
        &self.entries
    }

    /// Completion records, in execution order.
    pub fn records(&self) -> &[CommandRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Print the paste-into-a-shell reproduction instructions. Called on
    /// the test-case-failure path only.
    pub fn print_instructions(&self) {
        println!("\n*** To recreate the test case, run the following command(s):");
        for line in &self.entries {
            println!("{line}");
        }
    }

    /// Write the completion records as a JSON artifact.
    pub fn write_records_json(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        let payload = serde_json::to_string_pretty(&self.records)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        file.write_all(payload.as_bytes())?;
        file.write_all(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order() {
        let mut log = ReplayLog::new();
        log.record("u6fs", &["disk.img".to_string(), "sb".to_string()]);
        log.record("u6fs", &["disk.img".to_string(), "tree".to_string()]);
        log.record("fusermount", &["-u".to_string(), "/tmp/mnt".to_string()]);

        assert_eq!(
            log.dump(),
            &[
                "u6fs disk.img sb",
                "u6fs disk.img tree",
                "fusermount -u /tmp/mnt",
            ]
        );
    }

    #[test]
    fn test_record_quotes_unsafe_arguments() {
        let mut log = ReplayLog::new();
        log.record(
            "u6fs",
            &["my disk.img".to_string(), "mkdir".to_string(), "a;b".to_string()],
        );

        let line = &log.dump()[0];
        assert!(line.contains("'my disk.img'"));
        assert!(line.contains("'a;b'"));
    }

    #[test]
    fn test_reset_clears_dump_does_not() {
        let mut log = ReplayLog::new();
        log.record("u6fs", &["disk.img".to_string(), "sb".to_string()]);
        log.record_result(
            "u6fs",
            &["disk.img".to_string(), "sb".to_string()],
            0,
            Duration::from_millis(3),
        );

        let _ = log.dump();
        assert_eq!(log.dump().len(), 1);
        assert_eq!(log.records().len(), 1);

        log.reset();
        assert!(log.is_empty());
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_records_json_round_trips() {
        let mut log = ReplayLog::new();
        log.record_result(
            "u6fs",
            &["disk.img".to_string(), "inode".to_string()],
            3,
            Duration::from_millis(12),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts/commands.json");
        log.write_records_json(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<CommandRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, log.records());
    }
}
