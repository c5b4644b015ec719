//! Application telemetry events and sinks.
//!
//! Every successful lifecycle mutation and every migration run produces a
//! structured event. Sinks decide where events go; the server writes them to
//! stderr as JSON lines next to its `tracing` output.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted by the review rotation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the current database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20261001000000`).
        schema_version: String,
    },
    /// Reviewers were attached to a freshly created pull request.
    ReviewersAssigned {
        /// Identifier of the new pull request.
        pull_request_id: String,
        /// Chosen reviewers; empty when no teammate was eligible.
        reviewer_ids: Vec<String>,
    },
    /// A pull request moved from `OPEN` to `MERGED`.
    PullRequestMerged {
        /// Identifier of the merged pull request.
        pull_request_id: String,
    },
    /// One reviewer edge was handed to another teammate.
    ReviewerReassigned {
        /// Identifier of the affected pull request.
        pull_request_id: String,
        /// Reviewer whose edge was replaced.
        old_reviewer_id: String,
        /// Reviewer who now holds the edge.
        new_reviewer_id: String,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// In-memory sinks for tests.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::{Arc, Mutex, PoisonError};

    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that keeps every recorded event. Clones share the same buffer.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingTelemetrySink {
        events: Arc<Mutex<Vec<TelemetryEvent>>>,
    }

    impl RecordingTelemetrySink {
        /// Returns a snapshot of the events recorded so far.
        #[must_use]
        pub fn events(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl TelemetrySink for RecordingTelemetrySink {
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}
