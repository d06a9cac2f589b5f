//! Scripted source: replays queued message batches, one batch per poll
//!
//! Used by integration tests to drive the engine tick by tick, and to replay
//! newline-delimited JSON captures (one batch per line).

use anyhow::{Context, Result};
use hud_core::{model::TelemetryMessage, source::TelemetrySource};
use serde::Deserialize;
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::{Arc, Mutex};

type BatchQueue = Arc<Mutex<VecDeque<Vec<TelemetryMessage>>>>;

/// A capture line holds either a whole batch or a single message
#[derive(Deserialize)]
#[serde(untagged)]
enum CaptureLine {
    Batch(Vec<TelemetryMessage>),
    Single(TelemetryMessage),
}

/// Cloneable handle for feeding a [`ScriptedSource`] after it has been
/// handed to the engine
#[derive(Clone, Default)]
pub struct ScriptHandle {
    queue: BatchQueue,
}

impl ScriptHandle {
    /// Queue the batch returned by a future poll
    pub fn push(&self, batch: Vec<TelemetryMessage>) {
        if let Ok(mut q) = self.queue.lock() {
            q.push_back(batch);
        }
    }

    /// Queue `count` empty polls (silence on every topic)
    pub fn push_silence(&self, count: usize) {
        if let Ok(mut q) = self.queue.lock() {
            q.extend(std::iter::repeat_with(Vec::new).take(count));
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

pub struct ScriptedSource {
    key: String,
    active: bool,
    handle: ScriptHandle,
}

impl ScriptedSource {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            active: false,
            handle: ScriptHandle::default(),
        }
    }

    /// Load a newline-delimited JSON capture; blank lines are empty polls
    pub fn from_ndjson<R: BufRead>(key: impl Into<String>, reader: R) -> Result<Self> {
        let source = Self::new(key);
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.context("failed to read capture")?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                source.handle.push(Vec::new());
                continue;
            }
            let parsed: CaptureLine = serde_json::from_str(trimmed)
                .with_context(|| format!("invalid capture line {}", lineno + 1))?;
            source.handle.push(match parsed {
                CaptureLine::Batch(batch) => batch,
                CaptureLine::Single(msg) => vec![msg],
            });
        }
        Ok(source)
    }

    pub fn handle(&self) -> ScriptHandle {
        self.handle.clone()
    }
}

impl TelemetrySource for ScriptedSource {
    fn key(&self) -> &str {
        &self.key
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn start(&mut self) -> Result<()> {
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.active = false;
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<TelemetryMessage>> {
        if !self.active {
            return Ok(Vec::new());
        }
        let mut q = self
            .handle
            .queue
            .lock()
            .map_err(|_| anyhow::anyhow!("script queue lock poisoned"))?;
        Ok(q.pop_front().unwrap_or_default())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hud_core::model::{CarState, Topic};

    #[test]
    fn test_scripted_poll_order() {
        let mut source = ScriptedSource::new("script");
        let handle = source.handle();
        handle.push(vec![TelemetryMessage::CarState(CarState::default())]);
        handle.push_silence(2);
        assert_eq!(handle.pending(), 3);

        // Inactive sources yield nothing and keep the queue intact
        assert!(source.poll().unwrap().is_empty());
        assert_eq!(handle.pending(), 3);

        source.start().unwrap();
        let first = source.poll().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].topic(), Topic::CarState);
        assert!(source.poll().unwrap().is_empty());
        assert!(source.poll().unwrap().is_empty());
        assert!(source.poll().unwrap().is_empty());
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_from_ndjson() {
        let capture = concat!(
            r#"{"topic":"carState","payload":{"friction_brake_percent":80}}"#,
            "\n\n",
            r#"[{"topic":"liveCalibration","payload":{"rpy_calib":[0.0,0.01,0.0]}},{"topic":"radarState","payload":{}}]"#,
            "\n",
        );
        let source = ScriptedSource::from_ndjson("capture", capture.as_bytes()).unwrap();
        assert_eq!(source.handle().pending(), 3);
    }

    #[test]
    fn test_from_ndjson_reports_bad_line() {
        let capture = "{\"topic\":\"carState\",\"payload\":{}}\nnot json\n";
        let err = ScriptedSource::from_ndjson("capture", capture.as_bytes())
            .err()
            .unwrap();
        assert!(err.to_string().contains("line 2"));
    }
}
