// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! The byte-identical-across-runs JSON Lines event log.
//!
//! This is a separate channel from the crate's ambient `tracing` logging:
//! `tracing` output is advisory and may vary run to run (timestamps,
//! thread ids); this logger is the one whose bytes the determinism
//! checker compares.

use std::io::{self, Write};

use serde_json::{Map, Value};

/// The optional fields an event record may carry, beyond `time`/`node`/`event`.
#[derive(Default, Clone, Debug)]
pub struct EventExtra {
    /// Block or vote height, when applicable.
    pub height: Option<u64>,
    /// Transport message id, when applicable.
    pub msg_id: Option<u64>,
    /// Origin node id, for send/deliver/block events.
    pub from: Option<String>,
    /// Destination node id, for send/deliver/block events.
    pub to: Option<String>,
    /// The message kind string (`TX`, `VOTE`, ...).
    pub msg_type: Option<String>,
    /// A short human-readable reason, for drop/block events.
    pub reason: Option<String>,
}

/// Appends one JSON object per event to an underlying writer, with sorted
/// keys and `time` rounded to 6 fractional digits.
pub struct JsonLinesLogger<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesLogger<W> {
    /// Wrap `writer`; every call to `log_event` appends one line to it.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Append one event record.
    pub fn log_event(&mut self, time: f64, node: &str, event: &str, extra: EventExtra) -> io::Result<()> {
        let mut record = Map::new();
        record.insert("time".to_string(), Value::from(round6(time)));
        record.insert("node".to_string(), Value::from(node));
        record.insert("event".to_string(), Value::from(event));
        if let Some(h) = extra.height {
            record.insert("height".to_string(), Value::from(h));
        }
        if let Some(id) = extra.msg_id {
            record.insert("msg_id".to_string(), Value::from(id));
        }
        if let Some(from) = extra.from {
            record.insert("from".to_string(), Value::from(from));
        }
        if let Some(to) = extra.to {
            record.insert("to".to_string(), Value::from(to));
        }
        if let Some(msg_type) = extra.msg_type {
            record.insert("msg_type".to_string(), Value::from(msg_type));
        }
        if let Some(reason) = extra.reason {
            record.insert("reason".to_string(), Value::from(reason));
        }

        let value = Value::Object(record);
        serde_json::to_writer(&mut self.writer, &value)?;
        self.writer.write_all(b"\n")
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn round6(time: f64) -> f64 {
    (time * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_event_emits_sorted_keys_and_rounded_time() {
        let mut buf = Vec::new();
        {
            let mut logger = JsonLinesLogger::new(&mut buf);
            let extra = EventExtra {
                to: Some("n1".to_string()),
                from: Some("n0".to_string()),
                ..Default::default()
            };
            logger.log_event(1.0000005, "n0", "SEND", extra).unwrap();
        }
        let line = String::from_utf8(buf).unwrap();
        let line = line.trim_end();
        assert!(line.starts_with(r#"{"event":"SEND","from":"n0","node":"n0","time":"#));
        let parsed: Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["time"].as_f64().unwrap(), 1.000001);
    }

    #[test]
    fn round6_rounds_to_six_fractional_digits() {
        assert_eq!(round6(0.123456789), 0.123457);
        assert_eq!(round6(2.0), 2.0);
    }
}
