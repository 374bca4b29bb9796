#![forbid(unsafe_code)]

//! Scenario trace recording and verification.
//!
//! A trace is JSONL: one `start` line, one `step` line per driver step and a
//! closing `summary` line. Every step carries an FNV-1a checksum of its
//! serialized record so a replayed run can be compared line by line.

use std::io::{self, BufRead, Write};

use serde_json::{Value, json};

use crate::driver::{DriverConfig, DriverStats, StepRecord};

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a over `bytes`.
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn to_io(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("failed to serialize step: {err}"))
}

/// Checksum of one step record.
pub fn step_checksum(record: &StepRecord) -> io::Result<u64> {
    let bytes = serde_json::to_vec(record).map_err(to_io)?;
    Ok(fnv1a(&bytes))
}

/// Writes a scenario trace.
#[derive(Debug)]
pub struct TraceRecorder<W: Write> {
    writer: W,
    steps: usize,
    last_checksum: Option<u64>,
}

impl<W: Write> TraceRecorder<W> {
    /// Recorder writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            steps: 0,
            last_checksum: None,
        }
    }

    /// Write the `start` line.
    pub fn start(
        &mut self,
        data_size: usize,
        start_index: usize,
        seed: u64,
        config: &DriverConfig,
    ) -> io::Result<()> {
        let line = json!({
            "event": "start",
            "data_size": data_size,
            "start_index": start_index,
            "seed": seed,
            "driver": config,
        });
        writeln!(self.writer, "{line}")
    }

    /// Write one `step` line.
    pub fn record(&mut self, record: &StepRecord) -> io::Result<u64> {
        let checksum = step_checksum(record)?;
        let line = json!({
            "event": "step",
            "checksum": format!("{checksum:016x}"),
            "step": record,
        });
        writeln!(self.writer, "{line}")?;
        self.steps += 1;
        self.last_checksum = Some(checksum);
        Ok(checksum)
    }

    /// Write the `summary` line and hand back the writer.
    pub fn finish(mut self, stats: &DriverStats) -> io::Result<W> {
        let line = json!({
            "event": "summary",
            "steps": self.steps,
            "last_checksum": self.last_checksum.map(|c| format!("{c:016x}")),
            "stats": stats,
        });
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Steps written so far.
    pub const fn steps(&self) -> usize {
        self.steps
    }
}

/// Result of verifying a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSummary {
    /// Step lines read.
    pub steps: usize,
    /// Checksum of the last step.
    pub last_checksum: Option<u64>,
    /// Step records in order.
    pub records: Vec<StepRecord>,
}

/// Read a trace back, verifying every step checksum.
pub fn verify_trace<R: BufRead>(reader: R) -> io::Result<TraceSummary> {
    let mut records = Vec::new();
    let mut last_checksum = None;

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(trimmed).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid JSONL at line {}: {err}", line_idx + 1),
            )
        })?;
        let Some(event) = value.get("event").and_then(Value::as_str) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("missing event at line {}", line_idx + 1),
            ));
        };
        if event != "step" {
            continue;
        }

        let expected = value
            .get("checksum")
            .and_then(Value::as_str)
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("missing checksum at line {}", line_idx + 1),
                )
            })?;
        let record: StepRecord = value
            .get("step")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid step at line {}: {err}", line_idx + 1),
                )
            })?
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("missing step at line {}", line_idx + 1),
                )
            })?;
        let actual = step_checksum(&record)?;
        if actual != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "checksum mismatch at tick {}: expected {expected:016x}, got {actual:016x}",
                    record.tick
                ),
            ));
        }
        last_checksum = Some(actual);
        records.push(record);
    }

    Ok(TraceSummary {
        steps: records.len(),
        last_checksum,
        records,
    })
}
