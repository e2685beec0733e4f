#![forbid(unsafe_code)]

//! JSONL run log.
//!
//! One JSON object per line, tagged by `event`:
//!
//! | event          | fields                                                          |
//! |----------------|-----------------------------------------------------------------|
//! | `run_start`    | case, seed, max_opacity, cell_size, gap                         |
//! | `resize`       | width, height, dpr, columns, rows                               |
//! | `visibility`   | visible, state                                                  |
//! | `frame`        | frame_id, now_ms, flickered_on, decayed, drawn, lit, checksum   |
//! | `teardown`     | passes                                                          |
//! | `run_complete` | frames, skipped, checksums, final_checksum                      |
//! | `error`        | message                                                         |
//!
//! Every record also carries `run_id`. Only in-memory loggers (and writers
//! opted in with [`RunLogger::retain_records`]) keep records after writing
//! them; frame checksums are always kept for `run_complete`.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

/// Appends run records to a JSONL sink, optionally keeping them in memory.
pub struct RunLogger {
    writer: Option<Box<dyn Write>>,
    run_id: String,
    keep_records: bool,
    records: Vec<Value>,
    checksums: Vec<String>,
}

impl std::fmt::Debug for RunLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLogger")
            .field("run_id", &self.run_id)
            .field("records", &self.records.len())
            .field("writing", &self.writer.is_some())
            .finish()
    }
}

impl RunLogger {
    /// Append to the file at `path`, creating parent directories.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::to_writer(BufWriter::new(file)))
    }

    /// Stream records to `writer` without keeping them.
    pub fn to_writer<W: Write + 'static>(writer: W) -> Self {
        Self {
            writer: Some(Box::new(writer)),
            keep_records: false,
            ..Self::noop()
        }
    }

    /// Keep records in memory only.
    pub fn noop() -> Self {
        Self {
            writer: None,
            run_id: generate_run_id(),
            keep_records: true,
            records: Vec::new(),
            checksums: Vec::new(),
        }
    }

    /// Replace the generated run id.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Keep written records in memory as well.
    #[must_use]
    pub fn retain_records(mut self) -> Self {
        self.keep_records = true;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Records whose `event` field equals `event`.
    pub fn events<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records
            .iter()
            .filter(move |r| r.get("event").and_then(Value::as_str) == Some(event))
    }

    pub fn checksums(&self) -> &[String] {
        &self.checksums
    }

    pub fn log_start(&mut self, case: &str, seed: u64, max_opacity: f32, cell_size: f32, gap: f32) {
        self.record(json!({
            "event": "run_start",
            "case": case,
            "seed": seed,
            "max_opacity": max_opacity,
            "cell_size": cell_size,
            "gap": gap,
        }));
    }

    pub fn log_resize(&mut self, width: f32, height: f32, dpr: f32, columns: usize, rows: usize) {
        self.record(json!({
            "event": "resize",
            "width": width,
            "height": height,
            "dpr": dpr,
            "columns": columns,
            "rows": rows,
        }));
    }

    pub fn log_visibility(&mut self, visible: bool, state: &str) {
        self.record(json!({
            "event": "visibility",
            "visible": visible,
            "state": state,
        }));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_frame(
        &mut self,
        frame_id: u64,
        now_ms: f64,
        flickered_on: usize,
        decayed: usize,
        drawn: usize,
        lit: usize,
        checksum: &str,
    ) {
        self.checksums.push(checksum.to_string());
        self.record(json!({
            "event": "frame",
            "frame_id": frame_id,
            "now_ms": now_ms,
            "flickered_on": flickered_on,
            "decayed": decayed,
            "drawn": drawn,
            "lit": lit,
            "checksum": checksum,
        }));
    }

    pub fn log_teardown(&mut self, passes: u64) {
        self.record(json!({ "event": "teardown", "passes": passes }));
    }

    pub fn log_complete(&mut self, frames: u64, skipped: u64) {
        let final_checksum = self.checksums.last().cloned();
        let checksums = self.checksums.clone();
        self.record(json!({
            "event": "run_complete",
            "frames": frames,
            "skipped": skipped,
            "checksums": checksums,
            "final_checksum": final_checksum,
        }));
    }

    pub fn log_error(&mut self, message: &str) {
        self.record(json!({ "event": "error", "message": message }));
    }

    fn record(&mut self, mut value: Value) {
        if let Value::Object(ref mut map) = value {
            map.insert("run_id".into(), Value::String(self.run_id.clone()));
        }
        if let Some(ref mut writer) = self.writer {
            let _ = writeln!(writer, "{value}");
            let _ = writer.flush();
        }
        if self.keep_records {
            self.records.push(value);
        }
    }
}

fn generate_run_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{timestamp:x}")
}
