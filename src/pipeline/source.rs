//! Reading source abstraction for OCR text ingestion.
//!
//! Provides a unified trait for pulling one raw reading per tick from
//! different places: a replay script (file), stdin (JSON or plain lines), or
//! an external OCR command run once per tick.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::config::defaults::LINE_CHANNEL_CAPACITY;
use crate::types::RawReading;

/// Events produced by a reading source.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingEvent {
    /// One frame's OCR text.
    Reading(RawReading),
    /// Source reached end of data (EOF for files/stdin).
    Eof,
}

/// Trait abstracting where raw readings come from.
///
/// The processing loop calls [`next_reading`](ReadingSource::next_reading)
/// in a `select!` with cancellation. An `Err` is an acquisition failure and
/// ends the loop.
#[async_trait]
pub trait ReadingSource: Send + 'static {
    async fn next_reading(&mut self) -> Result<ReadingEvent>;

    /// Human-readable name for logging (e.g. "replay", "stdin", "command").
    fn source_name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to spawn OCR command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR command '{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("No OCR command configured (set source.command)")]
    NoCommand,

    #[error("Replay line {line}: {message}")]
    ReplayFormat { line: usize, message: String },
}

// ============================================================================
// Replay Source (scripted readings)
// ============================================================================

/// One scripted reading: OCR text at an offset from the start of the replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedReading {
    pub offset: Duration,
    pub text: String,
}

impl ScriptedReading {
    pub fn new(offset_secs: f64, text: impl Into<String>) -> Self {
        Self {
            offset: Duration::try_from_secs_f64(offset_secs).unwrap_or(Duration::ZERO),
            text: text.into(),
        }
    }
}

/// Parse replay text: one `offset_secs,text` reading per line.
///
/// Everything after the first comma is the raw text, verbatim (it may be
/// empty, which replays a frame with no recognisable number). A first line
/// starting with `offset` is treated as a header; blank lines and lines
/// starting with `#` are skipped.
pub fn parse_replay(contents: &str) -> Result<Vec<ScriptedReading>, SourceError> {
    let mut readings = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line_num = idx + 1;
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if line_num == 1 && trimmed.starts_with("offset") {
            continue;
        }

        let (offset, text) = line.split_once(',').ok_or_else(|| SourceError::ReplayFormat {
            line: line_num,
            message: "expected 'offset_secs,text'".to_string(),
        })?;
        let offset_secs: f64 = offset.trim().parse().map_err(|e| SourceError::ReplayFormat {
            line: line_num,
            message: format!("invalid offset '{}': {}", offset.trim(), e),
        })?;
        if !offset_secs.is_finite() || offset_secs < 0.0 {
            return Err(SourceError::ReplayFormat {
                line: line_num,
                message: format!("offset must be a non-negative number, got {offset_secs}"),
            });
        }
        readings.push(ScriptedReading::new(offset_secs, text));
    }
    Ok(readings)
}

/// Load a replay file from disk.
pub fn load_replay_file(path: &Path) -> Result<Vec<ScriptedReading>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay file {}", path.display()))?;
    let readings = parse_replay(&contents)?;
    tracing::info!(count = readings.len(), path = %path.display(), "Loaded replay readings");
    Ok(readings)
}

/// Replays pre-loaded readings.
///
/// Timestamps are always `start + offset`, so debounce behaviour does not
/// depend on pacing. With `speed > 0` the source also sleeps so readings
/// arrive at `offset / speed` of wall-clock time; `speed == 0` replays as
/// fast as the loop pulls.
pub struct ReplaySource {
    readings: std::vec::IntoIter<ScriptedReading>,
    speed: f64,
    started: Option<(Instant, tokio::time::Instant)>,
}

impl ReplaySource {
    pub fn new(readings: Vec<ScriptedReading>, speed: f64) -> Self {
        Self {
            readings: readings.into_iter(),
            speed,
            started: None,
        }
    }

    /// Replay without pacing.
    pub fn unpaced(readings: Vec<ScriptedReading>) -> Self {
        Self::new(readings, 0.0)
    }
}

#[async_trait]
impl ReadingSource for ReplaySource {
    async fn next_reading(&mut self) -> Result<ReadingEvent> {
        let Some(scripted) = self.readings.next() else {
            return Ok(ReadingEvent::Eof);
        };
        let (base, wall_base) = *self
            .started
            .get_or_insert_with(|| (Instant::now(), tokio::time::Instant::now()));

        if self.speed > 0.0 {
            let paced = scripted.offset.div_f64(self.speed);
            tokio::time::sleep_until(wall_base + paced).await;
        }

        Ok(ReadingEvent::Reading(RawReading::new(
            scripted.text,
            base + scripted.offset,
        )))
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Line Source (stdin or any async reader)
// ============================================================================

/// JSON form of a line-delimited reading.
#[derive(Debug, Deserialize)]
struct JsonReading {
    text: String,
    #[serde(default)]
    offset_secs: Option<f64>,
}

/// Turns one input line into a raw reading.
///
/// A line holding a JSON object `{"text": "...", "offset_secs": 1.5}` uses
/// its offset (relative to the first line received) as the timestamp; any
/// other line is taken verbatim as OCR text stamped with the arrival time.
#[derive(Debug)]
struct LineParser {
    base: Option<Instant>,
    name: &'static str,
}

impl LineParser {
    fn new(name: &'static str) -> Self {
        Self { base: None, name }
    }

    fn parse(&mut self, line: &str) -> RawReading {
        let arrived = Instant::now();
        let base = *self.base.get_or_insert(arrived);

        if line.trim_start().starts_with('{') {
            match serde_json::from_str::<JsonReading>(line) {
                Ok(json) => {
                    let timestamp = json
                        .offset_secs
                        .and_then(|s| Duration::try_from_secs_f64(s).ok())
                        .map_or(arrived, |offset| base + offset);
                    return RawReading::new(json.text, timestamp);
                }
                Err(e) => {
                    tracing::debug!("[{}] Line is not a JSON reading ({}), using raw text", self.name, e);
                }
            }
        }
        RawReading::new(line, arrived)
    }
}

/// Reads one raw reading per line from an async reader.
pub struct LineSource<R> {
    reader: R,
    line_buffer: String,
    parser: LineParser,
}

impl<R: AsyncBufRead + Unpin + Send + 'static> LineSource<R> {
    pub fn new(reader: R, name: &'static str) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(256),
            parser: LineParser::new(name),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send + 'static> ReadingSource for LineSource<R> {
    async fn next_reading(&mut self) -> Result<ReadingEvent> {
        self.line_buffer.clear();
        let bytes = self
            .reader
            .read_line(&mut self.line_buffer)
            .await
            .with_context(|| format!("{} read error", self.parser.name))?;
        if bytes == 0 {
            return Ok(ReadingEvent::Eof);
        }
        let line = self.line_buffer.trim_end_matches(['\r', '\n']).to_string();
        Ok(ReadingEvent::Reading(self.parser.parse(&line)))
    }

    fn source_name(&self) -> &str {
        self.parser.name
    }
}

/// Reads one raw reading per line from a blocking reader (normally stdin).
///
/// Lines are read on a dedicated OS thread and handed over through a
/// channel. A read blocked on a quiet pipe therefore never holds up
/// cancellation or runtime shutdown; the thread is left behind and ends
/// with the process.
///
/// Used with an external OCR pipeline: `ocr_loop.sh | countwatch --stdin`
pub struct StdinSource {
    lines: mpsc::Receiver<std::io::Result<String>>,
    parser: LineParser,
}

impl StdinSource {
    /// Read from the process's stdin.
    pub fn stdin() -> Result<Self> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()), "stdin")
    }

    /// Read lines from any blocking reader on a background thread.
    pub fn from_reader<R>(reader: R, name: &'static str) -> Result<Self>
    where
        R: std::io::BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        std::thread::Builder::new()
            .name(format!("{name}-reader"))
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
            })
            .with_context(|| format!("Failed to start {name} reader thread"))?;
        Ok(Self {
            lines: rx,
            parser: LineParser::new(name),
        })
    }
}

#[async_trait]
impl ReadingSource for StdinSource {
    async fn next_reading(&mut self) -> Result<ReadingEvent> {
        match self.lines.recv().await {
            None => Ok(ReadingEvent::Eof),
            Some(Ok(line)) => Ok(ReadingEvent::Reading(self.parser.parse(&line))),
            Some(Err(e)) => Err(e).with_context(|| format!("{} read error", self.parser.name)),
        }
    }

    fn source_name(&self) -> &str {
        self.parser.name
    }
}

// ============================================================================
// Command Source (external OCR per tick)
// ============================================================================

/// Runs an external OCR command once per tick; its stdout is the raw text.
///
/// The command owns camera capture, cropping, thresholding and recognition,
/// e.g. `["sh", "-c", "grab_frame | tesseract stdin stdout --psm 7"]`.
/// Spawn failure or a non-zero exit status is an acquisition failure.
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
    ran_once: bool,
}

impl CommandSource {
    pub fn new(argv: &[String], poll_interval: Duration) -> Result<Self, SourceError> {
        let (program, args) = argv.split_first().ok_or(SourceError::NoCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            poll_interval,
            ran_once: false,
        })
    }
}

#[async_trait]
impl ReadingSource for CommandSource {
    async fn next_reading(&mut self) -> Result<ReadingEvent> {
        if self.ran_once && !self.poll_interval.is_zero() {
            tokio::time::sleep(self.poll_interval).await;
        }
        self.ran_once = true;

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(ReadingEvent::Reading(RawReading::now(text)))
    }

    fn source_name(&self) -> &str {
        "command"
    }
}
