//! Tailing a local log file.
//!
//! The first fetch starts at the beginning of the last `backlog` lines so a large existing
//! file does not flood the buffer. Later fetches continue from the last delivered byte;
//! only newline-terminated lines are delivered, a trailing partial line waits for the
//! writer. Requests whose window ends before the source was opened walk backwards from
//! the earliest delivered line instead. A local file has no time index, so windows are
//! otherwise advisory.

use crate::error::{Result, RltailError};
use crate::source::validation::validate_log_path;
use crate::source::{FetchPage, FetchRequest, LogSource, RawRecord};
use async_trait::async_trait;
use bstr::ByteSlice;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use memchr::memrchr;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Chunk size for backward scans.
const SCAN_CHUNK: usize = 64 * 1024;

#[derive(Debug, Default)]
struct TailState {
    opened_at: Option<DateTime<Utc>>,
    /// Start of the earliest line delivered so far.
    floor: u64,
    /// End of the last complete line delivered so far.
    delivered: u64,
}

/// A `LogSource` over a growing text file.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    backlog: usize,
    state: Arc<Mutex<TailState>>,
}

impl FileSource {
    /// Open `path`, delivering at most `backlog` pre-existing lines on the first fetch.
    pub fn open(path: impl AsRef<Path>, backlog: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        validate_log_path(&path)?;
        Ok(Self {
            path,
            backlog,
            state: Arc::new(Mutex::new(TailState::default())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSource for FileSource {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchPage> {
        let path = self.path.clone();
        let backlog = self.backlog;
        let state = Arc::clone(&self.state);

        tokio::task::spawn_blocking(move || {
            let mut state = state.lock();
            fetch_blocking(&path, backlog, &mut state, &request)
        })
        .await
        .map_err(|e| RltailError::other(format!("file reader task failed: {e}")))?
    }

    fn describe(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>")
            .to_string()
    }
}

fn fetch_blocking(
    path: &Path,
    backlog: usize,
    state: &mut TailState,
    request: &FetchRequest,
) -> Result<FetchPage> {
    let mut file = File::open(path)
        .map_err(|e| RltailError::file_error(format!("Cannot open {}", path.display()), e))?;
    let len = file.metadata()?.len();

    if len < state.delivered {
        log::info!(
            "{} shrank from {} to {} bytes, reading from the start",
            path.display(),
            state.delivered,
            len
        );
        state.floor = 0;
        state.delivered = 0;
    }

    match state.opened_at {
        Some(opened_at) if request.end < opened_at && request.token.is_none() => {
            return read_history(&mut file, state, request.limit);
        }
        Some(_) => {}
        None => {
            let start = line_start_before(&mut file, len, backlog)?;
            state.floor = start;
            state.delivered = start;
            state.opened_at = Some(Utc::now());
        }
    }

    let from = match request.token.as_deref() {
        Some(token) => token.parse::<u64>().map_err(|_| {
            RltailError::source_unavailable(format!("invalid continuation token '{token}'"))
        })?,
        None => state.delivered,
    };

    let chunk = read_lines(&mut file, from, len, request.limit)?;
    state.delivered = state.delivered.max(chunk.end);
    Ok(FetchPage {
        records: chunk.lines.into_iter().map(to_record).collect(),
        next_token: chunk.more.then(|| chunk.end.to_string()),
    })
}

fn read_history(file: &mut File, state: &mut TailState, limit: usize) -> Result<FetchPage> {
    if state.floor == 0 {
        return Ok(FetchPage::default());
    }
    let start = line_start_before(file, state.floor, limit)?;
    let chunk = read_lines(file, start, state.floor, limit)?;
    state.floor = start;
    Ok(FetchPage {
        records: chunk.lines.into_iter().map(to_record).collect(),
        next_token: None,
    })
}

struct LineChunk {
    lines: Vec<String>,
    end: u64,
    more: bool,
}

/// Read up to `limit` newline-terminated lines in `[from, to)`.
fn read_lines(file: &mut File, from: u64, to: u64, limit: usize) -> io::Result<LineChunk> {
    file.seek(SeekFrom::Start(from))?;
    let mut reader = BufReader::new(file);
    let mut lines = Vec::new();
    let mut offset = from;
    let mut buf = Vec::new();

    while lines.len() < limit && offset < to {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 || buf.last() != Some(&b'\n') {
            break;
        }
        offset += read as u64;
        let line = buf[..buf.len() - 1].trim_end_with(|c| c == '\r');
        lines.push(line.to_str_lossy().into_owned());
    }

    Ok(LineChunk {
        more: lines.len() >= limit && offset < to,
        lines,
        end: offset,
    })
}

/// Offset where the last `lines` complete lines ending at or before `end` begin.
fn line_start_before(file: &mut File, end: u64, lines: usize) -> io::Result<u64> {
    let mut buf = vec![0u8; SCAN_CHUNK];
    let mut pos = end;
    let mut seen = 0usize;

    while pos > 0 {
        let read_len = SCAN_CHUNK.min(pos as usize);
        pos -= read_len as u64;
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(&mut buf[..read_len])?;

        let mut window = read_len;
        while let Some(i) = memrchr(b'\n', &buf[..window]) {
            seen += 1;
            if seen > lines {
                return Ok(pos + i as u64 + 1);
            }
            window = i;
        }
    }
    Ok(0)
}

fn to_record(line: String) -> RawRecord {
    let timestamp = parse_leading_timestamp(&line).unwrap_or_else(Utc::now);
    RawRecord::new(timestamp, line)
}

/// Recognise an RFC 3339 or `YYYY-MM-DD HH:MM:SS` timestamp at the start of a line.
pub fn parse_leading_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let trimmed = line.trim_start().trim_start_matches('[');
    let token = trimmed
        .split(|c: char| c.is_whitespace() || c == ']')
        .next()?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(token) {
        return Some(ts.with_timezone(&Utc));
    }

    let candidate = trimmed.get(..19)?;
    let naive = NaiveDateTime::parse_from_str(candidate, "%Y-%m-%d %H:%M:%S").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
