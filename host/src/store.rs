use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Timelike};
use quiver_core::{Distance, RecordSink, SessionId, VolleyRecord};

/// Column header of the shot log. Existing logs depend on it byte for byte.
pub const LOG_HEADER: &str = "datetime,session_id,volley,freccia,x,y,punteggio,distanza";

pub const DEFAULT_LOG_FILE: &str = "storico_frecce.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const COLUMNS: usize = 8;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    HeaderMismatch { found: String },
    MalformedRow { line: usize, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "log i/o error: {err}"),
            Self::HeaderMismatch { found } => write!(
                f,
                "unexpected log header: expected '{LOG_HEADER}', found '{found}'"
            ),
            Self::MalformedRow { line, reason } => {
                write!(f, "malformed log row at line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Append-only CSV log of committed arrows.
///
/// The file is created with [`LOG_HEADER`] on first open. Rows are only ever
/// appended; one call to [`LogStore::append`] writes a whole volley with a
/// single `write_all`, so callers sharing a store behind a lock never see
/// volleys interleave.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    /// Open (or create) the log at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let existing = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        if existing.is_empty() {
            fs::write(&path, format!("{LOG_HEADER}\n"))?;
            tracing::info!(path = %path.display(), "created shot log");
        } else {
            let header = existing.lines().next().unwrap_or_default();
            if header.trim_end() != LOG_HEADER {
                return Err(StoreError::HeaderMismatch {
                    found: header.to_string(),
                });
            }
            // A hand-edited file may have lost its final newline.
            if !existing.ends_with('\n') {
                OpenOptions::new().append(true).open(&path)?.write_all(b"\n")?;
            }
            tracing::debug!(path = %path.display(), "opened shot log");
        }

        Ok(Self { path })
    }

    /// Attach to a log that must already exist, without creating or repairing
    /// anything. For readers; the header is checked by [`LogStore::read_all`].
    pub fn existing(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.is_file() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no shot log at '{}'", path.display()),
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, records: &[VolleyRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = String::with_capacity(records.len() * 64);
        for record in records {
            buf.push_str(&format_row(record));
            buf.push('\n');
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(buf.as_bytes())?;
        file.sync_data()?;

        tracing::info!(
            path = %self.path.display(),
            rows = records.len(),
            "appended volley to shot log"
        );
        Ok(())
    }

    /// Every record in the log, in file order.
    pub fn read_all(&self) -> Result<Vec<VolleyRecord>, StoreError> {
        let contents = fs::read_to_string(&self.path)?;
        let mut lines = contents.lines().enumerate();

        match lines.next() {
            Some((_, header)) if header.trim_end() == LOG_HEADER => {}
            Some((_, header)) => {
                return Err(StoreError::HeaderMismatch {
                    found: header.to_string(),
                })
            }
            None => return Ok(Vec::new()),
        }

        let mut records = Vec::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let record = parse_row(line.trim_end()).map_err(|reason| StoreError::MalformedRow {
                line: idx + 1,
                reason,
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl RecordSink for LogStore {
    type Error = StoreError;

    fn append(&mut self, records: &[VolleyRecord]) -> Result<(), StoreError> {
        LogStore::append(self, records)
    }
}

/// Timestamps carry microseconds unless they are zero.
fn format_timestamp(ts: &NaiveDateTime) -> String {
    let micros = ts.nanosecond() / 1_000;
    if micros == 0 {
        ts.format(TIMESTAMP_FORMAT).to_string()
    } else {
        format!("{}.{:06}", ts.format(TIMESTAMP_FORMAT), micros)
    }
}

/// Shortest text that reads back to the same value; integral values keep a
/// trailing `.0`.
fn format_coord(v: f64) -> String {
    format!("{v:?}")
}

pub(crate) fn format_row(record: &VolleyRecord) -> String {
    format!(
        "{},{},{},{},{},{},{},{}",
        format_timestamp(&record.timestamp),
        record.session_id,
        record.volley_number,
        record.arrow_index,
        format_coord(record.x),
        format_coord(record.y),
        record.score,
        record.distance,
    )
}

pub(crate) fn parse_row(line: &str) -> Result<VolleyRecord, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != COLUMNS {
        return Err(format!("expected {COLUMNS} columns, got {}", fields.len()));
    }

    let timestamp = NaiveDateTime::parse_from_str(fields[0], TIMESTAMP_PARSE_FORMAT)
        .map_err(|e| format!("bad datetime '{}': {e}", fields[0]))?;
    let volley_number = fields[2]
        .parse::<u32>()
        .map_err(|e| format!("bad volley '{}': {e}", fields[2]))?;
    let arrow_index = fields[3]
        .parse::<u32>()
        .map_err(|e| format!("bad freccia '{}': {e}", fields[3]))?;
    let x = fields[4]
        .parse::<f64>()
        .map_err(|e| format!("bad x '{}': {e}", fields[4]))?;
    let y = fields[5]
        .parse::<f64>()
        .map_err(|e| format!("bad y '{}': {e}", fields[5]))?;
    let score = fields[6]
        .parse::<u8>()
        .map_err(|e| format!("bad punteggio '{}': {e}", fields[6]))?;
    let distance = fields[7]
        .parse::<Distance>()
        .map_err(|e| format!("bad distanza: {e}"))?;

    Ok(VolleyRecord {
        timestamp,
        session_id: SessionId::new(fields[1]),
        volley_number,
        arrow_index,
        x,
        y,
        score,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(x: f64, y: f64, micros: u32) -> VolleyRecord {
        VolleyRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_micro_opt(14, 3, 22, micros)
                .unwrap(),
            session_id: SessionId::new("2024-05-01_14-00-00"),
            volley_number: 2,
            arrow_index: 3,
            x,
            y,
            score: quiver_core::score(x, y),
            distance: Distance::new(30),
        }
    }

    #[test]
    fn row_layout_matches_header_order() {
        assert_eq!(
            format_row(&record(5.0, -7.2, 123_456)),
            "2024-05-01T14:03:22.123456,2024-05-01_14-00-00,2,3,5.0,-7.2,2,30"
        );
    }

    #[test]
    fn whole_seconds_omit_the_fraction() {
        assert_eq!(
            format_row(&record(0.0, 0.0, 0)),
            "2024-05-01T14:03:22,2024-05-01_14-00-00,2,3,0.0,0.0,10,30"
        );
    }

    #[test]
    fn parse_row_reads_back_what_format_row_wrote() {
        let original = record(-3.3, 0.1, 42);
        let parsed = parse_row(&format_row(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_row_names_the_bad_column() {
        let err = parse_row("2024-05-01T14:03:22,s,1,1,abc,0.0,10,18").unwrap_err();
        assert!(err.contains("bad x"), "{err}");

        let err = parse_row("2024-05-01T14:03:22,s,1,1,0.0").unwrap_err();
        assert!(err.contains("expected 8 columns"), "{err}");
    }
}
