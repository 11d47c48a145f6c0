// THEORY:
// The `LogSink` is where detection counts leave the process. Each camera writes
// one spreadsheet per day, named after the weekday:
//
//     <root>/<Weekday>-camera<N>-detections.xlsx
//     Sheet1:  Timestamp           | Detections
//              2024-03-04 09:00:00 | 3
//
// Key behaviours:
// 1.  **Header on creation**: a missing day file is created with just the header.
// 2.  **Seeding**: when a camera opens a day, the last row of the previous day's
//     file (if any) is copied into the in-memory buffer. It counts as already
//     persisted, so it is never written into the new day's file.
// 3.  **Append**: only buffer rows that are not yet on disk are added. Rows
//     already in the file are read back and kept as they are. The workbook is
//     written to a sibling temp file and renamed over the original, so a failed
//     write leaves the previous log intact. Failures propagate; there is no retry.
// 4.  **Rollover**: a row dated on a different day than the camera's open file
//     reopens the sink for that day (which seeds from the file just finished).
//
// Weekday naming means the same file is reused a week later. That aliasing is
// kept as-is; appends simply continue below whatever the file already holds.

use crate::core_modules::cycle::{CameraId, LogRow};
use crate::error::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use workbook::read_rows;

pub const SHEET_NAME: &str = "Sheet1";
pub const HEADERS: [&str; 2] = ["Timestamp", "Detections"];

/// `<Weekday>-camera<N>-detections.xlsx`
pub fn file_name(camera: CameraId, day: NaiveDate) -> String {
    format!("{}-{}-detections.xlsx", day.format("%A"), camera)
}

/// Creates the day file with a header row unless it already exists.
pub fn ensure_file(root: &Path, camera: CameraId, day: NaiveDate) -> Result<PathBuf> {
    let path = root.join(file_name(camera, day));
    if !path.exists() {
        workbook::write_rows(&path, &[])?;
        info!(path = %path.display(), "created detection log");
    }
    Ok(path)
}

/// The log a camera is currently writing, plus its in-memory rows.
#[derive(Debug)]
struct DailyLogFile {
    day: NaiveDate,
    path: PathBuf,
    buffer: Vec<LogRow>,
    /// How many leading buffer rows are already on disk (in this file or the previous day's).
    persisted: usize,
    seeded: bool,
}

impl DailyLogFile {
    fn create(root: &Path, camera: CameraId, day: NaiveDate) -> Result<Self> {
        Ok(Self {
            day,
            path: ensure_file(root, camera, day)?,
            buffer: Vec::new(),
            persisted: 0,
            seeded: false,
        })
    }

    fn open(root: &Path, camera: CameraId, day: NaiveDate) -> Result<Self> {
        let mut file = Self::create(root, camera, day)?;
        file.seed(root, camera)?;
        Ok(file)
    }

    fn seed(&mut self, root: &Path, camera: CameraId) -> Result<Option<LogRow>> {
        if self.seeded {
            return Ok(None);
        }
        self.seeded = true;

        let Some(previous_day) = self.day.pred_opt() else {
            return Ok(None);
        };
        let previous = root.join(file_name(camera, previous_day));
        if !previous.exists() {
            return Ok(None);
        }
        let last = workbook::read_rows(&previous)?.pop();
        if let Some(row) = &last {
            debug!(%camera, from = %previous.display(), "seeded buffer from previous day");
            self.buffer.insert(0, row.clone());
            self.persisted += 1;
        }
        Ok(last)
    }

    fn flush(&mut self) -> Result<()> {
        let pending = &self.buffer[self.persisted..];
        if pending.is_empty() {
            return Ok(());
        }
        let mut rows = workbook::read_rows(&self.path)?;
        rows.extend_from_slice(pending);
        workbook::write_rows(&self.path, &rows)?;
        self.persisted = self.buffer.len();
        Ok(())
    }
}

/// Per-camera, per-day spreadsheet logs under one root folder.
#[derive(Debug)]
pub struct LogSink {
    root: PathBuf,
    files: HashMap<CameraId, DailyLogFile>,
}

impl LogSink {
    /// Uses `root` as the log folder, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            files: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, camera: CameraId, day: NaiveDate) -> PathBuf {
        self.root.join(file_name(camera, day))
    }

    pub fn ensure_file(&self, camera: CameraId, day: NaiveDate) -> Result<PathBuf> {
        ensure_file(&self.root, camera, day)
    }

    /// Makes `day` the camera's current log: creates the file and seeds the buffer.
    pub fn open(&mut self, camera: CameraId, day: NaiveDate) -> Result<PathBuf> {
        let file = DailyLogFile::open(&self.root, camera, day)?;
        let path = file.path.clone();
        self.files.insert(camera, file);
        Ok(path)
    }

    /// Copies the last row of the previous day's file into the camera's buffer.
    /// Returns the seeded row. Seeding happens at most once per open day.
    pub fn seed_from_previous_day(&mut self, camera: CameraId, day: NaiveDate) -> Result<Option<LogRow>> {
        let file = match self.files.entry(camera) {
            Entry::Occupied(e) if e.get().day == day => e.into_mut(),
            Entry::Occupied(mut e) => {
                e.insert(DailyLogFile::create(&self.root, camera, day)?);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(DailyLogFile::create(&self.root, camera, day)?),
        };
        file.seed(&self.root, camera)
    }

    /// Buffers `row` and writes every unpersisted row to the camera's day file.
    pub fn append(&mut self, camera: CameraId, row: LogRow) -> Result<PathBuf> {
        let day = row.timestamp.date();
        let file = match self.files.entry(camera) {
            Entry::Occupied(e) if e.get().day == day => e.into_mut(),
            Entry::Occupied(mut e) => {
                info!(%camera, %day, "rolling detection log over to a new day");
                e.insert(DailyLogFile::open(&self.root, camera, day)?);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(DailyLogFile::open(&self.root, camera, day)?),
        };
        file.buffer.push(row);
        file.flush()?;
        info!("Saved {}", file.path.display());
        Ok(file.path.clone())
    }

    /// The in-memory rows of the camera's current day, seeded row first.
    pub fn buffered(&self, camera: CameraId) -> &[LogRow] {
        self.files
            .get(&camera)
            .map(|f| f.buffer.as_slice())
            .unwrap_or_default()
    }
}

mod workbook {
    use super::{HEADERS, SHEET_NAME};
    use crate::core_modules::cycle::{LogRow, TIMESTAMP_FORMAT};
    use crate::error::{Error, Result};
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use chrono::NaiveDateTime;
    use rust_xlsxwriter::{Format, Workbook};
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Reads every data row (header excluded) in file order. Blank rows are skipped.
    pub fn read_rows(path: &Path) -> Result<Vec<LogRow>> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let range = workbook.worksheet_range(SHEET_NAME)?;
        let mut rows = Vec::new();
        for (index, cells) in range.rows().enumerate().skip(1) {
            if cells.iter().all(|c| matches!(c, Data::Empty)) {
                continue;
            }
            rows.push(parse_row(path, index + 1, cells)?);
        }
        Ok(rows)
    }

    /// Replaces the file with a header row followed by `rows`.
    pub fn write_rows(path: &Path, rows: &[LogRow]) -> Result<()> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        sheet.set_column_width(0, 20)?;
        for (col, header) in HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_string(r, 0, row.formatted_timestamp())?;
            sheet.write_number(r, 1, row.detection_count as f64)?;
        }

        let staging = staging_path(path);
        workbook.save(&staging)?;
        if let Err(e) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }

    fn staging_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        path.with_file_name(name)
    }

    fn parse_row(path: &Path, row: usize, cells: &[Data]) -> Result<LogRow> {
        let malformed = |reason: String| Error::MalformedRow {
            path: path.to_path_buf(),
            row,
            reason,
        };

        let timestamp = match cells.first() {
            Some(Data::String(s)) => NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
                .map_err(|e| malformed(format!("bad Timestamp {s:?}: {e}")))?,
            Some(Data::DateTimeIso(s)) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map_err(|e| malformed(format!("bad Timestamp {s:?}: {e}")))?,
            other => return Err(malformed(format!("unexpected Timestamp cell {other:?}"))),
        };

        let detection_count = match cells.get(1) {
            Some(Data::Int(n)) if *n >= 0 => *n as u64,
            Some(Data::Float(f)) if *f >= 0.0 && f.fract() == 0.0 => *f as u64,
            Some(Data::String(s)) => s
                .trim()
                .parse()
                .map_err(|e| malformed(format!("bad Detections {s:?}: {e}")))?,
            other => return Err(malformed(format!("unexpected Detections cell {other:?}"))),
        };

        Ok(LogRow {
            timestamp,
            detection_count,
        })
    }
}
