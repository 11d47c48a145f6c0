// THEORY:
// A `DetectionCycle` is one flush window of a camera: it opens at a wall-clock
// instant, collects the identifiers observed while it is open, and is closed by a
// flush. Closing a cycle that saw anyone yields a `LogRow`; closing an idle one
// yields nothing, so quiet windows never show up as zero rows in the log.

use chrono::{NaiveDateTime, TimeDelta};
use std::collections::BTreeSet;
use std::fmt;

/// Layout of the `Timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifies one camera; rendered as `camera<N>` in log file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub u32);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera{}", self.0)
    }
}

/// One line of a detection log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    /// Wall-clock start of the cycle the count belongs to.
    pub timestamp: NaiveDateTime,
    pub detection_count: u64,
}

impl LogRow {
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// The identifiers seen by one camera since its last flush.
#[derive(Debug, Clone)]
pub struct DetectionCycle {
    pub camera: CameraId,
    pub started_at: NaiveDateTime,
    seen: BTreeSet<u64>,
}

impl DetectionCycle {
    pub fn new(camera: CameraId, started_at: NaiveDateTime) -> Self {
        Self {
            camera,
            started_at,
            seen: BTreeSet::new(),
        }
    }

    pub fn observe(&mut self, id: u64) {
        self.seen.insert(id);
    }

    pub fn seen(&self) -> &BTreeSet<u64> {
        &self.seen
    }

    pub fn elapsed(&self, now: NaiveDateTime) -> TimeDelta {
        now - self.started_at
    }

    /// Ends the cycle at `now` and opens the next one. Returns a row only if
    /// anything was seen.
    pub fn close(&mut self, now: NaiveDateTime) -> Option<LogRow> {
        let row = (!self.seen.is_empty()).then(|| LogRow {
            timestamp: self.started_at,
            detection_count: self.seen.len() as u64,
        });
        self.seen.clear();
        self.started_at = now;
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn closing_reports_cycle_start_and_distinct_ids() {
        let mut cycle = DetectionCycle::new(CameraId(1), at(9, 0, 0));
        cycle.observe(1);
        cycle.observe(2);
        cycle.observe(2);

        let row = cycle.close(at(9, 5, 0)).expect("Expected a row.");
        assert_eq!(row.timestamp, at(9, 0, 0));
        assert_eq!(row.detection_count, 2);
        assert_eq!(row.formatted_timestamp(), "2024-03-04 09:00:00");
        assert!(cycle.seen().is_empty());
        assert_eq!(cycle.started_at, at(9, 5, 0));
    }

    #[test]
    fn idle_cycle_closes_without_a_row() {
        let mut cycle = DetectionCycle::new(CameraId(2), at(9, 0, 0));
        assert!(cycle.close(at(9, 5, 0)).is_none());
        assert_eq!(cycle.started_at, at(9, 5, 0));
    }

    #[test]
    fn camera_id_renders_for_file_names() {
        assert_eq!(CameraId(2).to_string(), "camera2");
    }
}
