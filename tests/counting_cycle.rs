use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use headcount::core_modules::log_sink::read_rows;
use headcount::{
    BoundingBox, CameraId, CountingPipeline, DetectionParams, Detector, FrameSource, LogSink, LoopControl,
    ObjectTracker, Result, SessionConfig, StopReason, TrackerFactory,
};
use image::{GrayImage, Luma, Rgb, RgbImage};
use tempfile::tempdir;

// Frames carry their people as bright 60x60 squares; the detector finds them and
// the tracker follows a square while it stays bright.

const SIDE: u32 = 60;

fn frame_with(people: &[(u32, u32)]) -> RgbImage {
    let mut frame = RgbImage::new(400, 200);
    for &(x, y) in people {
        for dy in 0..SIDE {
            for dx in 0..SIDE {
                frame.put_pixel(x + dx, y + dy, Rgb([255, 255, 255]));
            }
        }
    }
    frame
}

struct SquareDetector;

impl Detector<RgbImage> for SquareDetector {
    fn detect(&mut self, gray: &GrayImage, params: &DetectionParams) -> Result<Vec<BoundingBox>> {
        let mut found = Vec::new();
        for y in (0..gray.height().saturating_sub(SIDE - 1)).step_by(20) {
            for x in (0..gray.width().saturating_sub(SIDE - 1)).step_by(20) {
                let corner = *gray.get_pixel(x, y) == Luma([255]);
                let left_edge = x == 0 || *gray.get_pixel(x - 1, y) != Luma([255]);
                let top_edge = y == 0 || *gray.get_pixel(x, y - 1) != Luma([255]);
                if corner && left_edge && top_edge {
                    found.push(BoundingBox::new(x as i32, y as i32, SIDE as i32, SIDE as i32));
                }
            }
        }
        found.retain(|b| b.width >= params.min_size.0 && b.height >= params.min_size.1);
        Ok(found)
    }
}

struct SquareTracker(BoundingBox);

impl ObjectTracker<RgbImage> for SquareTracker {
    fn update(&mut self, frame: &RgbImage) -> Result<Option<BoundingBox>> {
        let centre = (
            (self.0.x + self.0.width / 2) as u32,
            (self.0.y + self.0.height / 2) as u32,
        );
        Ok((*frame.get_pixel(centre.0, centre.1) == Rgb([255, 255, 255])).then_some(self.0))
    }
}

struct SquareTrackers;

impl TrackerFactory<RgbImage> for SquareTrackers {
    type Tracker = SquareTracker;

    fn create(&mut self, _frame: &RgbImage, bbox: BoundingBox) -> Result<SquareTracker> {
        Ok(SquareTracker(bbox))
    }
}

/// Shows each scheduled group of people on its frame only, an empty scene otherwise.
struct Scene {
    appearances: Vec<(usize, Vec<(u32, u32)>)>,
    frame: usize,
    frames: usize,
}

impl FrameSource for Scene {
    type Frame = RgbImage;

    fn read(&mut self) -> Result<Option<RgbImage>> {
        if self.frame == self.frames {
            return Ok(None);
        }
        let people = self
            .appearances
            .iter()
            .find(|(at, _)| *at == self.frame)
            .map(|(_, people)| people.as_slice())
            .unwrap_or_default();
        self.frame += 1;
        Ok(Some(frame_with(people)))
    }
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(23, 50, 0)
        .unwrap()
}

fn run_scene(root: &std::path::Path, people: Vec<(u32, u32)>, seconds: usize, from: NaiveDateTime) -> StopReason {
    run_schedule(root, vec![(0, people)], seconds, from)
}

/// One frame per second starting at `from`.
fn run_schedule(
    root: &std::path::Path,
    appearances: Vec<(usize, Vec<(u32, u32)>)>,
    frames: usize,
    from: NaiveDateTime,
) -> StopReason {
    let sources = vec![(
        CameraId(1),
        Scene {
            appearances,
            frame: 0,
            frames,
        },
    )];
    let mut pipeline = CountingPipeline::new(
        sources,
        SquareDetector,
        SquareTrackers,
        LogSink::new(root).unwrap(),
        &SessionConfig::default(),
        from,
    )
    .unwrap();

    let mut tick = 0;
    pipeline
        .run(
            || {
                let now = from + TimeDelta::seconds(tick);
                tick += 1;
                now
            },
            |_| Ok(LoopControl::Continue),
        )
        .unwrap()
}

#[test]
fn three_people_in_the_first_frame_are_logged_once() {
    let dir = tempdir().unwrap();
    let reason = run_scene(dir.path(), vec![(0, 0), (120, 0), (240, 100)], 301, start());
    assert!(matches!(reason, StopReason::EndOfStream(CameraId(1))));

    let rows = read_rows(&dir.path().join("Monday-camera1-detections.xlsx")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, start());
    assert_eq!(rows[0].detection_count, 3);
}

#[test]
fn an_empty_scene_never_writes_rows() {
    let dir = tempdir().unwrap();
    run_scene(dir.path(), Vec::new(), 1000, start());

    let rows = read_rows(&dir.path().join("Monday-camera1-detections.xlsx")).unwrap();
    assert!(rows.is_empty());
    assert!(!dir.path().join("Tuesday-camera1-detections.xlsx").exists());
}

#[test]
fn next_day_starts_a_new_file_seeded_from_the_last_row() {
    let dir = tempdir().unwrap();
    run_scene(dir.path(), vec![(0, 0), (120, 0)], 301, start());

    let tuesday = start() + TimeDelta::minutes(20);
    run_scene(dir.path(), vec![(0, 0)], 301, tuesday);

    let monday_rows = read_rows(&dir.path().join("Monday-camera1-detections.xlsx")).unwrap();
    assert_eq!(monday_rows.len(), 1);
    assert_eq!(monday_rows[0].detection_count, 2);

    let tuesday_rows = read_rows(&dir.path().join("Tuesday-camera1-detections.xlsx")).unwrap();
    assert_eq!(tuesday_rows.len(), 1);
    assert_eq!(tuesday_rows[0].timestamp, tuesday);
    assert_eq!(tuesday_rows[0].detection_count, 1);
}

#[test]
fn a_cycle_starting_after_midnight_rolls_over_within_one_run() {
    let dir = tempdir().unwrap();
    let before_midnight = start() + TimeDelta::minutes(8);
    // The first cycle closes at 00:03:00 on the 301st frame; the second covers 00:03:00 to 00:08:00.
    let reason = run_schedule(
        dir.path(),
        vec![(0, vec![(0, 0), (120, 0)]), (301, vec![(240, 100)])],
        601,
        before_midnight,
    );
    assert!(matches!(reason, StopReason::EndOfStream(CameraId(1))));

    let monday_rows = read_rows(&dir.path().join("Monday-camera1-detections.xlsx")).unwrap();
    assert_eq!(monday_rows.len(), 1);
    assert_eq!(monday_rows[0].timestamp, before_midnight);
    assert_eq!(monday_rows[0].detection_count, 2);

    let tuesday_rows = read_rows(&dir.path().join("Tuesday-camera1-detections.xlsx")).unwrap();
    assert_eq!(tuesday_rows.len(), 1);
    assert_eq!(
        tuesday_rows[0].timestamp,
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(0, 3, 0).unwrap()
    );
    assert_eq!(tuesday_rows[0].detection_count, 1);
}
