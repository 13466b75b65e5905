use std::io::Cursor;

use trackfill::bbox::BBox;
use trackfill::reconcile::best_detections;
use trackfill::store::{DetectionSink, JsonLinesSink, JsonLinesSource, MemoryStore};
use trackfill::{fill_gaps, DetectionRecord, DetectionRow, Interpolator, Origin, Recognition};

const INPUT: &str = r#"{"frame_nmr": "0", "car_id": "3.0", "car_bbox": "[0 0 100 50]", "license_plate_bbox": "[40 30 60 40]", "license_plate_bbox_score": "0.91", "license_number": "AB12CDE", "license_number_score": "0.42"}
{"frame_nmr": "4", "car_id": "3.0", "car_bbox": "[40 0 140 50]", "license_plate_bbox": "[80 30 100 40]", "license_plate_bbox_score": "0.88", "license_number": "AB12CDE", "license_number_score": "0.77"}
{"frame_nmr": "2", "car_id": "5.0", "car_bbox": "[500 100 600 180]", "license_plate_bbox": "[530 150 570 165]"}
{"frame_nmr": "3", "car_id": "5.0", "car_bbox": "[502 100 602 180]", "license_plate_bbox": "[532 150 572 165]", "license_plate_bbox_score": "0.5", "license_number": "XY99ZZZ", "license_number_score": "0.77"}
{"frame_nmr": "6", "car_id": "5.0", "car_bbox": "[508 100 608 180]", "license_plate_bbox": "[538 150 578 165]", "license_plate_bbox_score": "0.6", "license_number": "XY99ZZZ", "license_number_score": "0.77"}
{"frame_nmr": "oops", "car_id": "5.0", "car_bbox": "[0 0 1 1]", "license_plate_bbox": "[0 0 1 1]"}
{"frame_nmr": "9", "car_id": "8", "car_bbox": "[0 0 10]", "license_plate_bbox": "[0 0 1 1]"}
"#;

fn rows_from(output: &str) -> Vec<DetectionRow> {
    output
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let record: DetectionRecord = serde_json::from_str(line).unwrap();
            let origin = record.origin.unwrap();
            let mut row = record.into_row(i + 1).unwrap();
            row.origin = origin;
            row
        })
        .collect()
}

#[test]
fn json_lines_end_to_end() {
    let mut source = JsonLinesSource::new(Cursor::new(INPUT));
    let mut sink = JsonLinesSink::new(Vec::new());

    let report = Interpolator::default().run(&mut source, &mut sink).unwrap();

    assert_eq!(report.input_rows, 7);
    assert_eq!(report.malformed, 2);
    assert_eq!(report.tracks, 2);
    assert_eq!(report.observed, 5);
    assert_eq!(report.imputed, 5);

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let rows = rows_from(&output);

    let keys: Vec<_> = rows.iter().map(|r| r.key()).collect();
    assert_eq!(
        keys,
        vec![(3, 0), (3, 1), (3, 2), (3, 3), (3, 4), (5, 2), (5, 3), (5, 4), (5, 5), (5, 6)]
    );

    // frame 2 of track 3 sits halfway through the 0..4 gap
    assert_eq!(rows[2].origin, Origin::Imputed);
    assert_eq!(rows[2].vehicle_box, BBox::ltrb(20.0, 0.0, 120.0, 50.0));
    assert_eq!(rows[2].plate_box, BBox::ltrb(60.0, 30.0, 80.0, 40.0));
    assert!(rows[2].recognition.is_unknown());

    // observed row without any reading stays unknown, not "0"
    assert_eq!(rows[5].origin, Origin::Observed);
    assert!(rows[5].recognition.is_unknown());

    assert_eq!(rows[4].recognition.plate_text.as_deref(), Some("AB12CDE"));
    assert_eq!(rows[4].recognition.plate_text_score, Some(0.77));

    let best = best_detections(&rows);
    assert_eq!(best[&3].frame_number, 4);
    assert_eq!(best[&5].frame_number, 3);
}

#[test]
fn odd_recognition_columns_keep_the_row() {
    let input = r#"{"frame_nmr": 1, "car_id": 4, "car_bbox": "[0 0 10 10]", "license_plate_bbox": "[2 6 8 9]", "license_number": "AB12CDE", "license_number_score": true}
{"frame_nmr": 3, "car_id": 4, "car_bbox": "[4 0 14 10]", "license_plate_bbox": "[6 6 12 9]", "license_number": 123, "license_number_score": "0.6"}
"#;

    let mut sink = JsonLinesSink::new(Vec::new());
    let report = Interpolator::default()
        .run(&mut JsonLinesSource::new(Cursor::new(input)), &mut sink)
        .unwrap();

    assert_eq!(report.malformed, 0);
    assert_eq!(report.observed, 2);
    assert_eq!(report.imputed, 1);

    let rows = rows_from(&String::from_utf8(sink.into_inner()).unwrap());
    assert_eq!(rows[0].recognition.plate_text.as_deref(), Some("AB12CDE"));
    assert_eq!(rows[0].recognition.plate_text_score, None);
    assert_eq!(rows[2].recognition.plate_text, None);
    assert_eq!(rows[2].recognition.plate_text_score, Some(0.6));
}

#[test]
fn rerun_on_own_output_is_stable() {
    let mut first = JsonLinesSink::new(Vec::new());
    Interpolator::default()
        .run(&mut JsonLinesSource::new(Cursor::new(INPUT)), &mut first)
        .unwrap();
    let first = String::from_utf8(first.into_inner()).unwrap();

    let mut store = MemoryStore::new();
    let rows = rows_from(&first);
    store.upsert_all(&rows).unwrap();
    let snapshot: Vec<_> = store.iter().cloned().collect();

    store.upsert_all(&rows).unwrap();
    let again: Vec<_> = store.iter().cloned().collect();

    assert_eq!(snapshot, again);
    assert_eq!(store.len(), 10);
}

#[test]
fn fill_gaps_covers_every_frame() {
    let row = |track, frame, x: f64| {
        DetectionRow::observed(
            track,
            frame,
            BBox::ltrb(x, 0.0, x + 10.0, 10.0),
            BBox::ltrb(x + 2.0, 6.0, x + 8.0, 9.0),
            Recognition::unknown(),
        )
    };

    let input = vec![row(1, 10, 0.0), row(2, 3, 0.0), row(1, 17, 7.0), row(1, 12, 2.0)];
    let out = fill_gaps(input.clone());

    let track1: Vec<_> = out.iter().filter(|r| r.track_id == 1).collect();
    assert_eq!(track1.len(), 17 - 10 + 1);
    for (expected, r) in (10..=17).zip(&track1) {
        assert_eq!(r.frame_number, expected);
        assert!((r.vehicle_box.left() - (r.frame_number - 10) as f64).abs() < 1e-4);
    }

    for observed in &input {
        assert!(out
            .iter()
            .any(|r| r.origin == Origin::Observed && r == observed));
    }

    assert_eq!(out.iter().filter(|r| r.track_id == 2).count(), 1);
}
