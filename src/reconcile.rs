use std::collections::BTreeMap;

use crate::bbox::{BBox, Ltrb};
use crate::detection::{DetectionRow, FrameNumber, Origin, Recognition, TrackId};

/// Output slot produced by the interpolation walk.
#[derive(Debug, Clone, Copy)]
pub enum Slot<'a> {
    Observed(&'a DetectionRow),
    Imputed {
        track_id: TrackId,
        frame_number: FrameNumber,
        vehicle_box: BBox<Ltrb>,
        plate_box: BBox<Ltrb>,
    },
}

impl<'a> Slot<'a> {
    #[inline]
    pub fn origin(&self) -> Origin {
        match self {
            Slot::Observed(_) => Origin::Observed,
            Slot::Imputed { .. } => Origin::Imputed,
        }
    }
}

/// Builds the output row for a slot.
///
/// Observed slots keep their own reading verbatim, including any unknown
/// fields. Imputed slots always get an unknown reading: plate text is not a
/// continuous quantity, so a neighbour's text is never carried into a gap.
pub fn reconcile(slot: Slot<'_>) -> DetectionRow {
    match slot {
        Slot::Observed(row) => DetectionRow {
            frame_number: row.frame_number,
            track_id: row.track_id,
            vehicle_box: row.vehicle_box,
            plate_box: row.plate_box,
            recognition: row.recognition.clone(),
            origin: Origin::Observed,
        },
        Slot::Imputed {
            track_id,
            frame_number,
            vehicle_box,
            plate_box,
        } => DetectionRow {
            frame_number,
            track_id,
            vehicle_box,
            plate_box,
            recognition: Recognition::unknown(),
            origin: Origin::Imputed,
        },
    }
}

#[inline]
fn is_better(score: f64, frame: FrameNumber, best: &DetectionRow, best_score: f64) -> bool {
    score > best_score || (score == best_score && frame < best.frame_number)
}

/// Representative plate reading of a track: highest `plate_text_score`,
/// lowest frame on ties. Rows with an unknown score are skipped.
pub fn best_detection(rows: &[DetectionRow], track_id: TrackId) -> Option<&DetectionRow> {
    best_detections(rows.iter().filter(|r| r.track_id == track_id))
        .remove(&track_id)
}

/// [`best_detection`] for every track at once.
pub fn best_detections<'a, I>(rows: I) -> BTreeMap<TrackId, &'a DetectionRow>
where
    I: IntoIterator<Item = &'a DetectionRow>,
{
    let mut best: BTreeMap<TrackId, (&'a DetectionRow, f64)> = BTreeMap::new();

    for row in rows {
        let score = match row.recognition.plate_text_score {
            Some(score) if !score.is_nan() => score,
            _ => continue,
        };

        best.entry(row.track_id)
            .and_modify(|(curr, curr_score)| {
                if is_better(score, row.frame_number, *curr, *curr_score) {
                    *curr = row;
                    *curr_score = score;
                }
            })
            .or_insert((row, score));
    }

    best.into_iter().map(|(id, (row, _))| (id, row)).collect()
}
