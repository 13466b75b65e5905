use log::debug;

use crate::detection::DetectionRow;
use crate::math;
use crate::reconcile::{reconcile, Slot};
use crate::track::Track;

/// Fills every frame of the track lifespan.
///
/// Observed rows are passed through; each missing frame between two observed
/// rows gets boxes linearly interpolated between them, weighted by the frame
/// position inside the gap.
pub fn interpolate_track(track: &Track) -> Vec<DetectionRow> {
    let mut out = Vec::with_capacity(track.span_len());
    let mut rows = track.rows().iter();

    let mut prev = match rows.next() {
        Some(first) => first,
        None => return out,
    };
    out.push(reconcile(Slot::Observed(prev)));

    for curr in rows {
        debug_assert!(curr.frame_number > prev.frame_number);

        let (from, to) = (prev.frame_number, curr.frame_number);
        if to - from > 1 {
            debug!(
                "track {}: filling {} frames between {} and {}",
                track.track_id,
                to - from - 1,
                from,
                to
            );
        }

        for frame_number in from + 1..to {
            let t: f64 = math::frame_weight(from, to, frame_number);

            out.push(reconcile(Slot::Imputed {
                track_id: track.track_id,
                frame_number,
                vehicle_box: prev.vehicle_box.lerp(&curr.vehicle_box, t),
                plate_box: prev.plate_box.lerp(&curr.plate_box, t),
            }));
        }

        out.push(reconcile(Slot::Observed(curr)));
        prev = curr;
    }

    out
}
