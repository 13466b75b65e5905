pub mod bbox;
pub mod detection;
pub mod error;
pub mod interpolate;
pub mod math;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod track;

pub use detection::{DetectionRow, FrameNumber, Origin, Recognition, TrackId};
pub use pipeline::{Config, Interpolator, Reconstruction, Report};
pub use record::DetectionRecord;
pub use track::Track;

/// Fills the gaps of every track in an already parsed batch.
///
/// Rows come back grouped by ascending track id and frame-ascending inside
/// each track. A repeated `(track_id, frame_number)` keeps the first row.
pub fn fill_gaps<I>(rows: I) -> Vec<DetectionRow>
where
    I: IntoIterator<Item = DetectionRow>,
{
    track::group_tracks(rows)
        .tracks
        .values()
        .flat_map(interpolate::interpolate_track)
        .collect()
}
