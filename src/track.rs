use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::warn;

use crate::detection::{DetectionRow, FrameNumber, TrackId};

/// Observed rows of one vehicle, strictly ascending by frame.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: TrackId,
    rows: Vec<DetectionRow>,
}

impl Track {
    #[inline]
    pub fn rows(&self) -> &[DetectionRow] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn first_frame(&self) -> Option<FrameNumber> {
        self.rows.first().map(|r| r.frame_number)
    }

    #[inline]
    pub fn last_frame(&self) -> Option<FrameNumber> {
        self.rows.last().map(|r| r.frame_number)
    }

    /// Closed `[first, last]` frame interval.
    #[inline]
    pub fn lifespan(&self) -> Option<(FrameNumber, FrameNumber)> {
        Some((self.first_frame()?, self.last_frame()?))
    }

    /// Number of frames in the lifespan, observed or not.
    pub fn span_len(&self) -> usize {
        self.lifespan()
            .map(|(first, last)| (last - first) as usize + 1)
            .unwrap_or(0)
    }
}

/// Second row seen for an already occupied `(track_id, frame_number)` slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateFrame {
    pub track_id: TrackId,
    pub frame_number: FrameNumber,
    pub dropped: DetectionRow,
}

#[derive(Debug, Default)]
pub struct Grouping {
    pub tracks: BTreeMap<TrackId, Track>,
    pub duplicates: Vec<DuplicateFrame>,
}

/// Splits rows into tracks. Input order does not matter except for
/// duplicates: the first row seen for a `(track_id, frame_number)` wins and
/// later ones are reported in `duplicates`.
pub fn group_tracks<I>(rows: I) -> Grouping
where
    I: IntoIterator<Item = DetectionRow>,
{
    let mut slots: BTreeMap<TrackId, BTreeMap<FrameNumber, DetectionRow>> = BTreeMap::new();
    let mut duplicates = Vec::new();

    for row in rows {
        let frames = slots.entry(row.track_id).or_default();

        match frames.entry(row.frame_number) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(_) => {
                warn!(
                    "track {} has more than one row for frame {}, keeping the first",
                    row.track_id, row.frame_number
                );

                duplicates.push(DuplicateFrame {
                    track_id: row.track_id,
                    frame_number: row.frame_number,
                    dropped: row,
                });
            }
        }
    }

    let tracks = slots
        .into_iter()
        .map(|(track_id, frames)| {
            let track = Track {
                track_id,
                rows: frames.into_values().collect(),
            };

            (track_id, track)
        })
        .collect();

    Grouping { tracks, duplicates }
}
