use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

pub type TrackId = i64;
pub type FrameNumber = u32;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Came straight from the detector output
    Observed,
    /// Synthesized by interpolation across a frame gap
    Imputed,
}

/// Plate reading attached to a row. `None` is the explicit "unknown" marker,
/// distinct from an empty plate string or a zero score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognition {
    pub plate_box_score: Option<f64>,
    pub plate_text: Option<String>,
    pub plate_text_score: Option<f64>,
}

impl Recognition {
    #[inline]
    pub fn unknown() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.plate_box_score.is_none() && self.plate_text.is_none() && self.plate_text_score.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRow {
    pub frame_number: FrameNumber,
    pub track_id: TrackId,
    pub vehicle_box: BBox<Ltrb>,
    pub plate_box: BBox<Ltrb>,
    pub recognition: Recognition,
    pub origin: Origin,
}

impl DetectionRow {
    pub fn observed(
        track_id: TrackId,
        frame_number: FrameNumber,
        vehicle_box: BBox<Ltrb>,
        plate_box: BBox<Ltrb>,
        recognition: Recognition,
    ) -> Self {
        Self {
            frame_number,
            track_id,
            vehicle_box,
            plate_box,
            recognition,
            origin: Origin::Observed,
        }
    }

    #[inline(always)]
    pub fn key(&self) -> (TrackId, FrameNumber) {
        (self.track_id, self.frame_number)
    }

    #[inline(always)]
    pub fn is_imputed(&self) -> bool {
        self.origin == Origin::Imputed
    }
}
