//! Stored shape of a detection row.
//!
//! Column names follow the `detection_results` table written by the detection
//! stage. Numbers may arrive as JSON numbers or as strings and boxes as
//! `"[x1 y1 x2 y2]"` text; everything is turned into typed values here so the
//! interpolation code never sees raw strings.

use log::warn;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::detection::{DetectionRow, FrameNumber, Origin, Recognition, TrackId};
use crate::error::Error;

/// Scalar column that may be stored as a number or as its decimal text.
/// Any other JSON value lands in `Other` so one odd column never fails the
/// whole record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Field {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Field {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Int(v) => Some(*v as f64),
            Field::Float(v) => Some(*v),
            Field::Text(s) => s.trim().parse().ok(),
            Field::Other(_) => None,
        }
    }

    /// Strict integer: `5`, `"5"`.
    fn as_int(&self) -> Option<i64> {
        match self {
            Field::Int(v) => Some(*v),
            Field::Text(s) => s.trim().parse().ok(),
            Field::Float(_) | Field::Other(_) => None,
        }
    }

    /// Integer that may have been written through a float, `"3.0"` or `3.0`.
    fn as_integral(&self) -> Option<i64> {
        if let Some(v) = self.as_int() {
            return Some(v);
        }

        let v = self.as_f64()?;
        if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
            Some(v as i64)
        } else {
            None
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BoxField {
    Text(String),
    Coords(Vec<f64>),
    Other(serde_json::Value),
}

impl BoxField {
    fn parse(&self) -> Result<BBox<Ltrb>, String> {
        match self {
            BoxField::Text(s) => s.parse().map_err(|e| format!("{}", e)),
            BoxField::Coords(v) if v.len() == 4 && v.iter().all(|x| x.is_finite()) => {
                Ok(BBox::ltrb(v[0], v[1], v[2], v[3]))
            }
            BoxField::Coords(v) => Err(format!("expected 4 finite coordinates, got {:?}", v)),
            BoxField::Other(v) => Err(format!("expected box text or coordinates, got {}", v)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub frame_nmr: Option<Field>,
    pub car_id: Option<Field>,
    pub car_bbox: Option<BoxField>,
    pub license_plate_bbox: Option<BoxField>,
    pub license_plate_bbox_score: Option<Field>,
    pub license_number: Option<Field>,
    pub license_number_score: Option<Field>,
    /// Written on output so readers can tell imputed rows apart. Ignored on
    /// read: every row coming out of `into_row` is observed, origin is only
    /// ever assigned by interpolation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl DetectionRecord {
    /// Typed key of the record, if both key columns are usable.
    pub fn key(&self) -> Option<(TrackId, FrameNumber)> {
        let track_id = self.car_id.as_ref()?.as_integral()?;
        let frame = self.frame_nmr.as_ref()?.as_int()?;

        Some((track_id, FrameNumber::try_from(frame).ok()?))
    }

    /// Converts the stored record into an observed row. `line` is the 1-based
    /// position of the record in its source and only labels errors.
    pub fn into_row(self, line: usize) -> Result<DetectionRow, Error> {
        let frame_number = match &self.frame_nmr {
            None => return Err(Error::malformed(line, "missing frame_nmr")),
            Some(field) => field
                .as_int()
                .and_then(|v| FrameNumber::try_from(v).ok())
                .ok_or_else(|| Error::malformed(line, format!("bad frame_nmr {:?}", field)))?,
        };

        let track_id = match &self.car_id {
            None => return Err(Error::malformed(line, "missing car_id")),
            Some(field) => field
                .as_integral()
                .ok_or_else(|| Error::malformed(line, format!("bad car_id {:?}", field)))?,
        };

        let vehicle_box = parse_box(line, "car_bbox", self.car_bbox.as_ref())?;
        let plate_box = parse_box(line, "license_plate_bbox", self.license_plate_bbox.as_ref())?;

        if !vehicle_box.contains(&plate_box) {
            warn!(
                "track {} frame {}: plate box {} is outside vehicle box {}",
                track_id, frame_number, plate_box, vehicle_box
            );
        }

        let recognition = Recognition {
            plate_box_score: score(line, "license_plate_bbox_score", &self.license_plate_bbox_score),
            plate_text: text(line, "license_number", &self.license_number),
            plate_text_score: score(line, "license_number_score", &self.license_number_score),
        };

        Ok(DetectionRow::observed(
            track_id,
            frame_number,
            vehicle_box,
            plate_box,
            recognition,
        ))
    }
}

fn parse_box(line: usize, column: &str, field: Option<&BoxField>) -> Result<BBox<Ltrb>, Error> {
    let field = field.ok_or_else(|| Error::malformed(line, format!("missing {}", column)))?;
    let bbox = field
        .parse()
        .map_err(|reason| Error::malformed(line, format!("{}: {}", column, reason)))?;

    if !bbox.is_valid() {
        return Err(Error::malformed(
            line,
            format!("{}: degenerate box {}", column, bbox),
        ));
    }

    Ok(bbox)
}

fn score(line: usize, column: &str, field: &Option<Field>) -> Option<f64> {
    let field = field.as_ref()?;

    match field.as_f64() {
        Some(v) if (0.0..=1.0).contains(&v) => Some(v),
        _ => {
            warn!("line {}: unusable {} {:?}, treated as unknown", line, column, field);
            None
        }
    }
}

fn text(line: usize, column: &str, field: &Option<Field>) -> Option<String> {
    match field.as_ref()? {
        Field::Text(s) => Some(s.clone()),
        other => {
            warn!("line {}: non-text {} {:?}, treated as unknown", line, column, other);
            None
        }
    }
}

impl<'a> From<&'a DetectionRow> for DetectionRecord {
    fn from(row: &'a DetectionRow) -> Self {
        let rec = &row.recognition;

        Self {
            frame_nmr: Some(Field::Int(row.frame_number as i64)),
            car_id: Some(Field::Int(row.track_id)),
            car_bbox: Some(BoxField::Text(row.vehicle_box.to_string())),
            license_plate_bbox: Some(BoxField::Text(row.plate_box.to_string())),
            license_plate_bbox_score: rec.plate_box_score.map(Field::Float),
            license_number: rec.plate_text.clone().map(Field::Text),
            license_number_score: rec.plate_text_score.map(Field::Float),
            origin: Some(row.origin),
        }
    }
}
