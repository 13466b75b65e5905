use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use thiserror::Error;

use crate::math;

pub trait BBoxFormat: fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BBox<F: BBoxFormat>([f64; 4], PhantomData<F>);

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f64; 4] {
        &self.0
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(x1: f64, x2: f64, x3: f64, x4: f64) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline(always)]
    pub fn width(&self) -> f64 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f64 {
        self.0[3]
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f64, x2: f64, x3: f64, x4: f64) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> f64 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f64 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f64 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f64 {
        self.0[3]
    }

    /// Finite corners with `x1 < x2` and `y1 < y2`.
    pub fn is_valid(&self) -> bool {
        let ltwh = self.as_ltwh();

        self.0.iter().all(|v| v.is_finite()) && ltwh.width() > 0.0 && ltwh.height() > 0.0
    }

    pub fn contains(&self, other: &BBox<Ltrb>) -> bool {
        self.left() <= other.left()
            && self.top() <= other.top()
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    /// Each corner coordinate interpolated independently, `t = 0` gives `self`.
    #[inline]
    pub fn lerp(&self, other: &BBox<Ltrb>, t: f64) -> BBox<Ltrb> {
        BBox(math::lerp4(&self.0, &other.0, t), Default::default())
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1]],
            Default::default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseBBoxError {
    #[error("expected 4 coordinates, got {0}")]
    Count(usize),

    #[error("bad coordinate {0:?}")]
    Number(String),
}

/// Parses `"[x1 y1 x2 y2]"`, with or without brackets, separated by
/// whitespace and/or commas.
impl FromStr for BBox<Ltrb> {
    type Err = ParseBBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')']);

        let mut coords = [0.0f64; 4];
        let mut count = 0;

        for token in inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value: f64 = token
                .parse()
                .map_err(|_| ParseBBoxError::Number(token.to_string()))?;

            if !value.is_finite() {
                return Err(ParseBBoxError::Number(token.to_string()));
            }

            if count < 4 {
                coords[count] = value;
            }
            count += 1;
        }

        if count != 4 {
            return Err(ParseBBoxError::Count(count));
        }

        Ok(BBox(coords, Default::default()))
    }
}

impl fmt::Display for BBox<Ltrb> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {} {}]", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}
