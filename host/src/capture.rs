//! Turning raw input into target-space shots.
//!
//! The scoring engine only understands target units (radius 10 = outer
//! ring). Everything that arrives in another space, such as canvas pixels or
//! typed text, is converted here.

use std::fmt;

use quiver_core::{Shot, OUTER_RADIUS};

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    NonFinite,
    OutsideCanvas { left: f64, top: f64, size: f64 },
    Unparseable(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite => write!(f, "coordinates must be finite numbers"),
            Self::OutsideCanvas { left, top, size } => write!(
                f,
                "point ({left}, {top}) is outside the {size}x{size} canvas"
            ),
            Self::Unparseable(raw) => {
                write!(f, "expected two numbers like '1.5 -3', got '{raw}'")
            }
        }
    }
}

impl std::error::Error for CaptureError {}

/// Square drawing canvas with the target centred on it, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    pub size_px: f64,
    pub px_per_unit: f64,
}

impl Default for CanvasGeometry {
    /// 500 px canvas, 25 px per target unit: the outer ring touches the edges.
    fn default() -> Self {
        Self::for_size(500.0)
    }
}

impl CanvasGeometry {
    /// Geometry whose outer ring exactly fits a `size_px` canvas.
    pub fn for_size(size_px: f64) -> Self {
        Self {
            size_px,
            px_per_unit: size_px / (2.0 * f64::from(OUTER_RADIUS)),
        }
    }

    pub fn centre(&self) -> f64 {
        self.size_px / 2.0
    }

    /// Map a marker position on the canvas to a shot. Pixel offsets are
    /// rounded to a tenth of a pixel before scaling.
    pub fn to_shot(&self, left: f64, top: f64) -> Result<Shot, CaptureError> {
        if !left.is_finite() || !top.is_finite() {
            return Err(CaptureError::NonFinite);
        }
        if !(0.0..=self.size_px).contains(&left) || !(0.0..=self.size_px).contains(&top) {
            return Err(CaptureError::OutsideCanvas {
                left,
                top,
                size: self.size_px,
            });
        }

        let c = self.centre();
        Ok(Shot::new(
            round_tenth(left - c) / self.px_per_unit,
            round_tenth(c - top) / self.px_per_unit,
        ))
    }

    pub fn to_canvas(&self, shot: &Shot) -> (f64, f64) {
        let c = self.centre();
        (c + shot.x * self.px_per_unit, c - shot.y * self.px_per_unit)
    }
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round_ties_even() / 10.0
}

/// Shot typed directly in target units.
pub fn target_shot(x: f64, y: f64) -> Result<Shot, CaptureError> {
    let shot = Shot::new(x, y);
    if shot.is_finite() {
        Ok(shot)
    } else {
        Err(CaptureError::NonFinite)
    }
}

/// Parse `"x y"`, `"x,y"` or `"x, y"`.
pub fn parse_pair(line: &str) -> Result<(f64, f64), CaptureError> {
    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();

    match parts.as_slice() {
        [x, y] => {
            let x = x.parse::<f64>();
            let y = y.parse::<f64>();
            match (x, y) {
                (Ok(x), Ok(y)) => Ok((x, y)),
                _ => Err(CaptureError::Unparseable(line.trim().to_string())),
            }
        }
        _ => Err(CaptureError::Unparseable(line.trim().to_string())),
    }
}
