//! Scoring and volley bookkeeping for the quiver archery log.
//!
//! Everything in this crate is pure: landing points come in already mapped to
//! target space, records go out as plain values. Writing them anywhere is the
//! caller's job (see the `quiver-host` store).

pub mod distance;
pub mod error;
pub mod record;
pub mod scoring;
pub mod session;
pub mod volley;

use serde::{Deserialize, Serialize};

pub use distance::{Distance, DistanceError, DistancePreset};
pub use error::{CommitError, VolleyError};
pub use record::{Clock, FixedClock, SessionId, SystemClock, VolleyRecord};
pub use scoring::{score, MAX_SCORE, OUTER_RADIUS};
pub use session::ShootingSession;
pub use volley::{RecordSink, VolleySession, VolleyState};

/// One arrow landing point in target space.
///
/// The origin is the centre of the target and radius 10 is the outer edge of
/// the last scoring ring. Shots are immutable once recorded, so the score is
/// always recomputed from the coordinates rather than stored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub x: f64,
    pub y: f64,
}

impl Shot {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn score(&self) -> u8 {
        score(self.x, self.y)
    }

    /// Distance from the centre of the target.
    pub fn radius(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
