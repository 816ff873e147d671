use std::fmt;

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::Distance;

/// `strftime` layout of a session id, e.g. `2024-05-01_14-03-22`.
pub const SESSION_ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Identifier shared by every record of one shooting session.
///
/// Derived from the local wall clock when the session starts. Sessions opened
/// within the same second by different archers get a numeric suffix instead
/// (see [`SessionId::with_suffix`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_time(time: NaiveDateTime) -> Self {
        Self(time.format(SESSION_ID_FORMAT).to_string())
    }

    /// `base_n`, e.g. `2024-05-01_14-03-22_2` for the second session opened
    /// in that second.
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}_{n}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the timestamps written into records and session ids.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time, truncated to the microseconds the log can hold.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(6)
    }
}

/// Always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// One persisted row: a single arrow of a committed volley.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolleyRecord {
    /// When the volley was committed. Shared by all arrows of the volley.
    pub timestamp: NaiveDateTime,
    pub session_id: SessionId,
    /// 1-based volley counter within the session.
    pub volley_number: u32,
    /// 1-based position of the arrow within its volley.
    pub arrow_index: u32,
    pub x: f64,
    pub y: f64,
    pub score: u8,
    pub distance: Distance,
}
