use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Shooting distance in metres.
///
/// Recorded next to every shot but never used for scoring. Any value can be
/// read back from a log; new sessions pick theirs through a [`DistancePreset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(u16);

impl Distance {
    pub const fn new(metres: u16) -> Self {
        Self(metres)
    }

    pub const fn metres(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Distance {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix('m').unwrap_or(trimmed);
        trimmed
            .parse::<u16>()
            .map(Distance)
            .map_err(|_| DistanceError::Unparseable(s.to_string()))
    }
}

/// Set of distances offered when a session starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistancePreset {
    /// Indoor and outdoor target rounds, 18 to 70 m.
    #[default]
    Standard,
    /// Reduced list shown on the phone layout.
    Mobile,
}

const STANDARD_METRES: [u16; 8] = [18, 20, 25, 30, 40, 50, 60, 70];
const MOBILE_METRES: [u16; 5] = [18, 30, 50, 70, 90];

impl DistancePreset {
    pub fn metres(&self) -> &'static [u16] {
        match self {
            DistancePreset::Standard => &STANDARD_METRES,
            DistancePreset::Mobile => &MOBILE_METRES,
        }
    }

    pub fn distances(&self) -> impl Iterator<Item = Distance> {
        self.metres().iter().copied().map(Distance)
    }

    /// First distance of the preset, the one preselected in a new session.
    pub fn default_distance(&self) -> Distance {
        Distance(self.metres()[0])
    }

    pub fn contains(&self, distance: Distance) -> bool {
        self.metres().contains(&distance.0)
    }

    /// Parse a distance and check it is one this preset offers.
    pub fn distance(&self, s: &str) -> Result<Distance, DistanceError> {
        let distance: Distance = s.parse()?;
        self.check(distance)
    }

    pub fn check(&self, distance: Distance) -> Result<Distance, DistanceError> {
        if self.contains(distance) {
            Ok(distance)
        } else {
            Err(DistanceError::NotOffered {
                distance,
                preset: *self,
            })
        }
    }
}

impl FromStr for DistancePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(DistancePreset::Standard),
            "mobile" => Ok(DistancePreset::Mobile),
            _ => Err(format!(
                "Invalid distance preset: '{}'. Must be 'standard' or 'mobile'",
                s
            )),
        }
    }
}

impl fmt::Display for DistancePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistancePreset::Standard => write!(f, "standard"),
            DistancePreset::Mobile => write!(f, "mobile"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DistanceError {
    Unparseable(String),
    NotOffered {
        distance: Distance,
        preset: DistancePreset,
    },
}

impl fmt::Display for DistanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable(raw) => write!(f, "not a distance in metres: '{raw}'"),
            Self::NotOffered { distance, preset } => {
                let offered: Vec<String> = preset.metres().iter().map(u16::to_string).collect();
                write!(
                    f,
                    "{distance} m is not offered by the {preset} preset ({})",
                    offered.join("/")
                )
            }
        }
    }
}

impl std::error::Error for DistanceError {}
