use std::{env, path::PathBuf};

use quiver_core::DistancePreset;

use crate::store::DEFAULT_LOG_FILE;

pub const DEFAULT_ARROWS: usize = 6;

/// Volley sizes offered to the archer.
pub const ALLOWED_ARROWS: [usize; 2] = [3, 6];

/// Settings shared by the CLI and the server, read once at startup.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub log_file: PathBuf,
    pub arrows: usize,
    pub preset: DistancePreset,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            arrows: DEFAULT_ARROWS,
            preset: DistancePreset::default(),
        }
    }
}

impl RecorderConfig {
    pub fn from_env() -> Self {
        let mut arrows = read_env_usize("QUIVER_ARROWS", DEFAULT_ARROWS);
        if let Err(e) = check_arrows(arrows) {
            tracing::warn!("QUIVER_ARROWS: {}. Falling back to {}.", e, DEFAULT_ARROWS);
            arrows = DEFAULT_ARROWS;
        }

        Self {
            log_file: PathBuf::from(read_env_string("QUIVER_LOG_FILE", DEFAULT_LOG_FILE)),
            arrows,
            preset: read_env_preset("QUIVER_PRESET"),
        }
    }
}

pub fn check_arrows(arrows: usize) -> Result<usize, String> {
    if ALLOWED_ARROWS.contains(&arrows) {
        Ok(arrows)
    } else {
        Err(format!(
            "invalid arrows per volley: {arrows} (must be 3 or 6)"
        ))
    }
}

pub fn read_env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub fn read_env_preset(name: &str) -> DistancePreset {
    match env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            tracing::warn!("{}: {}. Using the standard preset.", name, e);
            DistancePreset::Standard
        }),
        Err(_) => DistancePreset::default(),
    }
}
