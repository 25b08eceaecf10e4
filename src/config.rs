use serde_derive::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detection::DetectorOrigin;
use crate::error::Error;
use crate::motion::DEFAULT_MOTION_GAIN;
use crate::overlay::DEFAULT_ANIMATION_SECS;
use crate::surface::OverlayStyle;

pub const CONFIG_ENV: &str = "SCANTRACK_CONFIG";
pub const MOTION_GAIN_ENV: &str = "SCANTRACK_MOTION_GAIN";
pub const ANIMATION_SECS_ENV: &str = "SCANTRACK_ANIMATION_SECS";
pub const DETECTOR_ORIGIN_ENV: &str = "SCANTRACK_DETECTOR_ORIGIN";

const DEFAULT_MOTION_INTERVAL_MS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TrackerConfigFile {
    motion_gain: Option<f32>,
    animation_secs: Option<f32>,
    detector_origin: Option<DetectorOrigin>,
    motion_interval_ms: Option<u64>,
    style: Option<StyleConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StyleConfigFile {
    border_width: Option<f32>,
    stroke: Option<[u8; 3]>,
    fill_alpha: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Display pixels per degree of device rotation.
    pub motion_gain: f32,
    pub animation_secs: f32,
    pub detector_origin: DetectorOrigin,
    pub motion_interval: Duration,
    pub style: OverlayStyle,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            motion_gain: DEFAULT_MOTION_GAIN,
            animation_secs: DEFAULT_ANIMATION_SECS,
            detector_origin: DetectorOrigin::default(),
            motion_interval: Duration::from_millis(DEFAULT_MOTION_INTERVAL_MS),
            style: OverlayStyle::default(),
        }
    }
}

impl TrackerConfig {
    /// Defaults, then the file named by `SCANTRACK_CONFIG`, then env overrides.
    pub fn load() -> Result<Self, Error> {
        let path = std::env::var(CONFIG_ENV).ok();
        Self::load_from(path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self, Error> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => TrackerConfigFile::default(),
        };

        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parses a TOML document, without looking at the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        let cfg = Self::from_file(toml::from_str(raw)?);
        cfg.validate()?;

        Ok(cfg)
    }

    fn from_file(file: TrackerConfigFile) -> Self {
        let defaults = Self::default();
        let style = file.style.unwrap_or_default();

        Self {
            motion_gain: file.motion_gain.unwrap_or(defaults.motion_gain),
            animation_secs: file.animation_secs.unwrap_or(defaults.animation_secs),
            detector_origin: file.detector_origin.unwrap_or(defaults.detector_origin),
            motion_interval: file
                .motion_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.motion_interval),
            style: OverlayStyle {
                border_width: style.border_width.unwrap_or(defaults.style.border_width),
                stroke: style.stroke.unwrap_or(defaults.style.stroke),
                fill_alpha: style.fill_alpha.unwrap_or(defaults.style.fill_alpha),
            },
        }
    }

    fn apply_env(&mut self) -> Result<(), Error> {
        if let Ok(raw) = std::env::var(MOTION_GAIN_ENV) {
            self.motion_gain = parse_env(MOTION_GAIN_ENV, &raw)?;
        }

        if let Ok(raw) = std::env::var(ANIMATION_SECS_ENV) {
            self.animation_secs = parse_env(ANIMATION_SECS_ENV, &raw)?;
        }

        if let Ok(raw) = std::env::var(DETECTOR_ORIGIN_ENV) {
            self.detector_origin = raw
                .parse()
                .map_err(|err| Error::InvalidConfig(format!("{}: {}", DETECTOR_ORIGIN_ENV, err)))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.motion_gain.is_finite() {
            return Err(Error::InvalidConfig("motion_gain must be finite".into()));
        }

        if !(self.animation_secs.is_finite() && self.animation_secs > 0.0) {
            return Err(Error::InvalidConfig(
                "animation_secs must be a positive number".into(),
            ));
        }

        if self.motion_interval.is_zero() {
            return Err(Error::InvalidConfig("motion_interval_ms must be non-zero".into()));
        }

        if !(0.0..=1.0).contains(&self.style.fill_alpha) {
            return Err(Error::InvalidConfig("style.fill_alpha must be within [0, 1]".into()));
        }

        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<TrackerConfigFile, Error> {
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, Error> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{} is not a valid value: `{}`", key, raw)))
}
