use serde_derive::{Deserialize, Serialize};

/// Where the detector puts `(0, 0)` in its normalized image plane.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorOrigin {
    /// `y` grows upwards and the box origin is its bottom edge.
    #[default]
    BottomLeft,
    /// `y` grows downwards and the box origin is its top edge.
    TopLeft,
}

impl std::str::FromStr for DetectorOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom_left" | "bottom-left" => Ok(DetectorOrigin::BottomLeft),
            "top_left" | "top-left" => Ok(DetectorOrigin::TopLeft),
            other => Err(format!("unknown detector origin `{}`", other)),
        }
    }
}

/// Detector output: origin and size as fractions of the analyzed image.
///
/// Only `x`, `y` and `w` are used when placing the overlay, `h` is kept
/// for logging.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NormalizedDetection {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl NormalizedDetection {
    #[inline]
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_parses_both_spellings() {
        assert_eq!("top-left".parse::<DetectorOrigin>(), Ok(DetectorOrigin::TopLeft));
        assert_eq!(" Bottom_Left ".parse::<DetectorOrigin>(), Ok(DetectorOrigin::BottomLeft));
        assert!("center".parse::<DetectorOrigin>().is_err());
    }

    #[test]
    fn detection_has_only_box_fields() {
        let det: NormalizedDetection =
            toml::from_str("x = 0.4\ny = 0.3\nw = 0.2\nh = 0.1").unwrap();
        assert_eq!(det, NormalizedDetection::new(0.4, 0.3, 0.2, 0.1));
    }
}
