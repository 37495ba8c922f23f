use std::{path::PathBuf, time::Duration};

/// Target camera capture resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureResolution {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureResolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Options forwarded to the recognition engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecognizerOptions {
    /// Maximum number of hands tracked per frame.
    pub num_hands: usize,
    /// Single confidence threshold applied uniformly to palm detection and
    /// landmark presence gating.
    pub detection_threshold: f32,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            num_hands: 1,
            detection_threshold: 0.5,
        }
    }
}

/// Construction-time configuration for [`GestureRecognizer`].
///
/// [`GestureRecognizer`]: crate::GestureRecognizer
#[derive(Clone, Debug)]
pub struct RecognizerConfig {
    pub resolution: CaptureResolution,
    pub options: RecognizerOptions,
    /// Minimum delay between successive inference attempts. Zero means every
    /// new frame is eligible.
    pub prediction_timeout: Duration,
    /// Which camera device to open.
    pub camera_index: u32,
    /// Directory where model assets are stored, downloading them on first use.
    pub model_dir: PathBuf,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            resolution: CaptureResolution::default(),
            options: RecognizerOptions::default(),
            prediction_timeout: Duration::ZERO,
            camera_index: 0,
            model_dir: PathBuf::from("models"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RecognizerConfig::default();
        assert_eq!(config.resolution.width, 1280);
        assert_eq!(config.resolution.height, 720);
        assert_eq!(config.options.num_hands, 1);
        assert_eq!(config.options.detection_threshold, 0.5);
        assert_eq!(config.prediction_timeout, Duration::ZERO);
        assert_eq!(config.camera_index, 0);
        assert_eq!(config.model_dir, PathBuf::from("models"));
    }
}
