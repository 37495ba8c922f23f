use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::Session;
use ort::value::Tensor;

use super::{
    RecognitionEngine,
    classifier::GestureClassifier,
    common::{self, LANDMARK_INPUT_SIZE},
    palm::{PalmDetector, crop_from_palm},
};
use crate::{
    config::RecognizerOptions,
    model_download::ModelKind,
    types::{Category, Frame, Landmark, RawRecognition},
};

/// ONNX Runtime hand recognition pipeline. Model files must already be
/// present under `model_dir` (see [`ensure_models_ready`]).
///
/// [`ensure_models_ready`]: crate::model_download::ensure_models_ready
pub struct OrtEngine {
    landmarker: Session,
    palm_detector: PalmDetector,
    classifier: GestureClassifier,
    options: RecognizerOptions,
}

impl OrtEngine {
    pub fn new(model_dir: &Path, options: RecognizerOptions) -> Result<Self> {
        let landmarker_path = ModelKind::HandLandmarker.path_in(model_dir);
        let landmarker = common::build_session(&landmarker_path).with_context(|| {
            format!(
                "failed to load hand landmarker from {}",
                landmarker_path.display()
            )
        })?;

        let palm_detector = PalmDetector::new(
            &ModelKind::PalmDetector.path_in(model_dir),
            options.detection_threshold,
        )?;
        let classifier = GestureClassifier::new(&ModelKind::GestureClassifier.path_in(model_dir))?;

        log::info!(
            "recognition engine ready (models from {}, up to {} hands, threshold {})",
            model_dir.display(),
            options.num_hands,
            options.detection_threshold
        );

        Ok(Self {
            landmarker,
            palm_detector,
            classifier,
            options,
        })
    }

    fn recognize_hand(
        &mut self,
        frame: &Frame,
        region_score: f32,
        center: (f32, f32),
        side: f32,
        angle: f32,
    ) -> Result<Option<(Vec<Category>, Vec<Category>, Vec<Landmark>)>> {
        let (input, transform) =
            common::oriented_crop(frame, center, side, angle, LANDMARK_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .landmarker
            .run(ort::inputs![tensor])
            .context("failed to run hand landmarker session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("hand landmarker returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let raw_landmarks = common::decode_landmarks(&flattened)?;

        let presence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };
        let handedness_score = if outputs.len() > 2 {
            outputs[2]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        // The shared threshold gates presence as well as detection.
        let confidence = (presence * region_score).clamp(0.0, 1.0);
        if confidence < self.options.detection_threshold {
            return Ok(None);
        }

        let landmarks = raw_landmarks
            .iter()
            .map(|[x, y, z]| {
                let (px, py) = transform.project(*x, *y);
                Landmark {
                    x: px / frame.width.max(1) as f32,
                    y: py / frame.height.max(1) as f32,
                    z: z / LANDMARK_INPUT_SIZE as f32,
                }
            })
            .collect();

        let handednesses = rank_handedness(handedness_score);
        let gestures = match self.classifier.rank(&raw_landmarks) {
            Ok(ranked) => ranked,
            Err(err) => {
                log::warn!("gesture classification failed: {err:?}");
                vec![Category::new("None", 0.0)]
            }
        };

        Ok(Some((handednesses, gestures, landmarks)))
    }
}

impl RecognitionEngine for OrtEngine {
    fn recognize(&mut self, frame: &Frame) -> Result<RawRecognition> {
        let mut regions = self.palm_detector.detect(frame)?;
        regions.truncate(self.options.num_hands);

        let mut raw = RawRecognition::default();
        for region in &regions {
            let (center, side, angle) = crop_from_palm(region);
            match self.recognize_hand(frame, region.score, center, side, angle)? {
                Some((handednesses, gestures, landmarks)) => {
                    raw.handednesses.push(handednesses);
                    raw.gestures.push(gestures);
                    raw.landmarks.push(landmarks);
                }
                None => continue,
            }
        }

        Ok(raw)
    }
}

/// Turns the landmarker's scalar handedness output into a two-candidate
/// ranked list. Scores near 1 mean "Right" as seen by the engine.
fn rank_handedness(score: f32) -> Vec<Category> {
    let right = score.clamp(0.0, 1.0);
    if right >= 0.5 {
        vec![
            Category::new("Right", right),
            Category::new("Left", 1.0 - right),
        ]
    } else {
        vec![
            Category::new("Left", 1.0 - right),
            Category::new("Right", right),
        ]
    }
}
