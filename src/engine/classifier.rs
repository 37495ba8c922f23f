//! Gesture classification over hand landmarks.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::common;
use crate::types::Category;

/// Class order baked into the exported model.
pub const GESTURE_CLASSES: [&str; 8] = [
    "None",
    "Closed_Fist",
    "Open_Palm",
    "Pointing_Up",
    "Thumb_Down",
    "Thumb_Up",
    "Victory",
    "ILoveYou",
];

pub struct GestureClassifier {
    session: Session,
}

impl GestureClassifier {
    pub fn new(model_path: &Path) -> Result<Self> {
        let session = common::build_session(model_path).with_context(|| {
            format!(
                "failed to load gesture classifier from {}",
                model_path.display()
            )
        })?;
        Ok(Self { session })
    }

    /// Ranks all gesture classes for one hand, highest score first.
    pub fn rank(&mut self, raw_landmarks: &[[f32; 3]]) -> Result<Vec<Category>> {
        let input_vec = normalize_keypoints(raw_landmarks)
            .ok_or_else(|| anyhow!("degenerate landmarks, cannot normalize for classifier"))?;

        let input_array = Array2::from_shape_vec((1, 42), input_vec)
            .map_err(|err| anyhow!("failed to build classifier input: {err}"))?;
        let tensor = Tensor::from_array(input_array)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run gesture classifier session")?;
        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("failed to extract classifier logits")?;

        let logits: Vec<f32> = logits.iter().copied().collect();
        if logits.len() < GESTURE_CLASSES.len() {
            return Err(anyhow!(
                "classifier returned {} logits, expected {}",
                logits.len(),
                GESTURE_CLASSES.len()
            ));
        }

        Ok(rank_logits(&logits[..GESTURE_CLASSES.len()]))
    }
}

/// Normalizes 21 landmarks the way the classifier was trained: x/y only,
/// wrist at the origin, scaled by palm width, flattened to 42 values.
pub fn normalize_keypoints(landmarks: &[[f32; 3]]) -> Option<Vec<f32>> {
    if landmarks.len() != common::NUM_LANDMARKS {
        return None;
    }

    let mut pts: Vec<[f32; 2]> = landmarks.iter().map(|p| [p[0], p[1]]).collect();

    let wrist = pts[0];
    for pt in pts.iter_mut() {
        pt[0] -= wrist[0];
        pt[1] -= wrist[1];
    }

    // Palm width: index MCP to pinky MCP. Fall back to wrist-to-middle-MCP
    // when the palm is edge-on.
    let palm_width = {
        let dx = pts[5][0] - pts[17][0];
        let dy = pts[5][1] - pts[17][1];
        (dx * dx + dy * dy).sqrt()
    };
    let scale = if palm_width > 1e-6 {
        palm_width
    } else {
        let dx = pts[9][0];
        let dy = pts[9][1];
        (dx * dx + dy * dy).sqrt()
    };
    if scale <= 1e-6 {
        return None;
    }

    let mut result = Vec::with_capacity(42);
    for pt in pts {
        result.push(pt[0] / scale);
        result.push(pt[1] / scale);
    }
    Some(result)
}

/// Softmaxes the logits and pairs them with class names, descending by score.
pub fn rank_logits(logits: &[f32]) -> Vec<Category> {
    let max = logits.iter().copied().fold(f32::MIN, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    let mut ranked: Vec<Category> = GESTURE_CLASSES
        .iter()
        .zip(exps)
        .map(|(name, e)| Category::new(*name, e / sum))
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
