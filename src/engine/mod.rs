//! The per-frame inference engine: palm detection, hand landmark estimation
//! and gesture classification composed behind [`RecognitionEngine`].

mod anchors;
mod classifier;
mod common;
mod ort;
mod palm;

use crate::types::{Frame, RawRecognition};

pub use self::ort::OrtEngine;

/// Per-frame inference over a video stream. Implementations keep whatever
/// state they need between frames; the recognizer owns one engine per
/// instance, never shared.
pub trait RecognitionEngine: Send + 'static {
    fn recognize(&mut self, frame: &Frame) -> anyhow::Result<RawRecognition>;
}
