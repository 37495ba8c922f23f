//! Callback-driven hand gesture recognition over camera frames.
//!
//! The crate wires a camera capture thread into an ONNX hand-recognition
//! pipeline (palm detection, hand landmark estimation, gesture
//! classification) and delivers one simplified result list per processed
//! frame to a user callback:
//!
//! ```no_run
//! # #[cfg(feature = "camera-nokhwa")]
//! # fn demo() -> Result<(), handwave::Error> {
//! use handwave::{GestureRecognizer, RecognizerConfig};
//!
//! let recognizer = GestureRecognizer::start(RecognizerConfig::default(), |results| {
//!     for hand in &results {
//!         println!(
//!             "{:?} hand: {:?} ({:.0}%)",
//!             hand.hand.hand_type,
//!             hand.gesture.gesture_type,
//!             hand.gesture.confidence * 100.0
//!         );
//!     }
//! })?;
//! // ... recognizer.stop() cancels the loop and releases the camera.
//! # drop(recognizer);
//! # Ok(())
//! # }
//! ```
//!
//! Model assets are fetched from the remote model store on first use. Hand
//! sides are reported mirrored, matching what the user sees of themselves in
//! a front-facing camera.

#[cfg(feature = "camera-nokhwa")]
pub mod camera;
mod config;
#[cfg(feature = "camera-nokhwa")]
mod convert;
pub mod engine;
mod mapper;
pub mod model_download;
mod pacer;
mod recognizer;
mod types;

pub use config::{CaptureResolution, RecognizerConfig, RecognizerOptions};
pub use engine::{OrtEngine, RecognitionEngine};
pub use mapper::map_recognition;
pub use recognizer::GestureRecognizer;
pub use types::{
    Category, Frame, GestureClassification, GestureLabel, HandClassification, HandResult,
    HandType, Landmark, RawRecognition,
};

/// Initialization failures surfaced by [`GestureRecognizer::start`].
///
/// Camera-access failures are deliberately absent: they are logged and leave
/// the recognizer inert instead of reaching the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to prepare model assets")]
    ModelDownload(#[source] anyhow::Error),
    #[error("failed to construct recognition engine")]
    Engine(#[source] anyhow::Error),
}
