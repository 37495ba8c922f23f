//! Runs the recognition pipeline over still images.
//!
//! Usage: cargo run --example recognize_from_image -- photo.jpg [more.png ...]

use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result, bail};
use handwave::{
    Frame, OrtEngine, RecognitionEngine, RecognizerConfig, map_recognition, model_download,
};

fn main() -> Result<()> {
    env_logger::init();

    let image_paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if image_paths.is_empty() {
        bail!("no images given; pass one or more image paths");
    }

    let config = RecognizerConfig::default();
    model_download::ensure_models_ready(&config.model_dir)?;
    let mut engine = OrtEngine::new(&config.model_dir, config.options)?;

    for path in image_paths {
        let frame = load_frame(&path)?;
        let raw = engine
            .recognize(&frame)
            .with_context(|| format!("failed to recognize {}", path.display()))?;
        let results = map_recognition(&raw);

        if results.is_empty() {
            println!("{}: no hands detected", path.display());
            continue;
        }

        for hand in results {
            println!(
                "{}: {} hand {:?} ({:.0}%), {} landmarks",
                path.display(),
                hand.hand.hand_type.as_str(),
                hand.gesture.gesture_type,
                hand.gesture.confidence * 100.0,
                hand.landmarks.len()
            );
        }
    }

    Ok(())
}

fn load_frame(path: &PathBuf) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(Frame {
        rgba: image.into_raw(),
        width,
        height,
        timestamp: Instant::now(),
    })
}
