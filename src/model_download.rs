//! Resolves model assets from the remote model store into a local directory.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

const MODEL_STORE_BASE: &str =
    "https://raw.githubusercontent.com/weidix/handwave/main/models";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    PalmDetector,
    HandLandmarker,
    GestureClassifier,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::PalmDetector,
        ModelKind::HandLandmarker,
        ModelKind::GestureClassifier,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ModelKind::PalmDetector => "palm_detection_mediapipe_2023feb.onnx",
            ModelKind::HandLandmarker => "handpose_estimation_mediapipe_2023feb.onnx",
            ModelKind::GestureClassifier => "gesture_classifier_canned_2023feb.onnx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::PalmDetector => "palm detector",
            ModelKind::HandLandmarker => "hand landmarker",
            ModelKind::GestureClassifier => "gesture classifier",
        }
    }

    fn url(self) -> String {
        format!("{MODEL_STORE_BASE}/{}", self.file_name())
    }

    pub fn path_in(self, model_dir: &Path) -> PathBuf {
        model_dir.join(self.file_name())
    }
}

#[derive(Clone, Debug)]
pub enum ModelDownloadEvent {
    AlreadyPresent {
        model: ModelKind,
    },
    Started {
        model: ModelKind,
        total: Option<u64>,
    },
    Progress {
        model: ModelKind,
        downloaded: u64,
        total: Option<u64>,
    },
    Finished {
        model: ModelKind,
    },
}

/// Makes sure every model asset exists under `model_dir`, downloading the
/// missing ones from the model store with a progress bar.
pub fn ensure_models_ready(model_dir: &Path) -> anyhow::Result<()> {
    for kind in ModelKind::ALL {
        let mut progress: Option<ProgressBar> = None;
        ensure_model_ready(kind, model_dir, |event| match &event {
            ModelDownloadEvent::Started { total, .. } => {
                progress = Some(create_progress_bar(*total));
            }
            ModelDownloadEvent::Progress { downloaded, .. } => {
                if let Some(pb) = progress.as_ref() {
                    pb.set_position(*downloaded);
                }
            }
            ModelDownloadEvent::Finished { model } => {
                if let Some(pb) = progress.take() {
                    pb.finish_with_message(format!("{} ready", model.label()));
                }
            }
            ModelDownloadEvent::AlreadyPresent { .. } => {}
        })?;
    }
    Ok(())
}

/// Makes sure one model asset exists under `model_dir`, reporting progress
/// through `on_event`.
pub fn ensure_model_ready<F>(
    kind: ModelKind,
    model_dir: &Path,
    mut on_event: F,
) -> anyhow::Result<()>
where
    F: FnMut(ModelDownloadEvent),
{
    let dest = kind.path_in(model_dir);
    if dest.exists() {
        on_event(ModelDownloadEvent::AlreadyPresent { model: kind });
        on_event(ModelDownloadEvent::Finished { model: kind });
        return Ok(());
    }

    fs::create_dir_all(model_dir).with_context(|| {
        format!("failed to create model directory {}", model_dir.display())
    })?;

    download_to_path(kind, &kind.url(), &dest, &mut on_event)
        .with_context(|| format!("failed to download {} model", kind.label()))
}

fn download_to_path<F>(
    model: ModelKind,
    url: &str,
    dest: &Path,
    on_event: &mut F,
) -> anyhow::Result<()>
where
    F: FnMut(ModelDownloadEvent),
{
    log::info!(
        "downloading {} model from {url} to {}",
        model.label(),
        dest.display()
    );

    let client = Client::new();
    let mut response = client
        .get(url)
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    let total = response.content_length();
    on_event(ModelDownloadEvent::Started { model, total });

    // Download into a temp file and rename so a partial download is never
    // mistaken for a usable model.
    let tmp_path = dest.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        on_event(ModelDownloadEvent::Progress {
            model,
            downloaded,
            total,
        });
    }

    file.sync_all()
        .context("failed to flush downloaded model to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move temp model {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    on_event(ModelDownloadEvent::Finished { model });
    Ok(())
}

fn create_progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap()
            .progress_chars("=>-");
            pb.set_style(style);
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.green} downloading model").unwrap();
            pb.set_style(style);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_paths_land_in_the_requested_directory() {
        let dir = Path::new("/tmp/handwave-models");
        for kind in ModelKind::ALL {
            let path = kind.path_in(dir);
            assert!(path.starts_with(dir));
            assert_eq!(path.file_name().unwrap(), kind.file_name());
        }
    }

    #[test]
    fn already_present_model_emits_no_download_events() {
        let dir = std::env::temp_dir().join("handwave-test-models");
        fs::create_dir_all(&dir).unwrap();
        let path = ModelKind::PalmDetector.path_in(&dir);
        fs::write(&path, b"stub").unwrap();

        let mut events = Vec::new();
        ensure_model_ready(ModelKind::PalmDetector, &dir, |e| events.push(e)).unwrap();

        assert!(matches!(
            events[0],
            ModelDownloadEvent::AlreadyPresent { .. }
        ));
        assert!(matches!(events[1], ModelDownloadEvent::Finished { .. }));

        fs::remove_file(path).unwrap();
    }
}
