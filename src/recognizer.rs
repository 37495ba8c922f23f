//! The recognizer component: initialization, the prediction loop and its
//! cancellable handle.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::{
    engine::RecognitionEngine,
    mapper::map_recognition,
    pacer::PredictionPacer,
    types::{Frame, HandResult},
};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Continuously recognizes hand gestures and delivers mapped results to a
/// user callback, once per processed frame.
///
/// All mutable state (engine handle, last-frame timestamp) is owned by this
/// instance's worker; concurrent recognizers never share anything. Dropping
/// the handle cancels the loop and releases the camera before returning.
pub struct GestureRecognizer {
    #[cfg(feature = "camera-nokhwa")]
    camera: Option<crate::camera::CameraStream>,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl GestureRecognizer {
    /// One-time initialization: resolves model assets from the model store,
    /// constructs the inference engine, opens the camera at the configured
    /// resolution and starts the prediction loop.
    ///
    /// Model and engine failures are returned as errors. A camera-access
    /// failure is logged only: the returned handle is valid but will never
    /// invoke the callback.
    #[cfg(feature = "camera-nokhwa")]
    pub fn start<F>(config: crate::RecognizerConfig, callback: F) -> Result<Self, crate::Error>
    where
        F: FnMut(Vec<HandResult>) + Send + 'static,
    {
        use nokhwa::utils::CameraIndex;

        crate::model_download::ensure_models_ready(&config.model_dir)
            .map_err(crate::Error::ModelDownload)?;
        let engine = crate::engine::OrtEngine::new(&config.model_dir, config.options)
            .map_err(crate::Error::Engine)?;

        let (frame_tx, frame_rx) = crossbeam_channel::bounded(1);
        let camera = match crate::camera::start_camera_stream(
            CameraIndex::Index(config.camera_index),
            config.resolution,
            frame_tx,
        ) {
            Ok(stream) => Some(stream),
            Err(err) => {
                // Dropping the sender ends the worker; the handle stays inert.
                log::error!("camera access failed, no results will be produced: {err:?}");
                None
            }
        };

        let mut recognizer =
            Self::with_frame_source(engine, frame_rx, config.prediction_timeout, callback);
        recognizer.camera = camera;
        Ok(recognizer)
    }

    /// Runs the prediction loop over an arbitrary frame channel instead of a
    /// camera. The loop ends when every sender is dropped or the handle is
    /// stopped.
    pub fn with_frame_source<E, F>(
        engine: E,
        frame_rx: Receiver<Frame>,
        prediction_timeout: Duration,
        callback: F,
    ) -> Self
    where
        E: RecognitionEngine,
        F: FnMut(Vec<HandResult>) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let pacer = PredictionPacer::new(prediction_timeout);

        let worker = thread::spawn(move || {
            run_prediction_loop(engine, frame_rx, pacer, stop_flag, callback);
        });

        Self {
            #[cfg(feature = "camera-nokhwa")]
            camera: None,
            stop,
            worker: Some(worker),
        }
    }

    /// Cancels the prediction loop and releases the camera. No inference is
    /// scheduled after this returns.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        #[cfg(feature = "camera-nokhwa")]
        if let Some(camera) = self.camera.take() {
            camera.stop();
        }
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for GestureRecognizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_prediction_loop<E, F>(
    mut engine: E,
    frame_rx: Receiver<Frame>,
    mut pacer: PredictionPacer,
    stop: Arc<AtomicBool>,
    mut callback: F,
) where
    E: RecognitionEngine,
    F: FnMut(Vec<HandResult>),
{
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let mut frame = match frame_rx.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        // Drain stale frames; inference always runs on the newest one.
        // Skipped frames are dropped, never queued.
        while let Ok(newer) = frame_rx.try_recv() {
            frame = newer;
        }

        if !pacer.admit(frame.timestamp, Instant::now()) {
            continue;
        }

        match engine.recognize(&frame) {
            // The callback runs synchronously on this thread; a slow callback
            // lengthens the tick but queues nothing.
            Ok(raw) => callback(map_recognition(&raw)),
            Err(err) => log::warn!("hand recognition failed: {err:?}"),
        }
    }

    log::debug!("prediction loop stopped");
}
