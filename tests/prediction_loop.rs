//! End-to-end prediction loop behavior with a scripted engine and a
//! channel-fed frame source.

use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::bounded;
use handwave::{
    Category, Frame, GestureLabel, GestureRecognizer, HandResult, HandType, Landmark,
    RawRecognition, RecognitionEngine,
};

struct ScriptedEngine {
    hands: usize,
}

impl RecognitionEngine for ScriptedEngine {
    fn recognize(&mut self, _frame: &Frame) -> anyhow::Result<RawRecognition> {
        let mut raw = RawRecognition::default();
        for _ in 0..self.hands {
            raw.handednesses.push(vec![Category::new("Right", 0.9)]);
            raw.gestures.push(vec![Category::new("Open_Palm", 0.8)]);
            raw.landmarks.push(vec![Landmark {
                x: 0.1,
                y: 0.2,
                z: 0.0,
            }]);
        }
        Ok(raw)
    }
}

type Deliveries = Arc<Mutex<Vec<Vec<HandResult>>>>;

fn collector() -> (Deliveries, impl FnMut(Vec<HandResult>) + Send + 'static) {
    let deliveries: Deliveries = Arc::new(Mutex::new(Vec::new()));
    let sink = deliveries.clone();
    (deliveries, move |results| {
        sink.lock().unwrap().push(results);
    })
}

fn frame(timestamp: Instant) -> Frame {
    Frame {
        rgba: vec![0; 4],
        width: 1,
        height: 1,
        timestamp,
    }
}

fn wait_for(deliveries: &Deliveries, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if deliveries.lock().unwrap().len() >= count {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for {count} callback invocations");
}

#[test]
fn callback_receives_mapped_results_per_frame() {
    let (deliveries, callback) = collector();
    let (tx, rx) = bounded(1);
    let recognizer = GestureRecognizer::with_frame_source(
        ScriptedEngine { hands: 2 },
        rx,
        Duration::ZERO,
        callback,
    );

    tx.send(frame(Instant::now())).unwrap();
    wait_for(&deliveries, 1);
    recognizer.stop();

    let results = deliveries.lock().unwrap();
    assert_eq!(results[0].len(), 2);
    // Engine "Right" comes back as the viewer's left hand.
    assert_eq!(results[0][0].hand.hand_type, HandType::Left);
    assert_eq!(results[0][0].hand.confidence, 0.9);
    assert_eq!(results[0][0].gesture.gesture_type, GestureLabel::OpenPalm);
    assert_eq!(results[0][0].gesture.confidence, 0.8);
    assert_eq!(
        results[0][0].landmarks,
        vec![Landmark {
            x: 0.1,
            y: 0.2,
            z: 0.0
        }]
    );
}

#[test]
fn callback_fires_with_empty_list_when_no_hands_detected() {
    let (deliveries, callback) = collector();
    let (tx, rx) = bounded(1);
    let recognizer = GestureRecognizer::with_frame_source(
        ScriptedEngine { hands: 0 },
        rx,
        Duration::ZERO,
        callback,
    );

    tx.send(frame(Instant::now())).unwrap();
    wait_for(&deliveries, 1);
    recognizer.stop();

    let results = deliveries.lock().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_empty());
}

#[test]
fn duplicate_frame_timestamps_run_inference_once() {
    let (deliveries, callback) = collector();
    let (tx, rx) = bounded(1);
    let recognizer = GestureRecognizer::with_frame_source(
        ScriptedEngine { hands: 1 },
        rx,
        Duration::ZERO,
        callback,
    );

    let first = Instant::now();
    tx.send(frame(first)).unwrap();
    wait_for(&deliveries, 1);

    // Same capture timestamp again: the clock has not advanced, so neither
    // inference nor the callback should run.
    tx.send(frame(first)).unwrap();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(deliveries.lock().unwrap().len(), 1);

    tx.send(frame(first + Duration::from_millis(33))).unwrap();
    wait_for(&deliveries, 2);
    recognizer.stop();
}

#[test]
fn stop_cancels_the_loop() {
    let (deliveries, callback) = collector();
    let (tx, rx) = bounded(1);
    let recognizer = GestureRecognizer::with_frame_source(
        ScriptedEngine { hands: 1 },
        rx,
        Duration::ZERO,
        callback,
    );

    tx.send(frame(Instant::now())).unwrap();
    wait_for(&deliveries, 1);
    recognizer.stop();

    let _ = tx.try_send(frame(Instant::now() + Duration::from_millis(50)));
    thread::sleep(Duration::from_millis(150));
    assert_eq!(deliveries.lock().unwrap().len(), 1);
}

#[test]
fn dropped_frame_source_ends_the_worker() {
    let (deliveries, callback) = collector();
    let (tx, rx) = bounded(1);
    let recognizer = GestureRecognizer::with_frame_source(
        ScriptedEngine { hands: 1 },
        rx,
        Duration::ZERO,
        callback,
    );

    drop(tx);
    // stop() joins the worker; it must return promptly once the channel is
    // disconnected.
    recognizer.stop();
    assert!(deliveries.lock().unwrap().is_empty());
}
