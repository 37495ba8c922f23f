use std::time::{Duration, Instant};

/// Decides whether a frame is worth running inference on.
///
/// A frame is skipped when its capture timestamp equals the previously
/// processed one (the camera clock has not advanced, so the pixels are the
/// same) or when it arrives within `min_interval` of the previous admitted
/// attempt. The interval is measured from the previous admitted attempt and
/// overlaps the frame cadence rather than adding to it.
#[derive(Debug)]
pub(crate) struct PredictionPacer {
    min_interval: Duration,
    last_frame: Option<Instant>,
    last_attempt: Option<Instant>,
}

impl PredictionPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_frame: None,
            last_attempt: None,
        }
    }

    pub fn admit(&mut self, frame_timestamp: Instant, now: Instant) -> bool {
        if self.last_frame == Some(frame_timestamp) {
            return false;
        }
        if let Some(last) = self.last_attempt {
            if now.duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_frame = Some(frame_timestamp);
        self.last_attempt = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_fresh_frames_without_interval() {
        let mut pacer = PredictionPacer::new(Duration::ZERO);
        let base = Instant::now();
        assert!(pacer.admit(base, base));
        assert!(pacer.admit(base + Duration::from_millis(16), base + Duration::from_millis(16)));
    }

    #[test]
    fn skips_frame_when_clock_has_not_advanced() {
        let mut pacer = PredictionPacer::new(Duration::ZERO);
        let base = Instant::now();
        assert!(pacer.admit(base, base));
        assert!(!pacer.admit(base, base + Duration::from_millis(16)));
        assert!(pacer.admit(base + Duration::from_millis(33), base + Duration::from_millis(33)));
    }

    #[test]
    fn enforces_minimum_delay_between_attempts() {
        let mut pacer = PredictionPacer::new(Duration::from_millis(100));
        let base = Instant::now();
        assert!(pacer.admit(base, base));
        assert!(!pacer.admit(
            base + Duration::from_millis(16),
            base + Duration::from_millis(16)
        ));
        assert!(pacer.admit(
            base + Duration::from_millis(120),
            base + Duration::from_millis(120)
        ));
    }

    #[test]
    fn rate_limited_frame_does_not_poison_duplicate_detection() {
        let mut pacer = PredictionPacer::new(Duration::from_millis(100));
        let base = Instant::now();
        assert!(pacer.admit(base, base));
        let skipped = base + Duration::from_millis(50);
        assert!(!pacer.admit(skipped, skipped));
        // The same timestamp is still eligible once the interval elapses.
        assert!(pacer.admit(skipped, base + Duration::from_millis(150)));
    }
}
