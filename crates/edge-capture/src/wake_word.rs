//! Wake-word detection is an external collaborator (Porcupine or similar
//! ML model) — out of scope here. This module defines the fixed interface
//! the capture controller depends on, plus a stub and a placeholder
//! implementation good enough to exercise the controller in tests.

use crate::silence::energy;

/// Single-owner detector with explicit listen/stop so the controller never
/// runs detection while the mic is dedicated to an active capture session.
pub trait WakeWordDetector: Send + Sync {
    fn start_listening(&self);
    fn stop_listening(&self);

    /// Feed one chunk of mono f32 samples. Returns `true` on detection.
    fn detect(&self, samples: &[f32]) -> bool;
}

/// Default when no wake-word model is configured: never fires. Capture then
/// only starts via push-to-talk.
#[derive(Debug, Default)]
pub struct AlwaysSilentDetector;

impl WakeWordDetector for AlwaysSilentDetector {
    fn start_listening(&self) {}
    fn stop_listening(&self) {}
    fn detect(&self, _samples: &[f32]) -> bool {
        false
    }
}

/// Energy-threshold placeholder: fires when a chunk's amplitude exceeds a
/// fixed bar. Not a real wake-word model — useful only for exercising the
/// barge-in/gate logic in tests without a trained detector.
pub struct RmsThresholdDetector {
    threshold: f32,
    listening: std::sync::atomic::AtomicBool,
}

impl RmsThresholdDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold, listening: std::sync::atomic::AtomicBool::new(true) }
    }
}

impl WakeWordDetector for RmsThresholdDetector {
    fn start_listening(&self) {
        self.listening.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    fn stop_listening(&self) {
        self.listening.store(false, std::sync::atomic::Ordering::Relaxed);
    }

    fn detect(&self, samples: &[f32]) -> bool {
        if !self.listening.load(std::sync::atomic::Ordering::Relaxed) {
            return false;
        }
        energy(samples) >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_silent_never_fires() {
        let detector = AlwaysSilentDetector;
        assert!(!detector.detect(&[1.0; 100]));
    }

    #[test]
    fn test_rms_threshold_fires_above_bar() {
        let detector = RmsThresholdDetector::new(0.2);
        assert!(!detector.detect(&[0.01; 100]));
        assert!(detector.detect(&[0.5; 100]));
    }

    #[test]
    fn test_rms_threshold_respects_stop_listening() {
        let detector = RmsThresholdDetector::new(0.2);
        detector.stop_listening();
        assert!(!detector.detect(&[0.9; 100]));
        detector.start_listening();
        assert!(detector.detect(&[0.9; 100]));
    }
}
