//! Adaptive silence tracking: the threshold is derived from a pre-trigger
//! baseline rather than a fixed absolute level, since mic gain and room
//! noise floor vary per device/environment.

use vox_config::CaptureConfig;

/// Mean absolute amplitude — a simple, cheap proxy for signal energy.
pub fn energy(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum: f32 = chunk.iter().map(|s| s.abs()).sum();
    sum / chunk.len() as f32
}

/// Tracks the baseline-energy window, then counts consecutive below-
/// threshold chunks until silence has been sustained long enough to end
/// the capture session.
pub struct SilenceTracker {
    ratio: f32,
    baseline_window_ms: u32,
    silence_duration_ms: u32,
    chunk_ms: u32,
    baseline_sum: f32,
    baseline_count: u32,
    baseline_elapsed_ms: u32,
    threshold: Option<f32>,
    silent_ms: u32,
}

impl SilenceTracker {
    pub fn new(config: &CaptureConfig, chunk_ms: u32) -> Self {
        Self {
            ratio: config.relative_silence_ratio,
            baseline_window_ms: config.baseline_window_ms,
            silence_duration_ms: config.silence_duration_ms,
            chunk_ms,
            baseline_sum: 0.0,
            baseline_count: 0,
            baseline_elapsed_ms: 0,
            threshold: None,
            silent_ms: 0,
        }
    }

    pub fn is_baselining(&self) -> bool {
        self.threshold.is_none()
    }

    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    pub fn reset(&mut self) {
        self.baseline_sum = 0.0;
        self.baseline_count = 0;
        self.baseline_elapsed_ms = 0;
        self.threshold = None;
        self.silent_ms = 0;
    }

    /// Feed one chunk's energy. Returns `true` once silence has been
    /// sustained for at least `silence_duration_ms`.
    pub fn observe(&mut self, chunk_energy: f32) -> bool {
        if self.threshold.is_none() {
            self.baseline_sum += chunk_energy;
            self.baseline_count += 1;
            self.baseline_elapsed_ms += self.chunk_ms;
            if self.baseline_elapsed_ms >= self.baseline_window_ms {
                let baseline = self.baseline_sum / self.baseline_count.max(1) as f32;
                self.threshold = Some(baseline * self.ratio);
            }
            return false;
        }

        let threshold = self.threshold.expect("threshold set above");
        if chunk_energy < threshold {
            self.silent_ms += self.chunk_ms;
            self.silent_ms >= self.silence_duration_ms
        } else {
            self.silent_ms = 0;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CaptureConfig {
        CaptureConfig {
            silence_duration_ms: 100,
            listening_timeout_s: 10,
            relative_silence_ratio: 0.5,
            baseline_window_ms: 60,
        }
    }

    #[test]
    fn test_energy_of_silence_is_zero() {
        assert_eq!(energy(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_energy_of_empty_is_zero() {
        assert_eq!(energy(&[]), 0.0);
    }

    #[test]
    fn test_baselines_before_evaluating_silence() {
        let mut tracker = SilenceTracker::new(&config(), 30);
        assert!(tracker.is_baselining());
        assert!(!tracker.observe(0.2));
        assert!(tracker.is_baselining());
        assert!(!tracker.observe(0.2));
        // 60ms baseline window reached after two 30ms chunks.
        assert!(!tracker.is_baselining());
        assert_eq!(tracker.threshold(), Some(0.1));
    }

    #[test]
    fn test_sustained_silence_triggers_after_duration() {
        let mut tracker = SilenceTracker::new(&config(), 30);
        tracker.observe(0.2);
        tracker.observe(0.2); // baseline = 0.2, threshold = 0.1

        assert!(!tracker.observe(0.01)); // 30ms silent
        assert!(!tracker.observe(0.01)); // 60ms silent
        assert!(!tracker.observe(0.01)); // 90ms, still < 100
        assert!(tracker.observe(0.01)); // 120ms >= 100ms: sustained
    }

    #[test]
    fn test_speech_resets_silence_counter() {
        let mut tracker = SilenceTracker::new(&config(), 30);
        tracker.observe(0.2);
        tracker.observe(0.2);

        assert!(!tracker.observe(0.01));
        assert!(!tracker.observe(0.3)); // speech resets the counter
        assert!(!tracker.observe(0.01));
        assert!(!tracker.observe(0.01));
    }

    #[test]
    fn test_reset_clears_baseline_and_counters() {
        let mut tracker = SilenceTracker::new(&config(), 30);
        tracker.observe(0.2);
        tracker.observe(0.2);
        assert!(!tracker.is_baselining());
        tracker.reset();
        assert!(tracker.is_baselining());
    }
}
