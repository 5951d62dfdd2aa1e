//! Fade curves and envelopes used for warmup reveals and scene swaps.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeCurve {
    Linear,
    Smoothstep,
    EaseInOut,
}

impl FadeCurve {
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::Smoothstep => t * t * (3.0 - 2.0 * t),
            FadeCurve::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

/// Time-bound fade from 0 to 1 starting at a fixed instant.
#[derive(Debug, Clone)]
pub struct FadeEnvelope {
    started: Instant,
    duration: Duration,
    curve: FadeCurve,
}

impl FadeEnvelope {
    /// `None` when the duration is zero; callers then skip fading entirely.
    pub fn new(duration: Duration, curve: FadeCurve, now: Instant) -> Option<Self> {
        if duration.is_zero() {
            None
        } else {
            Some(Self {
                started: now,
                duration,
                curve,
            })
        }
    }

    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started).as_secs_f32();
        elapsed / self.duration.as_secs_f32().max(f32::EPSILON)
    }

    /// Curved fade level in `[0, 1]` plus whether the envelope has finished.
    pub fn level(&self, now: Instant) -> (f32, bool) {
        let progress = self.progress(now);
        (self.curve.sample(progress), progress >= 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_increases_monotonically() {
        let curve = FadeCurve::Linear;
        let mut last = 0.0;
        for step in 0..=10 {
            let sample = curve.sample(step as f32 / 10.0);
            assert!(sample >= last - f32::EPSILON);
            last = sample;
        }
    }

    #[test]
    fn smoothstep_matches_expected_values() {
        let curve = FadeCurve::Smoothstep;
        assert!((curve.sample(0.0) - 0.0).abs() < 1e-6);
        assert!((curve.sample(0.5) - 0.5).abs() < 1e-6);
        assert!((curve.sample(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ease_in_out_accelerates_then_decelerates() {
        let curve = FadeCurve::EaseInOut;
        let first = curve.sample(0.25);
        let mid = curve.sample(0.5);
        let last = curve.sample(0.75);
        assert!(first < mid);
        assert!(last > mid);
        assert!((curve.sample(0.0) - 0.0).abs() < 1e-6);
        assert!((curve.sample(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn samples_are_clamped() {
        assert_eq!(FadeCurve::Linear.sample(-2.0), 0.0);
        assert_eq!(FadeCurve::Linear.sample(2.0), 1.0);
    }

    #[test]
    fn envelope_reports_progress_and_completion() {
        let start = Instant::now();
        let envelope = FadeEnvelope::new(Duration::from_millis(100), FadeCurve::Linear, start)
            .expect("envelope");
        let (level, finished) = envelope.level(start + Duration::from_millis(50));
        assert!((level - 0.5).abs() < 0.05);
        assert!(!finished);
        let (level, finished) = envelope.level(start + Duration::from_millis(150));
        assert_eq!(level, 1.0);
        assert!(finished);
    }

    #[test]
    fn zero_duration_yields_no_envelope() {
        assert!(FadeEnvelope::new(Duration::ZERO, FadeCurve::Linear, Instant::now()).is_none());
    }
}
