//! Warmup gate: withholds scene content for a fixed interval after mount so
//! assets and pipelines settle behind a placeholder overlay. The transition
//! is one-way; only a remount produces a fresh gate.

use std::time::{Duration, Instant};

pub const DEFAULT_WARMUP: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Warming,
    Ready,
}

#[derive(Debug, Clone)]
pub struct WarmupGate {
    started: Instant,
    duration: Duration,
    ready: bool,
}

impl WarmupGate {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            started: now,
            duration,
            ready: duration.is_zero(),
        }
    }

    /// Latches to `Ready` once the duration has elapsed and stays there.
    pub fn poll(&mut self, now: Instant) -> GateState {
        if !self.ready && now.saturating_duration_since(self.started) >= self.duration {
            self.ready = true;
        }
        if self.ready {
            GateState::Ready
        } else {
            GateState::Warming
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Warmup completion in `[0, 1]` for the placeholder progress bar.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.ready || self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f32();
        (elapsed / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_warming_before_the_deadline() {
        let start = Instant::now();
        let mut gate = WarmupGate::new(Duration::from_millis(2500), start);
        assert_eq!(gate.poll(start), GateState::Warming);
        assert_eq!(
            gate.poll(start + Duration::from_millis(2499)),
            GateState::Warming
        );
        assert!(!gate.is_ready());
    }

    #[test]
    fn transitions_exactly_once_and_no_earlier_than_configured() {
        let start = Instant::now();
        let mut gate = WarmupGate::new(Duration::from_millis(2000), start);

        let mut transitions = 0;
        let mut previous_ready = gate.is_ready();
        for millis in (0..4000).step_by(100) {
            gate.poll(start + Duration::from_millis(millis));
            if gate.is_ready() && !previous_ready {
                transitions += 1;
                assert!(millis >= 2000, "gate opened early at {millis} ms");
            }
            previous_ready = gate.is_ready();
        }
        assert_eq!(transitions, 1);
    }

    #[test]
    fn ready_is_sticky() {
        let start = Instant::now();
        let mut gate = WarmupGate::new(Duration::from_millis(100), start);
        assert_eq!(
            gate.poll(start + Duration::from_millis(150)),
            GateState::Ready
        );
        // Even a stale timestamp cannot close an open gate.
        assert_eq!(gate.poll(start), GateState::Ready);
    }

    #[test]
    fn zero_duration_opens_immediately() {
        let start = Instant::now();
        let mut gate = WarmupGate::new(Duration::ZERO, start);
        assert_eq!(gate.poll(start), GateState::Ready);
    }

    #[test]
    fn progress_ramps_to_one() {
        let start = Instant::now();
        let mut gate = WarmupGate::new(Duration::from_millis(1000), start);
        assert_eq!(gate.progress(start), 0.0);
        let halfway = gate.progress(start + Duration::from_millis(500));
        assert!((halfway - 0.5).abs() < 0.01);
        gate.poll(start + Duration::from_millis(1500));
        assert_eq!(gate.progress(start + Duration::from_millis(1500)), 1.0);
    }
}
