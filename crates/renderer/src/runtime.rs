use std::time::{Duration, Instant};

use anyhow::Result;

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames should animate continuously or
/// be evaluated once at a fixed timestamp.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Render a single still frame at an optional timestamp.
    Still {
        /// Specific timestamp to evaluate the scene at (seconds).
        time: Option<f32>,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

/// Snapshot of the time state supplied to the scene uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
}

impl FixedTimeSource {
    pub fn new(time: f32) -> Self {
        Self { time }
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {}

    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.time, 0)
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> Result<BoxedTimeSource> {
    match policy {
        RenderPolicy::Animate { .. } => Ok(Box::new(SystemTimeSource::new())),
        RenderPolicy::Still { time } => Ok(Box::new(FixedTimeSource::new(time.unwrap_or(0.0)))),
    }
}

/// Decides when the next frame should be issued for a policy.
///
/// Animate without a cap redraws as fast as the surface presents; a cap turns
/// into a fixed interval between frames; Still renders exactly one frame and
/// then goes idle until reset.
pub struct FrameScheduler {
    interval: Option<Duration>,
    single_frame: bool,
    rendered_once: bool,
    last_render: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(policy: &RenderPolicy) -> Self {
        let (interval, single_frame) = match policy {
            RenderPolicy::Animate { target_fps } => {
                let interval = target_fps
                    .filter(|fps| *fps > 0.0)
                    .map(|fps| Duration::from_secs_f32(1.0 / fps));
                (interval, false)
            }
            RenderPolicy::Still { .. } => (None, true),
        };
        Self {
            interval,
            single_frame,
            rendered_once: false,
            last_render: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        if self.single_frame && self.rendered_once {
            return false;
        }
        match (self.interval, self.last_render) {
            (Some(interval), Some(last)) => now.duration_since(last) >= interval,
            _ => true,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.single_frame && self.rendered_once {
            return None;
        }
        match (self.interval, self.last_render) {
            (Some(interval), Some(last)) => Some(last + interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.rendered_once = true;
        self.last_render = Some(now);
    }

    pub fn reset(&mut self) {
        self.rendered_once = false;
        self.last_render = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_source_advances_frames() {
        let mut source = SystemTimeSource::new();
        let first = source.sample();
        let second = source.sample();
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
        assert!(second.seconds >= first.seconds);
    }

    #[test]
    fn fixed_source_is_constant() {
        let mut source = FixedTimeSource::new(12.5);
        assert_eq!(source.sample(), TimeSample::new(12.5, 0));
        assert_eq!(source.sample(), TimeSample::new(12.5, 0));
    }

    #[test]
    fn uncapped_scheduler_is_always_ready() {
        let mut scheduler = FrameScheduler::new(&RenderPolicy::Animate { target_fps: None });
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn capped_scheduler_waits_out_the_interval() {
        let mut scheduler = FrameScheduler::new(&RenderPolicy::Animate {
            target_fps: Some(10.0),
        });
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(!scheduler.ready_for_frame(now + Duration::from_millis(50)));
        assert!(scheduler.ready_for_frame(now + Duration::from_millis(100)));
        assert_eq!(
            scheduler.next_deadline(),
            Some(now + Duration::from_millis(100))
        );
    }

    #[test]
    fn still_scheduler_renders_exactly_once() {
        let mut scheduler = FrameScheduler::new(&RenderPolicy::Still { time: Some(3.0) });
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(!scheduler.ready_for_frame(now + Duration::from_secs(10)));
        assert!(scheduler.next_deadline().is_none());
        scheduler.reset();
        assert!(scheduler.ready_for_frame(now));
    }

    #[test]
    fn zero_fps_cap_means_uncapped() {
        let scheduler = FrameScheduler::new(&RenderPolicy::Animate {
            target_fps: Some(0.0),
        });
        assert!(scheduler.ready_for_frame(Instant::now()));
        assert!(scheduler.next_deadline().is_none());
    }
}
