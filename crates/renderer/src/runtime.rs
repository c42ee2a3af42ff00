use std::time::{Duration, Instant};

/// Wall-clock length of one trip of the shader clock.
pub const LOOP_PERIOD: Duration = Duration::from_secs(100);
/// Value the shader clock reaches at the end of each trip before wrapping to zero.
pub const LOOP_SPAN: f32 = 1000.0;

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames should animate continuously or
/// be evaluated at a fixed timestamp.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Render frames only when something changes, frozen at `time` seconds
    /// into the clock loop.
    Still { time: f32 },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Value written to the `time` uniform.
    pub value: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(value: f32, frame_index: u64) -> Self {
        Self { value, frame_index }
    }
}

/// Maps elapsed wall-clock time onto the looping shader clock.
///
/// The clock climbs linearly from 0 to [`LOOP_SPAN`] over [`LOOP_PERIOD`] and
/// restarts, keeping the float small enough to stay precise in the shader.
pub fn loop_time(elapsed: Duration) -> f32 {
    let period = LOOP_PERIOD.as_secs_f64();
    let phase = elapsed.as_secs_f64().rem_euclid(period) / period;
    (phase * f64::from(LOOP_SPAN)) as f32
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the monotonic clock, wrapped by [`loop_time`].
#[derive(Debug, Clone, Copy)]
pub struct LoopingTimeSource {
    origin: Instant,
    frame: u64,
}

impl LoopingTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for LoopingTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for LoopingTimeSource {
    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(loop_time(self.origin.elapsed()), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed clock value.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    value: f32,
}

impl FixedTimeSource {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.value, 0)
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate { .. } => Box::new(LoopingTimeSource::new()),
        RenderPolicy::Still { time } => {
            let elapsed = Duration::try_from_secs_f32(time.max(0.0)).unwrap_or_default();
            Box::new(FixedTimeSource::new(loop_time(elapsed)))
        }
    }
}

/// Decides when the window should draw the next frame.
///
/// Animated policies redraw continuously, honouring an optional FPS cap.
/// Still policies draw once and then only when [`invalidate`](Self::invalidate)
/// is called after a settings change.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    policy: RenderPolicy,
    last_frame: Option<Instant>,
    dirty: bool,
}

impl FrameScheduler {
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            policy,
            last_frame: None,
            dirty: true,
        }
    }

    /// Caps too small for `Duration` to hold one frame behave as uncapped.
    fn frame_interval(&self) -> Option<Duration> {
        match self.policy {
            RenderPolicy::Animate {
                target_fps: Some(fps),
            } if fps.is_finite() && fps > 0.0 => Duration::try_from_secs_f32(1.0 / fps).ok(),
            _ => None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.policy {
            RenderPolicy::Still { .. } => self.dirty,
            RenderPolicy::Animate { .. } => match (self.last_frame, self.frame_interval()) {
                (Some(last), Some(interval)) => last
                    .checked_add(interval)
                    .map_or(true, |deadline| now >= deadline),
                _ => true,
            },
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.policy {
            RenderPolicy::Still { .. } => None,
            RenderPolicy::Animate { .. } => {
                let interval = self.frame_interval()?;
                self.last_frame?.checked_add(interval)
            }
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
        self.dirty = false;
    }

    /// Requests another frame even when the policy would otherwise idle.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }
}
