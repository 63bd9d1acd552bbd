// src/time.rs
//! Fixed-timestep driver for the physics world.
//!
//! Frame deltas are clamped, accumulated, and consumed in fixed slices; at
//! most `max_steps` slices run per frame so a slow frame cannot snowball
//! into ever longer catch-up work.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    fixed_dt: f32,
    accumulator: f32,
    max_steps: u32,
    max_frame_delta: f32,
    total_steps: u64,
}

impl Default for FixedTimestep {
    #[inline(always)]
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl FixedTimestep {
    pub const DEFAULT_MAX_STEPS: u32 = 5;
    /// 4 FPS minimum before clamping
    pub const DEFAULT_MAX_FRAME_DELTA: f32 = 0.25;

    /// Non-positive or non-finite steps fall back to 1/60 s.
    pub fn new(fixed_dt: f32) -> Self {
        let fixed_dt = if fixed_dt.is_finite() && fixed_dt > 0.0 { fixed_dt } else { 1.0 / 60.0 };
        Self {
            fixed_dt,
            accumulator: 0.0,
            max_steps: Self::DEFAULT_MAX_STEPS,
            max_frame_delta: Self::DEFAULT_MAX_FRAME_DELTA,
            total_steps: 0,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_max_frame_delta(mut self, max_frame_delta: f32) -> Self {
        self.max_frame_delta = max_frame_delta.max(self.fixed_dt);
        self
    }

    #[inline(always)]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    #[inline(always)]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Add one frame's worth of time. Negative or NaN deltas are ignored.
    #[inline(always)]
    pub fn accumulate(&mut self, frame_dt: f32) {
        if frame_dt.is_nan() || frame_dt <= 0.0 {
            return;
        }
        self.accumulator += frame_dt.min(self.max_frame_delta);
    }

    /// Fixed steps due this frame.
    /// Usage: `for dt in timestep.steps() { world.step(dt, &mut scene); }`
    pub fn steps(&mut self) -> FixedTimestepIter<'_> {
        let max_steps = self.max_steps;
        FixedTimestepIter {
            timestep: self,
            remaining: max_steps,
        }
    }

    /// Interpolation factor between the last two physics states, in [0, 1).
    #[inline(always)]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.fixed_dt).clamp(0.0, 1.0)
    }
}

/// Fixed timestep iterator (zero-allocation, safe catch-up).
pub struct FixedTimestepIter<'a> {
    timestep: &'a mut FixedTimestep,
    remaining: u32,
}

impl Iterator for FixedTimestepIter<'_> {
    type Item = f32;

    #[inline(always)]
    fn next(&mut self) -> Option<f32> {
        let ts = &mut *self.timestep;
        if ts.accumulator < ts.fixed_dt {
            return None;
        }
        if self.remaining == 0 {
            // Out of budget: keep less than one step so the next frame
            // does not start behind.
            let before = ts.accumulator;
            ts.accumulator %= ts.fixed_dt;
            let dropped = before - ts.accumulator;
            debug!("fixed timestep dropped {:.4}s of simulation time", dropped);
            return None;
        }
        ts.accumulator -= ts.fixed_dt;
        ts.total_steps += 1;
        self.remaining -= 1;
        Some(ts.fixed_dt)
    }
}

/// Scoped tracing timer: runs `$block` inside an info span and reports how
/// long it took at debug level.
#[macro_export]
macro_rules! timed {
    ($name:literal, $block:expr) => {{
        let _span = ::tracing::info_span!($name).entered();
        let start = ::std::time::Instant::now();
        let result = $block;
        let elapsed = start.elapsed().as_secs_f32();
        ::tracing::debug!(?elapsed, concat!($name, " took"));
        result
    }};
}
