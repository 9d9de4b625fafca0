use std::time::{Duration, Instant};

use crate::types::Frame;

/// Default interval between animation frames.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(300);

/// Cycles a frame index on a fixed interval.
///
/// Advances on each [`tick`](Self::tick) once the interval has elapsed and
/// catches up if several intervals passed since the last tick.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_count: usize,
    index: usize,
    interval: Duration,
    last_advance: Instant,
}

impl FrameClock {
    pub fn new(frame_count: usize, interval: Duration, now: Instant) -> Self {
        Self {
            frame_count,
            index: 0,
            interval,
            last_advance: now,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if self.frame_count == 0 || self.interval.is_zero() {
            return;
        }
        if let Some(mut dt) = now.checked_duration_since(self.last_advance) {
            while dt >= self.interval {
                self.index = (self.index + 1) % self.frame_count;
                self.last_advance += self.interval;
                dt -= self.interval;
            }
        }
    }

    /// Restart from the first frame.
    pub fn reset(&mut self, now: Instant) {
        self.index = 0;
        self.last_advance = now;
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// A pet's decoded animation plus its playback clock.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Frame>,
    clock: FrameClock,
}

impl Animation {
    pub fn new(frames: Vec<Frame>, interval: Duration, now: Instant) -> Self {
        let clock = FrameClock::new(frames.len(), interval, now);
        Self { frames, clock }
    }

    /// Advance the animation clock.
    pub fn tick(&mut self, now: Instant) {
        self.clock.tick(now);
    }

    /// Returns the current frame, or `None` for an empty animation.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.clock.index())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
