use std::error::Error;
use std::fmt;
use std::time::Duration;

pub type TimeMs = u64;

const MS_PER_SECOND: TimeMs = 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FpsError {
    InvalidArgument {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },
}

impl fmt::Display for FpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FpsError::InvalidArgument {
                name,
                value,
                reason,
            } => write!(f, "invalid {name} {value}: {reason}"),
        }
    }
}

impl Error for FpsError {}

/// Fixed-length ring of per-second frame counts.
#[derive(Clone, Debug)]
pub struct SecondsWindow {
    slots: Vec<u32>,
}

impl SecondsWindow {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> u32 {
        self.slots[index % self.slots.len()]
    }

    pub fn increment(&mut self, index: usize) {
        let len = self.slots.len();
        let slot = &mut self.slots[index % len];
        *slot = slot.saturating_add(1);
    }

    /// Zeroes the slots after `from` up to and including `to`, wrapping past
    /// the end. `from == to` clears nothing.
    pub fn clear_range(&mut self, from: usize, to: usize) {
        let len = self.slots.len();
        let from = from % len;
        let to = to % len;
        if from < to {
            self.slots[from + 1..=to].fill(0);
        } else if from > to {
            self.slots[from + 1..].fill(0);
            self.slots[..=to].fill(0);
        }
    }

    pub fn clear_all(&mut self) {
        self.slots.fill(0);
    }

    /// Sum of `count` slots ending at `end` (inclusive), walking backward.
    pub fn trailing_sum(&self, end: usize, count: usize) -> u64 {
        let len = self.slots.len();
        let count = count.min(len);
        (0..count)
            .map(|back| self.slots[(end % len + len - back) % len] as u64)
            .sum()
    }
}

/// Rolling frames-per-second counter over a window of whole seconds.
///
/// Call [`FpsCounter::mark_frame_start`] exactly once per rendered frame with
/// a monotonic millisecond timestamp, then query [`FpsCounter::average`].
#[derive(Clone, Debug)]
pub struct FpsCounter {
    window: SecondsWindow,
    active_index: usize,
    active_second: TimeMs,
    last_frame_start: TimeMs,
}

impl FpsCounter {
    pub const MIN_WINDOW_SECONDS: usize = 2;

    pub fn new(window_seconds: usize) -> Result<Self, FpsError> {
        if window_seconds < Self::MIN_WINDOW_SECONDS {
            return Err(FpsError::InvalidArgument {
                name: "window_seconds",
                value: window_seconds,
                reason: "the window must hold at least two seconds",
            });
        }

        Ok(Self {
            window: SecondsWindow::new(window_seconds),
            active_index: 0,
            active_second: 0,
            last_frame_start: 0,
        })
    }

    pub fn ms_per_frame_for(desired_fps: f64) -> f64 {
        1000.0 / desired_fps
    }

    pub fn window_seconds(&self) -> usize {
        self.window.len()
    }

    pub fn mark_frame_start(&mut self, timestamp_ms: TimeMs) {
        self.update_window_index(timestamp_ms);
        self.window.increment(self.active_index);
        self.last_frame_start = timestamp_ms;
    }

    pub fn last_frame_start_time(&self) -> TimeMs {
        self.last_frame_start
    }

    /// Frames counted during the second held by `active_index`.
    pub fn current_second_count(&self) -> u32 {
        self.window.get(self.active_index)
    }

    pub fn average_last_second(&self) -> f64 {
        self.average(1)
    }

    /// Average frames per second over the `over_seconds` most recent seconds,
    /// the active one included. The span is clamped to `1..=N - 1`.
    pub fn average(&self, over_seconds: usize) -> f64 {
        let span = over_seconds.clamp(1, self.window.len() - 1);
        let sum = self.window.trailing_sum(self.active_index, span);
        sum as f64 / span as f64
    }

    /// Average over the `over_seconds` whole seconds before the active one.
    /// The span is clamped to `1..=N - 1`.
    pub fn average_completed(&self, over_seconds: usize) -> f64 {
        let len = self.window.len();
        let span = over_seconds.clamp(1, len - 1);
        let previous = (self.active_index + len - 1) % len;
        let sum = self.window.trailing_sum(previous, span);
        sum as f64 / span as f64
    }

    fn update_window_index(&mut self, timestamp_ms: TimeMs) {
        let second = timestamp_ms / MS_PER_SECOND;
        let len = self.window.len();
        let new_index = (second % len as TimeMs) as usize;

        if second.saturating_sub(self.active_second) >= len as TimeMs {
            // Stalled for a whole window: nothing left is current, including
            // the old active slot that the index rule would keep.
            self.window.clear_all();
        } else if new_index != self.active_index {
            self.window.clear_range(self.active_index, new_index);
        }

        self.active_index = new_index;
        self.active_second = second;
    }
}

/// Frame rate shown to the user. It is resampled once per wall-clock second
/// from whole seconds only, so it never reflects a partially counted second.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisplayedFps {
    value: f64,
}

impl DisplayedFps {
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Marks a frame on `counter`. When the frame opens a new second the value
    /// becomes the average of the `over_seconds` seconds that just ended and
    /// `true` is returned.
    pub fn on_frame_start(
        &mut self,
        counter: &mut FpsCounter,
        timestamp_ms: TimeMs,
        over_seconds: usize,
    ) -> bool {
        let previous_second = counter.last_frame_start_time() / MS_PER_SECOND;
        counter.mark_frame_start(timestamp_ms);
        if timestamp_ms / MS_PER_SECOND == previous_second {
            return false;
        }

        self.value = counter.average_completed(over_seconds);
        true
    }
}

/// Collects frame start times and reports the mean frame time each time the
/// buffer fills up.
#[derive(Clone, Debug)]
pub struct FrameTimeSampler {
    starts: Vec<TimeMs>,
    capacity: usize,
}

impl FrameTimeSampler {
    pub fn new(capacity: usize) -> Result<Self, FpsError> {
        if capacity < 2 {
            return Err(FpsError::InvalidArgument {
                name: "capacity",
                value: capacity,
                reason: "at least two frames are needed to measure a frame time",
            });
        }

        Ok(Self {
            starts: Vec::with_capacity(capacity),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the mean inter-frame time in ms once `capacity` frames were
    /// recorded, then starts over.
    pub fn record(&mut self, frame_start: TimeMs) -> Option<f64> {
        self.starts.push(frame_start);
        if self.starts.len() < self.capacity {
            return None;
        }

        let total: TimeMs = self
            .starts
            .windows(2)
            .map(|pair| pair[1].saturating_sub(pair[0]))
            .sum();
        let mean = total as f64 / (self.capacity - 1) as f64;
        self.starts.clear();
        Some(mean)
    }
}

/// Sleeps off whatever is left of the frame budget for a goal frame rate.
#[derive(Clone, Copy, Debug, Default)]
pub struct FramePacer {
    budget_ms: Option<f64>,
}

impl FramePacer {
    pub fn new(goal_fps: Option<f64>) -> Self {
        Self {
            budget_ms: goal_fps
                .filter(|fps| fps.is_finite() && *fps > 0.0)
                .map(FpsCounter::ms_per_frame_for),
        }
    }

    pub fn remaining(&self, frame_start: TimeMs, now: TimeMs) -> Option<Duration> {
        let budget = self.budget_ms?;
        let spent = now.saturating_sub(frame_start) as f64;
        (spent < budget).then(|| Duration::from_secs_f64((budget - spent) / 1000.0))
    }

    pub fn frame_sleep(&self, frame_start: TimeMs, now: TimeMs) {
        if let Some(sleep) = self.remaining(frame_start, now) {
            log::trace!("sleeping for {:.2} ms", sleep.as_secs_f64() * 1000.0);
            std::thread::sleep(sleep);
        }
    }
}
