use std::time::Duration;

/// Ring buffer of recent frame durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: Vec<Duration>,
    capacity: usize,
    next: usize,
    total_frames: u64,
}

impl FrameTimer {
    /// Keep the last `capacity` frames (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            total_frames: 0,
        }
    }

    pub fn record(&mut self, frame_time: Duration) {
        if self.samples.len() < self.capacity {
            self.samples.push(frame_time);
        } else {
            self.samples[self.next] = frame_time;
        }
        self.next = (self.next + 1) % self.capacity;
        self.total_frames += 1;
    }

    /// Frames recorded since creation, including those evicted from the window.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        self.samples.iter().sum::<Duration>() / self.samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().copied().min().unwrap_or_default()
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(120)
    }
}
