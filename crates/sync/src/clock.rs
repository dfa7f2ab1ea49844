/// Where the frame loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopState {
    /// No frame seen yet.
    Idle,
    /// At least one frame seen; `previous_ms` is its timestamp.
    Stepping { previous_ms: f64 },
}

/// Turns frame timestamps into deltas.
///
/// The first timestamp establishes the baseline and yields a zero delta.
/// Timestamps that go backwards yield zero as well.
#[derive(Debug, Clone)]
pub struct FrameClock {
    state: LoopState,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Record a frame at `timestamp_ms` and return seconds since the previous one.
    pub fn tick(&mut self, timestamp_ms: f64) -> f32 {
        self.frames += 1;
        if !timestamp_ms.is_finite() {
            tracing::warn!(timestamp_ms, "non-finite frame timestamp ignored");
            return 0.0;
        }
        let delta_ms = match self.state {
            LoopState::Idle => 0.0,
            LoopState::Stepping { previous_ms } => (timestamp_ms - previous_ms).max(0.0),
        };
        self.state = LoopState::Stepping {
            previous_ms: timestamp_ms,
        };
        (delta_ms * 0.001) as f32
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_zero_baseline() {
        let mut c = FrameClock::new();
        assert_eq!(c.state(), LoopState::Idle);
        assert_eq!(c.tick(12_345.0), 0.0);
        assert_eq!(
            c.state(),
            LoopState::Stepping {
                previous_ms: 12_345.0
            }
        );
    }

    #[test]
    fn later_ticks_return_seconds() {
        let mut c = FrameClock::new();
        c.tick(1000.0);
        assert!((c.tick(1016.0) - 0.016).abs() < 1e-6);
        assert!((c.tick(1516.0) - 0.5).abs() < 1e-6);
        assert_eq!(c.frames(), 3);
    }

    #[test]
    fn backwards_time_yields_zero() {
        let mut c = FrameClock::new();
        c.tick(500.0);
        assert_eq!(c.tick(400.0), 0.0);
        assert!((c.tick(450.0) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn non_finite_timestamp_is_ignored() {
        let mut c = FrameClock::new();
        c.tick(100.0);
        assert_eq!(c.tick(f64::NAN), 0.0);
        assert!((c.tick(200.0) - 0.1).abs() < 1e-6);
    }
}
