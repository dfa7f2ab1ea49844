use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tumble_scene::Renderer;

use crate::context::{AppContext, FrameReport};
use crate::error::SyncError;
use crate::timer::FrameTimer;

/// Shared flag that ends a [`FrameLoop`]. Clones observe the same flag and
/// may be triggered from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Supplies frame timestamps in milliseconds. `None` ends the loop.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<f64>;
}

/// Wall-clock frames paced to a target rate.
#[derive(Debug)]
pub struct RealtimeFrames {
    interval: Duration,
    start: Instant,
    next_deadline: Instant,
    remaining: Option<u64>,
}

impl RealtimeFrames {
    pub fn new(fps: f32) -> Self {
        let start = Instant::now();
        Self {
            interval: frame_interval(fps),
            start,
            next_deadline: start,
            remaining: None,
        }
    }

    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameSource for RealtimeFrames {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(left) = self.remaining.as_mut() {
            *left = left.checked_sub(1)?;
        }
        let now = Instant::now();
        if self.next_deadline > now {
            std::thread::sleep(self.next_deadline - now);
        }
        // A late frame does not try to catch up.
        self.next_deadline = self.next_deadline.max(now) + self.interval;
        Some(self.start.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Simulated frames at a fixed interval, as fast as the loop can go.
#[derive(Debug, Clone)]
pub struct FixedFrames {
    interval_ms: f64,
    next_ms: f64,
    remaining: Option<u64>,
}

impl FixedFrames {
    pub fn new(fps: f32) -> Self {
        Self {
            interval_ms: frame_interval(fps).as_secs_f64() * 1000.0,
            next_ms: 0.0,
            remaining: None,
        }
    }

    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameSource for FixedFrames {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(left) = self.remaining.as_mut() {
            *left = left.checked_sub(1)?;
        }
        let ts = self.next_ms;
        self.next_ms += self.interval_ms;
        Some(ts)
    }
}

/// An explicit list of timestamps.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrames {
    timestamps: VecDeque<f64>,
}

impl ScriptedFrames {
    pub fn new(timestamps: impl IntoIterator<Item = f64>) -> Self {
        Self {
            timestamps: timestamps.into_iter().collect(),
        }
    }
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> Option<f64> {
        self.timestamps.pop_front()
    }
}

fn frame_interval(fps: f32) -> Duration {
    if fps.is_finite() && fps > 0.0 {
        Duration::from_secs_f64(1.0 / fps as f64)
    } else {
        Duration::from_secs_f64(1.0 / 60.0)
    }
}

/// Totals for one [`FrameLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    pub frames: u64,
    pub simulated_seconds: f64,
    pub sub_steps: u64,
    /// True when the stop token ended the loop, false when the source ran dry.
    pub stopped: bool,
    pub average_frame_time: Duration,
    pub max_frame_time: Duration,
}

/// Drives an [`AppContext`] one frame at a time: step, sync, render, present.
pub struct FrameLoop<S> {
    source: S,
    stop: StopToken,
    timer: FrameTimer,
}

impl<S: FrameSource> FrameLoop<S> {
    pub fn new(source: S, stop: StopToken) -> Self {
        Self {
            source,
            stop,
            timer: FrameTimer::default(),
        }
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Run until the stop token fires or the source is exhausted.
    ///
    /// The token is checked before each frame, so a stop requested from
    /// `present` takes effect after the frame in flight. A step or sync
    /// failure is logged and returned.
    pub fn run<R, P>(
        &mut self,
        ctx: &mut AppContext,
        renderer: &R,
        mut present: P,
    ) -> Result<LoopSummary, SyncError>
    where
        R: Renderer,
        P: FnMut(&FrameReport, R::Output),
    {
        let _span = tracing::info_span!("frame_loop").entered();
        let mut frames = 0u64;
        let mut simulated_seconds = 0.0f64;
        let mut sub_steps = 0u64;
        let mut stopped = false;

        loop {
            if self.stop.is_stopped() {
                stopped = true;
                break;
            }
            let Some(timestamp_ms) = self.source.next_frame() else {
                break;
            };

            let frame_start = Instant::now();
            let report = ctx.frame(timestamp_ms).inspect_err(|e| {
                tracing::error!(error = %e, frame = frames + 1, "frame failed");
            })?;
            let output = renderer.render(ctx.scene(), ctx.view());
            self.timer.record(frame_start.elapsed());

            frames += 1;
            simulated_seconds += report.step.simulated_seconds as f64;
            sub_steps += report.step.sub_steps as u64;
            tracing::trace!(
                frame = report.frame,
                delta = report.delta_seconds,
                sub_steps = report.step.sub_steps,
                synced = report.synced,
                "frame done"
            );
            present(&report, output);
        }

        let summary = LoopSummary {
            frames,
            simulated_seconds,
            sub_steps,
            stopped,
            average_frame_time: self.timer.average(),
            max_frame_time: self.timer.max(),
        };
        tracing::info!(
            frames,
            simulated_seconds,
            sub_steps,
            stopped,
            avg_frame_us = summary.average_frame_time.as_micros() as u64,
            "frame loop finished"
        );
        Ok(summary)
    }
}
