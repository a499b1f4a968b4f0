//! Rolling frame metrics built from [`FrameReport`]s.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::frame_state::FrameReport;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    /// Average time between `frame_start` and `frame_stop`.
    pub frame_busy_ms: f32,
    /// Average shared values published per frame start.
    pub flushed_per_frame: f32,
    /// Frames in the window whose update scheduler was not ready.
    pub frames_not_ready: u32,
    pub last_frame: u64,
}

/// Shared read side of the metrics; cloned handles see the same snapshot.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<FrameMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> FrameMetricsSnapshot {
        *self
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: FrameMetricsSnapshot) {
        let mut guard = self.latest.write().unwrap_or_else(|poisoned| {
            warn!(last_frame = snapshot.last_frame, "frame_metrics_lock_poisoned");
            poisoned.into_inner()
        });
        *guard = snapshot;
    }
}

#[derive(Debug, Default)]
struct FrameWindow {
    frames: u32,
    ticks: u32,
    busy: Duration,
    flushed: u64,
    not_ready: u32,
    last_frame: u64,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    interval: Duration,
    window: FrameWindow,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            window_start: now,
            interval,
            window: FrameWindow::default(),
        }
    }

    pub(crate) fn record_ticks(&mut self, ticks: u32) {
        self.window.ticks = self.window.ticks.saturating_add(ticks);
    }

    pub(crate) fn record_frame(&mut self, report: &FrameReport) {
        let window = &mut self.window;
        window.frames = window.frames.saturating_add(1);
        window.busy = window.busy.saturating_add(report.duration);
        window.flushed = window.flushed.saturating_add(report.flushed as u64);
        if !report.updates_ready {
            window.not_ready += 1;
        }
        window.last_frame = report.frame;
    }

    /// Closes the window once `interval` has passed since it opened.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<FrameMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let window = std::mem::take(&mut self.window);
        self.window_start = now;

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frames = window.frames.max(1) as f32;
        Some(FrameMetricsSnapshot {
            fps: window.frames as f32 / seconds,
            tps: window.ticks as f32 / seconds,
            frame_busy_ms: window.busy.as_secs_f32() * 1000.0 / frames,
            flushed_per_frame: window.flushed as f32 / frames,
            frames_not_ready: window.not_ready,
            last_frame: window.last_frame,
        })
    }
}
