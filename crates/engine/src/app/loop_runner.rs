use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::frame_state::{FrameProtocolError, FrameReport, StateManager, UpdateReadiness};
use super::metrics::MetricsAccumulator;
use super::rendering::RenderBackend;
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
        }
    }
}

/// Per-frame hooks driven by [`FrameLoop`].
pub trait FrameLogic {
    /// Fixed-step logic; shared values written here are registered with
    /// `state.touch` and become visible at the next frame start.
    fn update(&mut self, dt_seconds: f32, state: &mut StateManager);

    fn render(&mut self, backend: &mut dyn RenderBackend);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub ticks: u64,
    pub flushed: u64,
    pub frames_not_ready: u64,
}

/// Owns the frame's [`StateManager`] and drives logic ticks and frames.
#[derive(Debug)]
pub struct FrameLoop {
    state: StateManager,
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    render_frame_target: Option<Duration>,
    accumulator: Duration,
    last_frame_instant: Option<Instant>,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
    summary: LoopSummary,
}

impl FrameLoop {
    pub fn new(config: &LoopConfig, metrics_handle: MetricsHandle) -> Self {
        let target_tps = config.target_tps.max(1);
        let max_frame_delta =
            normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
        let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
        let metrics_log_interval =
            normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
        let render_cap = normalize_render_fps_cap(config.max_render_fps);

        info!(
            target_tps,
            max_frame_delta_ms = max_frame_delta.as_millis() as u64,
            max_ticks_per_frame,
            metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
            render_fps_cap = %format_render_cap(render_cap),
            "loop_config"
        );

        Self {
            state: StateManager::new(),
            fixed_dt: Duration::from_secs_f64(1.0 / target_tps as f64),
            max_frame_delta,
            max_ticks_per_frame,
            render_frame_target: target_frame_duration(render_cap),
            accumulator: Duration::ZERO,
            last_frame_instant: None,
            metrics: MetricsAccumulator::new(metrics_log_interval, Instant::now()),
            metrics_handle,
            summary: LoopSummary::default(),
        }
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateManager {
        &mut self.state
    }

    pub fn summary(&self) -> LoopSummary {
        self.summary
    }

    pub fn run(
        &mut self,
        frames: u64,
        logic: &mut dyn FrameLogic,
        backend: &mut dyn RenderBackend,
        scheduler: &dyn UpdateReadiness,
    ) -> Result<LoopSummary, FrameProtocolError> {
        let mut last_present_instant = Instant::now();
        for _ in 0..frames {
            let elapsed = Instant::now().saturating_duration_since(last_present_instant);
            let cap_sleep = compute_cap_sleep(elapsed, self.render_frame_target);
            if cap_sleep > Duration::ZERO {
                thread::sleep(cap_sleep);
            }

            self.frame_at(Instant::now(), logic, backend, scheduler)?;
            last_present_instant = Instant::now();
        }
        Ok(self.summary)
    }

    /// One iteration: logic ticks owed up to `now`, then a full frame.
    pub fn frame_at(
        &mut self,
        now: Instant,
        logic: &mut dyn FrameLogic,
        backend: &mut dyn RenderBackend,
        scheduler: &dyn UpdateReadiness,
    ) -> Result<FrameReport, FrameProtocolError> {
        let raw_frame_dt = self
            .last_frame_instant
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame_instant = Some(now);

        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(clamped_frame_dt);

        let step_plan = plan_sim_steps(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        let fixed_dt_seconds = self.fixed_dt.as_secs_f32();
        for _ in 0..step_plan.ticks_to_run {
            logic.update(fixed_dt_seconds, &mut self.state);
        }
        self.metrics.record_ticks(step_plan.ticks_to_run);
        self.accumulator = step_plan.remaining_accumulator;
        self.summary.ticks += u64::from(step_plan.ticks_to_run);

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        self.state.frame_start(backend)?;
        logic.render(backend);
        let report = self.state.frame_stop(backend, scheduler)?;

        self.summary.frames += 1;
        self.summary.flushed += report.flushed as u64;
        if !report.updates_ready {
            self.summary.frames_not_ready += 1;
        }

        self.metrics.record_frame(&report);
        if let Some(snapshot) = self.metrics.maybe_snapshot(now) {
            self.metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_busy_ms = snapshot.frame_busy_ms,
                flushed_per_frame = snapshot.flushed_per_frame,
                frames_not_ready = snapshot.frames_not_ready,
                "loop_metrics"
            );
        }

        Ok(report)
    }
}

/// Runs `frames` frames on a fresh [`FrameLoop`].
pub fn run_frames(
    config: &LoopConfig,
    frames: u64,
    logic: &mut dyn FrameLogic,
    backend: &mut dyn RenderBackend,
    scheduler: &dyn UpdateReadiness,
    metrics_handle: MetricsHandle,
) -> Result<LoopSummary, FrameProtocolError> {
    let mut frame_loop = FrameLoop::new(config, metrics_handle);
    let summary = frame_loop.run(frames, logic, backend, scheduler)?;
    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        flushed = summary.flushed,
        frames_not_ready = summary.frames_not_ready,
        "loop_finished"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator -= fixed_dt;
        ticks_to_run += 1;
    }

    // Anything still owed after the cap is dropped rather than carried over.
    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };

    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    cap.map_or_else(|| "off".to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::app::frame_state::{AlwaysReady, SharedValue};
    use crate::app::rendering::RecordingBackend;
    use crate::mesh::{create_sprite, create_wireframe};
    use glam::Mat4;

    struct CounterLogic {
        counter: Rc<SharedValue<u32>>,
        updates: u32,
        rendered: Vec<u32>,
    }

    impl CounterLogic {
        fn new() -> Self {
            Self {
                counter: Rc::new(SharedValue::new(0)),
                updates: 0,
                rendered: Vec::new(),
            }
        }
    }

    impl FrameLogic for CounterLogic {
        fn update(&mut self, _dt_seconds: f32, state: &mut StateManager) {
            self.updates += 1;
            state.touch(&self.counter).modify(|value| *value += 1);
        }

        fn render(&mut self, backend: &mut dyn RenderBackend) {
            self.rendered.push(self.counter.current());
            let wire = create_wireframe(&create_sprite(1.0, 1.0));
            backend.draw(&wire, &Mat4::IDENTITY, [255; 4]);
        }
    }

    fn config_50_tps() -> LoopConfig {
        LoopConfig {
            target_tps: 50,
            ..LoopConfig::default()
        }
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn plan_sim_steps_keeps_partial_remainder() {
        let fixed_dt = Duration::from_millis(20);
        let result = plan_sim_steps(Duration::from_millis(45), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(5));
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn render_cap_helpers() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
        assert_eq!(target_frame_duration(None), None);
        let target = target_frame_duration(Some(60)).expect("duration");
        assert!((target.as_secs_f64() - 1.0 / 60.0).abs() < 0.000_001);
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(20), Some(target)),
            Duration::ZERO
        );
        assert!(compute_cap_sleep(Duration::from_millis(5), Some(target)) > Duration::ZERO);
        assert_eq!(format_render_cap(None), "off");
    }

    #[test]
    fn logic_writes_become_visible_one_frame_later() {
        let mut frame_loop = FrameLoop::new(&config_50_tps(), MetricsHandle::default());
        let mut logic = CounterLogic::new();
        let mut backend = RecordingBackend::default();
        let start = Instant::now();

        // First frame has no elapsed time, so no ticks run.
        frame_loop
            .frame_at(start, &mut logic, &mut backend, &AlwaysReady)
            .expect("frame");
        // 40ms at 50 tps is two ticks; the counter is touched once.
        let report = frame_loop
            .frame_at(
                start + Duration::from_millis(40),
                &mut logic,
                &mut backend,
                &AlwaysReady,
            )
            .expect("frame");

        assert_eq!(logic.updates, 2);
        assert_eq!(report.flushed, 1);
        assert_eq!(logic.rendered, vec![0, 2]);
        assert_eq!(frame_loop.state().pending_len(), 0);
    }

    #[test]
    fn every_frame_is_bracketed_by_begin_and_end() {
        let mut frame_loop = FrameLoop::new(&config_50_tps(), MetricsHandle::default());
        let mut logic = CounterLogic::new();
        let mut backend = RecordingBackend::default();
        let start = Instant::now();

        for frame in 0..10u64 {
            frame_loop
                .frame_at(
                    start + Duration::from_millis(20 * frame),
                    &mut logic,
                    &mut backend,
                    &AlwaysReady,
                )
                .expect("frame");
        }

        let summary = frame_loop.summary();
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.ticks, 9);
        assert_eq!(summary.flushed, 9);
        assert_eq!(backend.begins, 10);
        assert_eq!(backend.ends, 10);
        assert_eq!(backend.draws.len(), 10);
        assert!(!backend.open);
    }

    #[test]
    fn run_accounts_every_touch() {
        let mut frame_loop = FrameLoop::new(&LoopConfig::default(), MetricsHandle::default());
        let mut logic = CounterLogic::new();
        let mut backend = RecordingBackend::default();

        let summary = frame_loop
            .run(5, &mut logic, &mut backend, &AlwaysReady)
            .expect("run");

        assert_eq!(summary.frames, 5);
        let pending = frame_loop.state().pending_len() as u64;
        assert!(pending <= 1);
        // Each frame with ticks touches the counter once.
        assert!(summary.flushed + pending <= summary.ticks);
        assert_eq!(backend.begins, 5);
        assert_eq!(backend.ends, 5);
    }

    #[test]
    fn frame_reports_feed_published_metrics() {
        let handle = MetricsHandle::default();
        let mut frame_loop = FrameLoop::new(&config_50_tps(), handle.clone());
        let mut logic = CounterLogic::new();
        let mut backend = RecordingBackend::default();
        let start = Instant::now();

        frame_loop
            .frame_at(start, &mut logic, &mut backend, &AlwaysReady)
            .expect("frame");
        assert_eq!(handle.snapshot().last_frame, 0);

        // 1.5s clamps to 250ms: the tick cap runs 5 ticks, the counter flushes once.
        frame_loop
            .frame_at(
                start + Duration::from_millis(1500),
                &mut logic,
                &mut backend,
                &AlwaysReady,
            )
            .expect("frame");

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.last_frame, 2);
        assert_eq!(snapshot.frames_not_ready, 0);
        assert!((snapshot.flushed_per_frame - 0.5).abs() < 1e-5);
        assert_eq!(logic.updates, 5);
    }

    struct NeverReady;

    impl UpdateReadiness for NeverReady {
        fn is_ready(&self) -> bool {
            false
        }
    }

    #[test]
    fn run_frames_counts_frames_the_scheduler_was_not_ready_for() {
        let mut logic = CounterLogic::new();
        let mut backend = RecordingBackend::default();
        let config = LoopConfig {
            max_render_fps: Some(0),
            ..LoopConfig::default()
        };

        let summary = run_frames(
            &config,
            3,
            &mut logic,
            &mut backend,
            &NeverReady,
            MetricsHandle::default(),
        )
        .expect("run");

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.frames_not_ready, 3);
    }
}
