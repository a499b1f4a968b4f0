mod frame_state;
mod loop_runner;
mod metrics;
mod rendering;

pub use frame_state::{
    AlwaysReady, FramePhase, FrameProtocolError, FrameReport, SharedData, SharedValue,
    StateManager, UpdateReadiness,
};
pub use loop_runner::{run_frames, FrameLogic, FrameLoop, LoopConfig, LoopSummary};
pub use metrics::{FrameMetricsSnapshot, MetricsHandle};
#[cfg(test)]
pub(crate) use rendering::RecordingBackend;
pub use rendering::{
    overlay_transform, RenderBackend, Viewport, OVERLAY_DIMENSION_COLOR, OVERLAY_TILED_WINDOW_COLOR,
    OVERLAY_WINDOW_COLOR,
};
