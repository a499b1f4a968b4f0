//! Frame protocol and deferred publication of shared values.
//!
//! A frame spans [`StateManager::frame_start`] to [`StateManager::frame_stop`].
//! Logic marks shared values with [`StateManager::touch`]; every value touched
//! since the previous `frame_start` is updated exactly once at the next one and
//! the registration list is cleared. Registrations hold `Rc` clones, so the
//! manager never outlives a frame's worth of ownership and cannot cross
//! threads.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

use super::rendering::RenderBackend;

pub trait SharedData {
    /// Publishes state written during the logic phase.
    fn update(&self);
}

/// Readiness gate of the update scheduler, consulted when a frame stops.
pub trait UpdateReadiness {
    fn is_ready(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

impl UpdateReadiness for AlwaysReady {
    fn is_ready(&self) -> bool {
        true
    }
}

/// Double-buffered value: logic writes the pending copy, `update` publishes it.
#[derive(Debug, Default)]
pub struct SharedValue<T> {
    current: RefCell<T>,
    pending: RefCell<T>,
}

impl<T: Clone> SharedValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: RefCell::new(value.clone()),
            pending: RefCell::new(value),
        }
    }

    pub fn set(&self, value: T) {
        *self.pending.borrow_mut() = value;
    }

    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        f(&mut *self.pending.borrow_mut());
    }

    pub fn pending(&self) -> T {
        self.pending.borrow().clone()
    }

    /// Value as of the last frame start.
    pub fn current(&self) -> T {
        self.current.borrow().clone()
    }
}

impl<T: Clone> SharedData for SharedValue<T> {
    fn update(&self) {
        let next = self.pending.borrow().clone();
        *self.current.borrow_mut() = next;
    }
}

/// `Idle -> FrameStarted -> FrameEnded -> FrameStarted -> ...`
///
/// `Idle` is only the state before the first frame and after [`StateManager::reset`].
/// `FrameEnded` is the resting state between frames: logic touches values in it and
/// `frame_start` leaves it the same way it leaves `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FramePhase {
    #[default]
    Idle,
    FrameStarted,
    FrameEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameProtocolError {
    #[error("frame_start called while frame {frame} is still open")]
    FrameAlreadyStarted { frame: u64 },
    #[error("frame_stop called in phase {phase:?} without an open frame")]
    FrameNotStarted { phase: FramePhase },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub duration: Duration,
    /// Shared values published by this frame's `frame_start`.
    pub flushed: usize,
    pub updates_ready: bool,
}

#[derive(Default)]
pub struct StateManager {
    pending: Vec<Rc<dyn SharedData>>,
    phase: FramePhase,
    frame_index: u64,
    frame_started_at: Option<Instant>,
    flushed_this_frame: usize,
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("pending", &self.pending.len())
            .field("phase", &self.phase)
            .field("frame_index", &self.frame_index)
            .finish()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Number of frames started so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Registers `value` for publication at the next frame start and hands it
    /// back. Touching the same value again before then is a no-op.
    pub fn touch<'a, E: SharedData + 'static>(&mut self, value: &'a Rc<E>) -> &'a Rc<E> {
        let target = Rc::as_ptr(value) as *const ();
        let already_pending = self
            .pending
            .iter()
            .any(|entry| Rc::as_ptr(entry) as *const () == target);
        if !already_pending {
            let entry: Rc<dyn SharedData> = Rc::clone(value) as Rc<dyn SharedData>;
            self.pending.push(entry);
        }
        value
    }

    /// Opens a frame and publishes everything touched since the previous one.
    /// Returns how many values were published.
    pub fn frame_start(
        &mut self,
        backend: &mut dyn RenderBackend,
    ) -> Result<usize, FrameProtocolError> {
        if self.phase == FramePhase::FrameStarted {
            return Err(FrameProtocolError::FrameAlreadyStarted {
                frame: self.frame_index,
            });
        }

        backend.on_draw_frame_begin();
        self.frame_started_at = Some(Instant::now());
        self.frame_index = self.frame_index.saturating_add(1);
        self.phase = FramePhase::FrameStarted;

        let batch = std::mem::take(&mut self.pending);
        for datum in &batch {
            datum.update();
        }
        self.flushed_this_frame = batch.len();
        trace!(
            frame = self.frame_index,
            flushed = self.flushed_this_frame,
            "frame_start"
        );
        Ok(self.flushed_this_frame)
    }

    pub fn frame_stop(
        &mut self,
        backend: &mut dyn RenderBackend,
        scheduler: &dyn UpdateReadiness,
    ) -> Result<FrameReport, FrameProtocolError> {
        if self.phase != FramePhase::FrameStarted {
            return Err(FrameProtocolError::FrameNotStarted { phase: self.phase });
        }

        let updates_ready = scheduler.is_ready();
        if !updates_ready {
            debug!(frame = self.frame_index, "update_scheduler_not_ready");
        }
        let duration = self
            .frame_started_at
            .take()
            .map(|started| Instant::now().saturating_duration_since(started))
            .unwrap_or_default();

        backend.on_draw_frame_end();
        self.phase = FramePhase::FrameEnded;

        let report = FrameReport {
            frame: self.frame_index,
            duration,
            flushed: self.flushed_this_frame,
            updates_ready,
        };
        trace!(
            frame = report.frame,
            duration_us = report.duration.as_micros() as u64,
            "frame_stop"
        );
        Ok(report)
    }

    /// Back to `Idle`, dropping pending registrations without publishing them.
    pub fn reset(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        self.phase = FramePhase::Idle;
        self.frame_started_at = None;
        self.flushed_this_frame = 0;
        if dropped > 0 {
            debug!(dropped, "state_manager_reset");
        }
    }
}
