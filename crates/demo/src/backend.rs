use glam::{Mat4, Vec4};
use iso_engine::{Mesh, RenderBackend};
use tracing::{debug, trace};

/// Backend that records draw submissions as tracing events instead of
/// talking to a GPU.
#[derive(Debug, Default)]
pub struct TracingBackend {
    frames: u64,
    draws_this_frame: u32,
    segments_this_frame: usize,
    total_draws: u64,
}

impl TracingBackend {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }
}

impl RenderBackend for TracingBackend {
    fn on_draw_frame_begin(&mut self) {
        self.draws_this_frame = 0;
        self.segments_this_frame = 0;
    }

    fn on_draw_frame_end(&mut self) {
        self.frames += 1;
        debug!(
            frame = self.frames,
            draws = self.draws_this_frame,
            segments = self.segments_this_frame,
            "frame_presented"
        );
    }

    fn draw(&mut self, mesh: &Mesh, transform: &Mat4, color: [u8; 4]) {
        self.draws_this_frame += 1;
        self.total_draws += 1;
        self.segments_this_frame += mesh.segment_count();
        let origin = *transform * Vec4::new(0.0, 0.0, 0.0, 1.0);
        trace!(
            vertices = mesh.positions.len(),
            indices = mesh.indices.len(),
            origin_x = origin.x,
            origin_y = origin.y,
            color = ?color,
            "draw"
        );
    }
}
