use glam::Mat4;

use crate::mesh::Mesh;

/// Drawing surface driven by the frame protocol.
///
/// Implementations are expected on the thread that owns the frame loop.
pub trait RenderBackend {
    fn on_draw_frame_begin(&mut self);
    fn on_draw_frame_end(&mut self);
    fn draw(&mut self, mesh: &Mesh, transform: &Mat4, color: [u8; 4]);
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub(crate) segments: usize,
    pub(crate) transform: Mat4,
    pub(crate) color: [u8; 4],
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub(crate) begins: u32,
    pub(crate) ends: u32,
    pub(crate) draws: Vec<DrawCall>,
    pub(crate) open: bool,
}

#[cfg(test)]
impl RenderBackend for RecordingBackend {
    fn on_draw_frame_begin(&mut self) {
        assert!(!self.open, "frame begin while drawing");
        self.open = true;
        self.begins += 1;
    }

    fn on_draw_frame_end(&mut self) {
        assert!(self.open, "frame end without begin");
        self.open = false;
        self.ends += 1;
    }

    fn draw(&mut self, mesh: &Mesh, transform: &Mat4, color: [u8; 4]) {
        self.draws.push(DrawCall {
            segments: mesh.segment_count(),
            transform: *transform,
            color,
        });
    }
}
