use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Width over height; infinite for a zero-height surface.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// `model_view_projection * scale(width, height, 1)`, used to stretch the
/// unit wireframe quad over a debug rectangle.
pub fn overlay_transform(model_view_projection: &Mat4, width: f32, height: f32) -> Mat4 {
    *model_view_projection * Mat4::from_scale(Vec3::new(width, height, 1.0))
}
