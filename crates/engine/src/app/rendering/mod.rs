mod backend;
mod transform;

#[cfg(test)]
pub(crate) use backend::RecordingBackend;
pub use backend::RenderBackend;
pub use transform::{overlay_transform, Viewport};

pub const OVERLAY_DIMENSION_COLOR: [u8; 4] = [0, 255, 0, 255];
pub const OVERLAY_WINDOW_COLOR: [u8; 4] = [255, 0, 0, 255];
pub const OVERLAY_TILED_WINDOW_COLOR: [u8; 4] = [0, 0, 255, 255];
