use glam::Mat4;
use tracing::{debug, info};

use crate::app::{
    overlay_transform, RenderBackend, Viewport, OVERLAY_DIMENSION_COLOR,
    OVERLAY_TILED_WINDOW_COLOR, OVERLAY_WINDOW_COLOR,
};
use crate::mesh::{create_sprite, create_wireframe, Mesh};

use super::transform::{map_to_tile, TileIndexOffset};
use super::view::{compute_view_window, Camera, ViewError, ViewOptions, ViewWindow};
use super::{MapSpace, TileGridSpec};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewInputs {
    viewport: Viewport,
    camera: Camera,
    options: ViewOptions,
}

/// Owns a map's grid, its derived isometric space and the current view.
#[derive(Debug, Clone)]
pub struct MapHandler {
    grid: TileGridSpec,
    space: MapSpace,
    wire_window: Mesh,
    view: Option<ViewWindow>,
    last_inputs: Option<ViewInputs>,
}

impl MapHandler {
    pub fn new(grid: TileGridSpec) -> Self {
        Self {
            space: MapSpace::from_grid(&grid),
            grid,
            wire_window: create_wireframe(&create_sprite(1.0, 1.0)),
            view: None,
            last_inputs: None,
        }
    }

    pub fn grid(&self) -> &TileGridSpec {
        &self.grid
    }

    pub fn space(&self) -> MapSpace {
        self.space
    }

    pub fn view(&self) -> Option<&ViewWindow> {
        self.view.as_ref()
    }

    /// Rebuilds the view unconditionally. On error the previous view is kept.
    pub fn build_view(
        &mut self,
        viewport: Viewport,
        camera: &Camera,
        options: &ViewOptions,
    ) -> Result<&ViewWindow, ViewError> {
        let window = compute_view_window(&self.grid, viewport.aspect_ratio(), camera, options)?;
        info!(
            screen_width = viewport.width,
            screen_height = viewport.height,
            policy = ?options.fill_screen_type,
            width = window.width,
            height = window.height,
            columns = window.visible_columns,
            rows = window.visible_rows,
            distance = window.distance_from_viewer,
            "view_built"
        );
        self.last_inputs = Some(ViewInputs {
            viewport,
            camera: *camera,
            options: *options,
        });
        Ok(&*self.view.insert(window))
    }

    /// Rebuilds only if the inputs differ from the last successful build.
    /// Returns whether a rebuild happened.
    pub fn ensure_view(
        &mut self,
        viewport: Viewport,
        camera: &Camera,
        options: &ViewOptions,
    ) -> Result<bool, ViewError> {
        let inputs = ViewInputs {
            viewport,
            camera: *camera,
            options: *options,
        };
        if self.view.is_some() && self.last_inputs == Some(inputs) {
            return Ok(false);
        }
        self.build_view(viewport, camera, options)?;
        Ok(true)
    }

    pub fn map_to_tile(&self, x: i32, y: i32) -> TileIndexOffset {
        map_to_tile(&self.grid, x, y)
    }

    /// Outlines the square dimension, the window and the tiled window.
    pub fn draw_debug_overlay(&self, backend: &mut dyn RenderBackend, model_view_projection: &Mat4) {
        let Some(view) = self.view.as_ref() else {
            debug!("debug_overlay_skipped_no_view");
            return;
        };

        let rects = [
            (view.dimension, view.dimension, OVERLAY_DIMENSION_COLOR),
            (view.width as f32, view.height as f32, OVERLAY_WINDOW_COLOR),
            (view.tiled_width, view.tiled_height, OVERLAY_TILED_WINDOW_COLOR),
        ];
        for (width, height, color) in rects {
            let transform = overlay_transform(model_view_projection, width, height);
            backend.draw(&self.wire_window, &transform, color);
        }
    }
}
