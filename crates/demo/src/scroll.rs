use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};
use iso_engine::math::{cos, degrees, radians, sin, MathRandom};
use iso_engine::{
    FrameLogic, MapHandler, RenderBackend, SharedValue, StateManager, TileIndexOffset,
};
use tracing::{debug, info};

const TILE_COLOR: [u8; 4] = [200, 200, 200, 255];
const OVERLAY_EVERY_N_FRAMES: u64 = 30;

/// Position of the view's top-left corner in map pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollState {
    pub offset: Vec2,
    pub velocity: Vec2,
}

impl ScrollState {
    /// Moves by `velocity * dt`, bouncing off `[0, max_scroll]` on each axis.
    pub fn advance(&mut self, dt_seconds: f32, max_scroll: Vec2) {
        let limit = max_scroll.max(Vec2::ZERO);
        let mut next = self.offset + self.velocity * dt_seconds;
        for axis in 0..2 {
            if next[axis] < 0.0 {
                next[axis] = -next[axis];
                self.velocity[axis] = self.velocity[axis].abs();
            } else if next[axis] > limit[axis] {
                next[axis] = 2.0 * limit[axis] - next[axis];
                self.velocity[axis] = -self.velocity[axis].abs();
            }
        }
        self.offset = next.clamp(Vec2::ZERO, limit);
    }
}

/// Velocity of `speed` along a random heading kept 15 to 75 degrees away from
/// the axes, so the scroll crosses both rows and columns.
pub fn initial_velocity(speed: f32, rng: &mut MathRandom) -> Vec2 {
    let quadrant = rng.int(3) as f32 * 90.0;
    let heading = radians(quadrant + rng.float_between(15.0, 75.0));
    info!(heading_degrees = degrees(heading), speed, "scroll_heading");
    Vec2::new(cos(heading), sin(heading)) * speed
}

/// Scrolls across the map, publishing the scroll state through the frame
/// protocol and resolving it to a tile on every render.
pub struct ScrollLogic {
    handler: MapHandler,
    scroll: Rc<SharedValue<ScrollState>>,
    projection: Mat4,
    rendered_frames: u64,
    last_tile: Option<TileIndexOffset>,
}

impl ScrollLogic {
    pub fn new(handler: MapHandler, velocity: Vec2) -> Self {
        let (width, height) = handler
            .view()
            .map(|view| (view.width as f32, view.height as f32))
            .unwrap_or((1.0, 1.0));
        Self {
            handler,
            scroll: Rc::new(SharedValue::new(ScrollState {
                offset: Vec2::ZERO,
                velocity,
            })),
            projection: Mat4::orthographic_rh(0.0, width, -height, 0.0, -1.0, 1.0),
            rendered_frames: 0,
            last_tile: None,
        }
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll.current()
    }

    pub fn last_tile(&self) -> Option<TileIndexOffset> {
        self.last_tile
    }
}

impl FrameLogic for ScrollLogic {
    fn update(&mut self, dt_seconds: f32, state: &mut StateManager) {
        let max_scroll = self
            .handler
            .view()
            .map(|view| view.max_scroll)
            .unwrap_or(Vec2::ZERO);
        state
            .touch(&self.scroll)
            .modify(|scroll| scroll.advance(dt_seconds, max_scroll));
    }

    fn render(&mut self, backend: &mut dyn RenderBackend) {
        let scroll = self.scroll.current();
        let tile = self
            .handler
            .map_to_tile(scroll.offset.x.round() as i32, scroll.offset.y.round() as i32);
        if self.last_tile.map(|last| (last.column, last.row)) != Some((tile.column, tile.row)) {
            debug!(
                x = scroll.offset.x,
                y = scroll.offset.y,
                column = tile.column,
                row = tile.row,
                resolution = ?tile.resolution,
                "scroll_tile_changed"
            );
        }
        self.last_tile = Some(tile);

        let Some(view) = self.handler.view() else {
            return;
        };
        let model = Mat4::from_translation(Vec3::new(
            -view.tile_base.x - tile.offset.x as f32,
            -view.tile_base.y + tile.offset.y as f32,
            0.0,
        ));
        let model_view_projection = self.projection * model;
        backend.draw(view.vertices.mesh(), &model_view_projection, TILE_COLOR);

        if self.rendered_frames % OVERLAY_EVERY_N_FRAMES == 0 {
            self.handler
                .draw_debug_overlay(backend, &self.projection);
        }
        self.rendered_frames += 1;
    }
}
