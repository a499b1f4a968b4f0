use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{clamp_i, z_distance_for_square};
use crate::mesh::{build_staggered_vertex_buffer, VertexBuffer};

use super::{MapSpace, TileGridSpec};

/// Extra tiles added on each axis so partially visible edge tiles are resident.
pub const WINDOW_BORDER_TILES: u32 = 2;

pub const DEFAULT_FIELD_OF_VIEW_DEGREES: f32 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillScreenType {
    #[default]
    FillHeight,
    FillCustomHeight,
    FillWidth,
    FillCustomWidth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub fill_screen_type: FillScreenType,
    /// Tile count driving the CUSTOM fill policies.
    pub visible_tiles: u32,
    pub visible_percentage: f32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            fill_screen_type: FillScreenType::FillHeight,
            visible_tiles: 10,
            visible_percentage: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub field_of_view_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            field_of_view_degrees: DEFAULT_FIELD_OF_VIEW_DEGREES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ViewError {
    #[error("aspect ratio must be finite and > 0, got {0}")]
    InvalidAspectRatio(f32),
    #[error("field of view must be within (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),
    #[error("visible percentage must be finite and > 0, got {0}")]
    InvalidVisiblePercentage(f32),
    #[error("{policy:?} requires visible_tiles > 0")]
    MissingVisibleTiles { policy: FillScreenType },
    #[error("{policy:?} produced a window too large for i32 pixel coordinates")]
    WindowOverflow { policy: FillScreenType },
    #[error("{policy:?} produced a degenerate {width}x{height} window")]
    DegenerateWindow {
        policy: FillScreenType,
        width: i32,
        height: i32,
    },
}

/// Visible portion of the map and the geometry needed to draw it.
///
/// Built by [`compute_view_window`] when the fill policy, screen or grid
/// changes; read-only between rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewWindow {
    /// Window size in screen-space pixels.
    pub width: i32,
    pub height: i32,
    /// Side of the square enclosing the window, scaled by the visible percentage.
    pub dimension: f32,
    /// Visible tiles after clamping to the map, before border inflation.
    pub visible_columns: u32,
    pub visible_rows: u32,
    /// Resident tiles including [`WINDOW_BORDER_TILES`].
    pub tile_columns: u32,
    pub tile_rows: u32,
    /// Window extent in isometric map pixels.
    pub iso_width: f32,
    pub iso_height: f32,
    pub center: Vec2,
    /// Scroll limits in map pixels; negative when the window exceeds the map.
    pub max_scroll: Vec2,
    pub distance_from_viewer: f32,
    /// Screen-space size of the resident tile mesh.
    pub tiled_width: f32,
    pub tiled_height: f32,
    /// Offset from the tile mesh origin to the visible window origin.
    pub tile_base: Vec2,
    pub vertices: VertexBuffer,
}

pub fn compute_view_window(
    grid: &TileGridSpec,
    aspect_ratio: f32,
    camera: &Camera,
    options: &ViewOptions,
) -> Result<ViewWindow, ViewError> {
    validate_inputs(aspect_ratio, camera, options)?;

    let tile_width = grid.tile_width();
    let tile_height = grid.tile_height();
    let map_columns = grid.columns() as i32;
    let map_rows = grid.rows() as i32;
    let policy = options.fill_screen_type;

    let overflow = ViewError::WindowOverflow { policy };
    let (width, height, columns, rows) = match policy {
        FillScreenType::FillHeight | FillScreenType::FillCustomHeight => {
            let rows = if policy == FillScreenType::FillHeight {
                map_rows
            } else {
                i32::try_from(options.visible_tiles).map_err(|_| overflow)?
            };
            let height = to_pixels(rows as f32 * tile_height as f32 * 0.5).ok_or(overflow)?;
            let width = to_pixels(height as f32 * aspect_ratio).ok_or(overflow)?;
            (width, height, width / tile_width, rows)
        }
        FillScreenType::FillWidth | FillScreenType::FillCustomWidth => {
            let columns = if policy == FillScreenType::FillWidth {
                map_columns
            } else {
                i32::try_from(options.visible_tiles).map_err(|_| overflow)?
            };
            let width = columns.checked_mul(tile_width).ok_or(overflow)?;
            let height = to_pixels(width as f32 / aspect_ratio).ok_or(overflow)?;
            (width, height, columns, height / tile_height)
        }
    };

    if width <= 0 || height <= 0 {
        return Err(ViewError::DegenerateWindow {
            policy,
            width,
            height,
        });
    }

    let visible_columns = clamp_i(columns, 0, map_columns) as u32;
    let visible_rows = clamp_i(rows, 0, map_rows) as u32;

    let iso_tile_size = grid.iso_tile_size() as f32;
    let iso_width = visible_columns as f32 * iso_tile_size;
    let iso_height = visible_rows as f32 * iso_tile_size;
    let space = MapSpace::from_grid(grid);
    let max_scroll = Vec2::new(
        space.width as f32 - iso_width,
        space.height as f32 - iso_height,
    );

    let dimension = width.max(height) as f32 * options.visible_percentage;
    let distance_from_viewer = z_distance_for_square(camera.field_of_view_degrees, dimension);
    let center = Vec2::new(width as f32 * 0.5, height as f32 * 0.5);

    let tile_columns = visible_columns + WINDOW_BORDER_TILES;
    let tile_rows = visible_rows + WINDOW_BORDER_TILES;
    let vertices = build_staggered_vertex_buffer(tile_rows, tile_columns, tile_width, tile_height);

    let tiled_width = tile_columns as f32 * tile_width as f32;
    let tiled_height = tile_rows as f32 * tile_height as f32 * 0.5;
    let tile_base = Vec2::new(tiled_width - width as f32, tiled_height - height as f32) * 0.5;

    Ok(ViewWindow {
        width,
        height,
        dimension,
        visible_columns,
        visible_rows,
        tile_columns,
        tile_rows,
        iso_width,
        iso_height,
        center,
        max_scroll,
        distance_from_viewer,
        tiled_width,
        tiled_height,
        tile_base,
        vertices,
    })
}

/// Rounds to whole pixels, or `None` outside the `i32` range.
fn to_pixels(value: f32) -> Option<i32> {
    let rounded = value.round();
    // i32::MAX is not representable in f32; 2^31 is the first value past it.
    (rounded >= i32::MIN as f32 && rounded < 2_147_483_648.0).then_some(rounded as i32)
}

fn validate_inputs(
    aspect_ratio: f32,
    camera: &Camera,
    options: &ViewOptions,
) -> Result<(), ViewError> {
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(ViewError::InvalidAspectRatio(aspect_ratio));
    }
    let fov = camera.field_of_view_degrees;
    if !fov.is_finite() || fov <= 0.0 || fov >= 180.0 {
        return Err(ViewError::InvalidFieldOfView(fov));
    }
    let percentage = options.visible_percentage;
    if !percentage.is_finite() || percentage <= 0.0 {
        return Err(ViewError::InvalidVisiblePercentage(percentage));
    }
    let policy = options.fill_screen_type;
    let is_custom = matches!(
        policy,
        FillScreenType::FillCustomHeight | FillScreenType::FillCustomWidth
    );
    if is_custom && options.visible_tiles == 0 {
        return Err(ViewError::MissingVisibleTiles { policy });
    }
    Ok(())
}
