mod handler;
mod tmx;
mod transform;
mod view;

use thiserror::Error;

pub use handler::MapHandler;
pub use tmx::{load_tmx_file, TmxError};
pub use transform::{
    diamond_to_staggered, map_to_diamond, map_to_tile, staggered_to_diamond, tile_center_in_map,
    TileIndexOffset, TileResolution,
};
pub use view::{
    compute_view_window, Camera, FillScreenType, ViewError, ViewOptions, ViewWindow,
    WINDOW_BORDER_TILES,
};

/// Tile layout of a staggered isometric map.
///
/// The transform math assumes 2:1 diamonds (`tile_width == 2 * tile_height`)
/// with even pixel sizes; this is the Tiled default and is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileGridSpec {
    tile_width: i32,
    tile_height: i32,
    columns: u32,
    rows: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("tile size must be positive, got {width}x{height}")]
    NonPositiveTileSize { width: i32, height: i32 },
    #[error("map must have at least one row and column, got {columns}x{rows}")]
    EmptyGrid { columns: u32, rows: u32 },
    #[error("{columns}x{rows} tiles of {tile_width}x{tile_height} overflow i32 pixel extents")]
    ExtentOverflow {
        columns: u32,
        rows: u32,
        tile_width: i32,
        tile_height: i32,
    },
}

impl TileGridSpec {
    pub fn new(
        tile_width: i32,
        tile_height: i32,
        columns: u32,
        rows: u32,
    ) -> Result<Self, GridError> {
        if tile_width <= 0 || tile_height <= 0 {
            return Err(GridError::NonPositiveTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyGrid { columns, rows });
        }
        let tile_extent = tile_width.max(tile_height);
        let fits = |count: u32| {
            i32::try_from(count)
                .ok()
                .and_then(|count| count.checked_mul(tile_extent))
                .is_some()
        };
        if !fits(columns) || !fits(rows) {
            return Err(GridError::ExtentOverflow {
                columns,
                rows,
                tile_width,
                tile_height,
            });
        }
        Ok(Self {
            tile_width,
            tile_height,
            columns,
            rows,
        })
    }

    pub fn tile_width(&self) -> i32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> i32 {
        self.tile_height
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge of a tile in the map's isometric coordinate system.
    pub fn iso_tile_size(&self) -> i32 {
        self.tile_height
    }

    pub fn contains(&self, column: i32, row: i32) -> bool {
        column >= 0 && row >= 0 && (column as u32) < self.columns && (row as u32) < self.rows
    }
}

/// Map extent in isometric map pixels, derived once from the grid.
///
/// Cannot overflow: [`TileGridSpec::new`] bounds `count * tile size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSpace {
    pub width: i32,
    pub height: i32,
}

impl MapSpace {
    pub fn from_grid(grid: &TileGridSpec) -> Self {
        let iso = grid.iso_tile_size();
        Self {
            width: grid.columns() as i32 * iso,
            height: grid.rows() as i32 * iso,
        }
    }
}
