//! Map pixel <-> staggered tile conversion.
//!
//! Map pixels have their origin at the map's top-left corner with y growing
//! downward. Rotating a point by `ix = (x + 2y) / 2`, `iy = (-x + 2y) / 2`
//! undoes the 2:1 skew so diamond tiles become an axis-aligned square grid of
//! side `tile_height`. All divisions here floor, so points left of or above
//! the map yield negative indices instead of collapsing onto row/column 0.
//!
//! Intermediate values are `i64` so every `i32` map pixel resolves without
//! overflow; indices beyond the `i32` range saturate.

use glam::{I64Vec2, IVec2};
use tracing::trace;

use super::TileGridSpec;

/// How the tile under a point was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileResolution {
    /// The diamond lookup landed on an even staggered row; no correction.
    EvenRow,
    /// Odd row, point left of the tile's vertical midline: row moved up one.
    OddRowLeft,
    /// Odd row, point on or right of the midline: row and column moved back one.
    OddRowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileIndexOffset {
    pub column: i32,
    pub row: i32,
    /// Offset inside the tile; y is positive upward.
    pub offset: IVec2,
    pub resolution: TileResolution,
}

impl TileIndexOffset {
    pub fn is_inside(&self, grid: &TileGridSpec) -> bool {
        grid.contains(self.column, self.row)
    }
}

/// Rotates a map pixel into diamond space.
pub fn map_to_diamond(x: i32, y: i32) -> I64Vec2 {
    let (x, y) = (i64::from(x), i64::from(y));
    I64Vec2::new((x + 2 * y).div_euclid(2), (-x + 2 * y).div_euclid(2))
}

/// Diamond-tile indices to `(column, row)` on the staggered grid.
pub fn diamond_to_staggered(diamond_column: i64, diamond_row: i64) -> (i64, i64) {
    let row = diamond_column + diamond_row;
    let column = (diamond_column - diamond_row + row.rem_euclid(2)) / 2;
    (column, row)
}

/// Inverse of [`diamond_to_staggered`].
pub fn staggered_to_diamond(column: i64, row: i64) -> (i64, i64) {
    let parity = row.rem_euclid(2);
    let diamond_column = (row + 2 * column - parity) / 2;
    let diamond_row = (row - 2 * column + parity) / 2;
    (diamond_column, diamond_row)
}

/// Map pixel at the centre of the diamond cell that the staggered index
/// `(column, row)` occupies before row-parity correction.
pub fn tile_center_in_map(grid: &TileGridSpec, column: i32, row: i32) -> IVec2 {
    let (diamond_column, diamond_row) = staggered_to_diamond(i64::from(column), i64::from(row));
    let size = i64::from(grid.iso_tile_size());
    let u = diamond_column * size + size / 2;
    let v = diamond_row * size + size / 2;
    IVec2::new(saturate_i32(u - v), saturate_i32((u + v) / 2))
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

pub fn map_to_tile(grid: &TileGridSpec, x: i32, y: i32) -> TileIndexOffset {
    let tile_width = i64::from(grid.tile_width());
    let tile_height = i64::from(grid.tile_height());

    let diamond = map_to_diamond(x, y);
    let (mut column, mut row) = diamond_to_staggered(
        diamond.x.div_euclid(tile_height),
        diamond.y.div_euclid(tile_height),
    );

    let mut offset_x = i64::from(x).rem_euclid(tile_width);
    let mut offset_y = i64::from(y).rem_euclid(tile_height);

    // Odd rows sit half a tile off the even-row lattice the raw offset is
    // measured against, so the point belongs to one of the two tiles above.
    let resolution = if row.rem_euclid(2) == 1 {
        let left = offset_x < tile_width / 2;
        row -= 1;
        if !left {
            column -= 1;
        }
        offset_x -= tile_width;
        offset_y -= tile_height / 2;
        if left {
            TileResolution::OddRowLeft
        } else {
            TileResolution::OddRowRight
        }
    } else {
        TileResolution::EvenRow
    };

    trace!(
        x,
        y,
        column,
        row,
        offset_x,
        offset_y,
        resolution = ?resolution,
        "map_to_tile"
    );

    TileIndexOffset {
        column: saturate_i32(column),
        row: saturate_i32(row),
        offset: IVec2::new(saturate_i32(offset_x), saturate_i32(-offset_y)),
        resolution,
    }
}
