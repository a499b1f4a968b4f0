use std::collections::HashMap;

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    Lines,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub primitive: Primitive,
}

impl Mesh {
    pub fn segment_count(&self) -> usize {
        match self.primitive {
            Primitive::Lines => self.indices.len() / 2,
            Primitive::Triangles => 0,
        }
    }
}

/// Quad of the given size centred on the origin, wound counter-clockwise.
pub fn create_sprite(width: f32, height: f32) -> Mesh {
    let hw = width * 0.5;
    let hh = height * 0.5;
    Mesh {
        positions: vec![
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        primitive: Primitive::Triangles,
    }
}

/// Outline of a triangle mesh: the edges owned by exactly one triangle.
///
/// Line meshes are returned unchanged.
pub fn create_wireframe(mesh: &Mesh) -> Mesh {
    if mesh.primitive == Primitive::Lines {
        return mesh.clone();
    }

    let mut edge_uses = HashMap::<(u32, u32), u32>::new();
    let mut edge_order = Vec::<(u32, u32)>::new();
    for triangle in mesh.indices.chunks_exact(3) {
        for (a, b) in [
            (triangle[0], triangle[1]),
            (triangle[1], triangle[2]),
            (triangle[2], triangle[0]),
        ] {
            let key = (a.min(b), a.max(b));
            let uses = edge_uses.entry(key).or_insert(0);
            if *uses == 0 {
                edge_order.push((a, b));
            }
            *uses += 1;
        }
    }

    let indices = edge_order
        .into_iter()
        .filter(|(a, b)| edge_uses.get(&((*a).min(*b), (*a).max(*b))) == Some(&1))
        .flat_map(|(a, b)| [a, b])
        .collect();

    Mesh {
        positions: mesh.positions.clone(),
        indices,
        primitive: Primitive::Lines,
    }
}

/// Diamond tiles laid out on a staggered grid, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    rows: u32,
    columns: u32,
    mesh: Mesh,
}

impl VertexBuffer {
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn tile_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Top, right, bottom and left vertices of tile `(column, row)`.
    pub fn tile_vertices(&self, column: u32, row: u32) -> Option<&[Vec3]> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let start = (row as usize * self.columns as usize + column as usize) * 4;
        self.mesh.positions.get(start..start + 4)
    }
}

/// One diamond per tile. Row `r` sits `r * tile_height / 2` below row 0,
/// odd rows are shifted right by half a tile, and the top vertex of tile
/// `(0, 0)` is at the origin with y pointing up.
pub fn build_staggered_vertex_buffer(
    rows: u32,
    columns: u32,
    tile_width: i32,
    tile_height: i32,
) -> VertexBuffer {
    let tile_count = rows as usize * columns as usize;
    let mut positions = Vec::with_capacity(tile_count * 4);
    let mut indices = Vec::with_capacity(tile_count * 6);

    let half_w = tile_width as f32 * 0.5;
    let half_h = tile_height as f32 * 0.5;

    for row in 0..rows {
        let stagger = if row % 2 == 1 { half_w } else { 0.0 };
        let top_y = -(row as f32) * half_h;
        for column in 0..columns {
            let top_x = column as f32 * tile_width as f32 + stagger;
            let base = positions.len() as u32;
            positions.extend_from_slice(&[
                Vec3::new(top_x, top_y, 0.0),
                Vec3::new(top_x + half_w, top_y - half_h, 0.0),
                Vec3::new(top_x, top_y - tile_height as f32, 0.0),
                Vec3::new(top_x - half_w, top_y - half_h, 0.0),
            ]);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    VertexBuffer {
        rows,
        columns,
        mesh: Mesh {
            positions,
            indices,
            primitive: Primitive::Triangles,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_wireframe_is_the_quad_outline() {
        let quad = create_sprite(1.0, 1.0);
        let wire = create_wireframe(&quad);

        assert_eq!(wire.primitive, Primitive::Lines);
        assert_eq!(wire.segment_count(), 4);
        assert_eq!(wire.positions, quad.positions);
        // The shared diagonal 0-2 is interior and must not be drawn.
        let has_diagonal = wire
            .indices
            .chunks_exact(2)
            .any(|edge| (edge[0] == 0 && edge[1] == 2) || (edge[0] == 2 && edge[1] == 0));
        assert!(!has_diagonal);
    }

    #[test]
    fn wireframe_of_lines_is_identity() {
        let wire = create_wireframe(&create_sprite(2.0, 1.0));
        assert_eq!(create_wireframe(&wire), wire);
    }

    #[test]
    fn staggered_buffer_offsets_odd_rows() {
        let buffer = build_staggered_vertex_buffer(3, 2, 64, 32);

        assert_eq!(buffer.tile_count(), 6);
        assert_eq!(buffer.mesh().positions.len(), 24);
        assert_eq!(buffer.mesh().indices.len(), 36);

        let first = buffer.tile_vertices(0, 0).expect("tile");
        assert_eq!(first[0], Vec3::ZERO);
        assert_eq!(first[1], Vec3::new(32.0, -16.0, 0.0));
        assert_eq!(first[2], Vec3::new(0.0, -32.0, 0.0));
        assert_eq!(first[3], Vec3::new(-32.0, -16.0, 0.0));

        let odd = buffer.tile_vertices(1, 1).expect("tile");
        assert_eq!(odd[0], Vec3::new(96.0, -16.0, 0.0));

        let next_even = buffer.tile_vertices(0, 2).expect("tile");
        assert_eq!(next_even[0], Vec3::new(0.0, -32.0, 0.0));

        assert!(buffer.tile_vertices(2, 0).is_none());
        assert!(buffer.tile_vertices(0, 3).is_none());
    }

    #[test]
    fn staggered_rows_interlock_without_gaps() {
        let buffer = build_staggered_vertex_buffer(2, 2, 64, 32);
        let even = buffer.tile_vertices(0, 0).expect("tile");
        let odd = buffer.tile_vertices(0, 1).expect("tile");
        assert_eq!(odd[0], even[1]);
        assert_eq!(odd[3], even[2]);
    }
}
