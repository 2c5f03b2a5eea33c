//common.rs

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

// --- CONSTANTS ---
pub const WORLD_SIZE: f32 = 200.0;
pub const CELL_SIZE: f32 = 10.0;
pub const WALL_HEIGHT: f32 = 5.0;
pub const FLOOR_SEGMENTS: u32 = 50;
pub const PLAYER_HEIGHT: f32 = 2.5;

// --- DATA TYPES ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const YELLOW: Color = Color::rgb(253, 249, 0);
    pub const ORANGE: Color = Color::rgb(255, 161, 0);
    pub const BLUE: Color = Color::rgb(0, 121, 241);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// CPU-side vertex buffer: parallel attribute arrays plus a triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub colors: Vec<Color>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn with_capacity(verts: usize, inds: usize) -> Self {
        Self {
            positions: Vec::with_capacity(verts),
            normals: Vec::with_capacity(verts),
            texcoords: Vec::with_capacity(verts),
            colors: Vec::with_capacity(verts),
            indices: Vec::with_capacity(inds),
        }
    }

    pub fn push_vertex(&mut self, pos: Vec3, normal: Vec3, uv: [f32; 2], color: Color) {
        self.positions.push(pos.to_array());
        self.normals.push(normal.to_array());
        self.texcoords.push(uv);
        self.colors.push(color);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves the attribute arrays into the GPU layout.
    pub fn interleave(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.texcoords)
            .zip(&self.colors)
            .map(|(((pos, normal), uv), color)| Vertex {
                pos: *pos,
                normal: *normal,
                uv: *uv,
                color: color.to_f32(),
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fovy_degrees: f32,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self { position, target, up: Vec3::Y, fovy_degrees: 60.0 }
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fovy_degrees.to_radians(), aspect, 0.1, 2000.0);
        proj * Mat4::look_at_rh(self.position, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_keeps_attribute_order() {
        let mut mesh = MeshData::default();
        mesh.push_vertex(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, [0.5, 0.25], Color::rgb(255, 0, 51));
        let verts = mesh.interleave();
        assert_eq!(verts.len(), 1);
        assert_eq!(verts[0].pos, [1.0, 2.0, 3.0]);
        assert_eq!(verts[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(verts[0].uv, [0.5, 0.25]);
        assert_eq!(verts[0].color, [1.0, 0.0, 0.2, 1.0]);
    }
}
