//gen.rs

use glam::Vec3;
use crate::common::*;
use crate::config::GraphicsConfig;
use crate::lighting::{shade, shade_simple, LightingEnvironment};
use crate::terrain::{HeightField, HEIGHT_SCALE, TERRAIN_EXTENT, TERRAIN_RESOLUTION};

/// Highest per-face subdivision the cube-sphere generators accept (4096 segments per edge).
pub const MAX_SUBDIVISION_LEVEL: u32 = 12;

pub struct CoordSystem;

impl CoordSystem {
    // forward mapping: unit cube -> sphere
    pub fn cube_to_sphere(x: f64, y: f64, z: f64) -> Vec3 {
        let x2 = x * x;
        let y2 = y * y;
        let z2 = z * z;

        let sx = x * (1.0 - y2 * 0.5 - z2 * 0.5 + y2 * z2 / 3.0).sqrt();
        let sy = y * (1.0 - z2 * 0.5 - x2 * 0.5 + z2 * x2 / 3.0).sqrt();
        let sz = z * (1.0 - x2 * 0.5 - y2 * 0.5 + x2 * y2 / 3.0).sqrt();

        Vec3::new(sx as f32, sy as f32, sz as f32)
    }

    /// Point on face `face` of the [-1, 1] cube at face-local (s, t) in [0, 1].
    fn face_point(face: &Face, s: f32, t: f32) -> Vec3 {
        face.normal + face.u * (s * 2.0 - 1.0) + face.v * (t * 2.0 - 1.0)
    }
}

// --- CUBE FACES ---

#[derive(Clone, Copy)]
struct Face {
    normal: Vec3,
    u: Vec3,
    v: Vec3,
}

// v x u == normal, so `triangulate_grid` winds every face outward
const FACES: [Face; 6] = [
    Face { normal: Vec3::Z, u: Vec3::NEG_X, v: Vec3::Y },     // front
    Face { normal: Vec3::NEG_Z, u: Vec3::X, v: Vec3::Y },     // back
    Face { normal: Vec3::NEG_X, u: Vec3::NEG_Z, v: Vec3::Y }, // left
    Face { normal: Vec3::X, u: Vec3::Z, v: Vec3::Y },         // right
    Face { normal: Vec3::Y, u: Vec3::X, v: Vec3::Z },         // top
    Face { normal: Vec3::NEG_Y, u: Vec3::X, v: Vec3::NEG_Z }, // bottom
];

const TOP_FACE: usize = 4;
const BOTTOM_FACE: usize = 5;

const FACE_HUES: [Color; 6] = [
    Color::rgb(220, 80, 80),
    Color::rgb(80, 200, 90),
    Color::rgb(80, 120, 220),
    Color::rgb(230, 200, 70),
    Color::rgb(200, 90, 210),
    Color::rgb(70, 200, 200),
];

// --- PALETTE ---

const FLOOR_LIGHT: Color = Color::rgb(100, 150, 100);
const FLOOR_DARK: Color = Color::rgb(80, 120, 80);
const BRICK: Color = Color::rgb(140, 70, 70);
const MORTAR: Color = Color::rgb(180, 180, 180);
const BLOCK_TOP: Color = Color::rgb(150, 100, 100);
const BLOCK_BOTTOM: Color = Color::rgb(80, 60, 60);
const FLAT_TERRAIN: Color = Color::rgb(100, 150, 100);

const TERRAIN_RAMP: [(f32, Color); 7] = [
    (0.0, Color::rgb(20, 50, 120)),    // deep water
    (0.1, Color::rgb(40, 80, 180)),    // shallow water
    (0.2, Color::rgb(194, 178, 128)),  // beach
    (0.35, Color::rgb(85, 140, 45)),   // grass
    (0.6, Color::rgb(60, 100, 30)),    // dark grass
    (0.8, Color::rgb(80, 70, 60)),     // rock
    (1.0, Color::rgb(240, 245, 255)),  // snow
];

pub fn checker_color(x: u32, z: u32) -> Color {
    if (x + z) % 2 == 0 { FLOOR_LIGHT } else { FLOOR_DARK }
}

/// Running bond: odd courses are shifted by half a brick.
pub fn brick_color(x: u32, y: u32) -> Color {
    let is_brick = (y % 4 < 2 && x % 6 < 3) || (y % 4 >= 2 && (x + 3) % 6 < 3);
    if is_brick { BRICK } else { MORTAR }
}

/// Height-banded gradient, piecewise linear between the ramp stops.
pub fn terrain_color(height: f32, max_height: f32) -> Color {
    if max_height <= 0.0 {
        return FLAT_TERRAIN;
    }
    let n = height / max_height;

    for w in TERRAIN_RAMP.windows(2) {
        let (lo, from) = w[0];
        let (hi, to) = w[1];
        if n < hi {
            let t = ((n - lo) / (hi - lo)).clamp(0.0, 1.0);
            return lerp_color(from, to, t);
        }
    }
    TERRAIN_RAMP[TERRAIN_RAMP.len() - 1].1
}

fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    let ch = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) as u8;
    Color { r: ch(a.r, b.r), g: ch(a.g, b.g), b: ch(a.b, b.b), a: 255 }
}

fn scale_color(c: Color, f: f32) -> Color {
    let ch = |x: u8| (x as f32 * f).clamp(0.0, 255.0) as u8;
    Color { r: ch(c.r), g: ch(c.g), b: ch(c.b), a: c.a }
}

/// Two triangles per quad: (tl, bl, tr) and (tr, bl, br).
fn triangulate_grid(inds: &mut Vec<u32>, base: u32, cols: u32, rows: u32) {
    for y in 0..rows - 1 {
        for x in 0..cols - 1 {
            let tl = base + y * cols + x;
            let tr = tl + 1;
            let bl = tl + cols;
            let br = bl + 1;

            inds.push(tl); inds.push(bl); inds.push(tr);
            inds.push(tr); inds.push(bl); inds.push(br);
        }
    }
}

/// Subdivision for a sphere seen from `camera`, coarser with distance.
pub fn calculate_subdivision_level(center: Vec3, camera: Vec3, radius: f32, max_subdivisions: u32) -> u32 {
    let ratio = center.distance(camera) / radius;
    let drop = if ratio < 2.0 {
        0
    } else if ratio < 5.0 {
        1
    } else if ratio < 10.0 {
        2
    } else if ratio < 20.0 {
        3
    } else {
        4
    };
    (max_subdivisions as i32 - drop).max(1) as u32
}

// --- MESH GENERATION ---

pub struct MeshGen;

impl MeshGen {
    /// Checkerboard in the XZ plane, centered on the origin.
    pub fn floor(width: f32, length: f32, res_x: u32, res_z: u32, env: &LightingEnvironment, config: &GraphicsConfig) -> MeshData {
        debug_assert!(res_x >= 2 && res_z >= 2, "grid resolution must be at least 2");
        let mut mesh = MeshData::with_capacity((res_x * res_z) as usize, ((res_x - 1) * (res_z - 1) * 6) as usize);

        for z in 0..res_z {
            for x in 0..res_x {
                let s = x as f32 / (res_x - 1) as f32;
                let t = z as f32 / (res_z - 1) as f32;
                let pos = Vec3::new(s * width - width / 2.0, 0.0, t * length - length / 2.0);

                let color = shade(pos, Vec3::Y, None, checker_color(x, z), env, config);
                mesh.push_vertex(pos, Vec3::Y, [s, t], color);
            }
        }

        triangulate_grid(&mut mesh.indices, 0, res_x, res_z);
        mesh
    }

    /// Brick wall in the XY plane facing +Z, base on y = 0.
    pub fn wall(width: f32, height: f32, res_x: u32, res_y: u32, env: &LightingEnvironment, config: &GraphicsConfig) -> MeshData {
        debug_assert!(res_x >= 2 && res_y >= 2, "grid resolution must be at least 2");
        let mut mesh = MeshData::with_capacity((res_x * res_y) as usize, ((res_x - 1) * (res_y - 1) * 6) as usize);

        // rows run top to bottom so the shared winding faces +Z
        for row in 0..res_y {
            let course = res_y - 1 - row;
            for x in 0..res_x {
                let s = x as f32 / (res_x - 1) as f32;
                let t = course as f32 / (res_y - 1) as f32;
                let pos = Vec3::new(s * width - width / 2.0, t * height, 0.0);

                let color = shade(pos, Vec3::Z, None, brick_color(x, course), env, config);
                mesh.push_vertex(pos, Vec3::Z, [s, t], color);
            }
        }

        triangulate_grid(&mut mesh.indices, 0, res_x, res_y);
        mesh
    }

    /// Six-faced block for maze cells; bricks on the sides, flat tints on top and bottom.
    pub fn wall_block(size: f32, env: &LightingEnvironment, config: &GraphicsConfig) -> MeshData {
        const RES: u32 = 4;
        let half = size / 2.0;
        let mut mesh = MeshData::with_capacity(6 * (RES * RES) as usize, 6 * ((RES - 1) * (RES - 1) * 6) as usize);

        for (face_idx, face) in FACES.iter().enumerate() {
            let base = mesh.vertex_count() as u32;
            for j in 0..RES {
                for i in 0..RES {
                    let s = i as f32 / (RES - 1) as f32;
                    let t = j as f32 / (RES - 1) as f32;
                    let pos = CoordSystem::face_point(face, s, t) * half;

                    let base_color = match face_idx {
                        TOP_FACE => BLOCK_TOP,
                        BOTTOM_FACE => BLOCK_BOTTOM,
                        _ => brick_color((s * 8.0) as u32 % 6, (t * 6.0) as u32 % 4),
                    };
                    let color = shade(pos, face.normal, Some(Vec3::Z), base_color, env, config);
                    mesh.push_vertex(pos, face.normal, [s, t], color);
                }
            }
            triangulate_grid(&mut mesh.indices, base, RES, RES);
        }

        mesh
    }

    /// 128x128 quads over a 100x100 plane, heights sampled bilinearly from `field`.
    pub fn terrain(field: &HeightField, env: &LightingEnvironment, config: &GraphicsConfig) -> MeshData {
        let res = TERRAIN_RESOLUTION;
        let row_len = res + 1;
        let quad = TERRAIN_EXTENT / res as f32;
        let to_grid = (field.size() - 1) as f32 / res as f32;
        let max_height = field.max_height(HEIGHT_SCALE);

        let height = |x: u32, z: u32| field.height_at(x as f32 * to_grid, z as f32 * to_grid, HEIGHT_SCALE);

        let mut mesh = MeshData::with_capacity((row_len * row_len) as usize, (res * res * 6) as usize);
        for z in 0..row_len {
            for x in 0..row_len {
                let h = height(x, z);
                let pos = Vec3::new(x as f32 * quad - TERRAIN_EXTENT / 2.0, h, z as f32 * quad - TERRAIN_EXTENT / 2.0);

                // central differences, edge vertices keep the up vector
                let normal = if x > 0 && x < res && z > 0 && z < res {
                    let across = Vec3::new(2.0 * quad, height(x + 1, z) - height(x - 1, z), 0.0);
                    let along = Vec3::new(0.0, height(x, z + 1) - height(x, z - 1), 2.0 * quad);
                    along.cross(across).normalize()
                } else {
                    Vec3::Y
                };

                let color = shade(pos, normal, None, terrain_color(h, max_height), env, config);
                mesh.push_vertex(pos, normal, [x as f32 / res as f32, z as f32 / res as f32], color);
            }
        }

        triangulate_grid(&mut mesh.indices, 0, row_len, row_len);
        mesh
    }

    /// Cube faces warped onto a sphere with the area-preserving mapping.
    pub fn cube_sphere(center: Vec3, radius: f32, level: u32) -> MeshData {
        Self::six_face_grid(level, |face_idx, face, s, t| {
            let c = CoordSystem::face_point(face, s, t);
            let dir = CoordSystem::cube_to_sphere(c.x as f64, c.y as f64, c.z as f64).normalize();
            let pos = center + dir * radius;
            (pos, dir, Self::sphere_color(face_idx, dir))
        })
    }

    /// Cube of half-extent `radius` blended toward the radially projected sphere.
    pub fn morph_cube(center: Vec3, radius: f32, level: u32, morph: f32) -> MeshData {
        let m = morph.clamp(0.0, 1.0);
        Self::six_face_grid(level, |face_idx, face, s, t| {
            let cube = CoordSystem::face_point(face, s, t) * radius;
            let radial = cube.normalize();
            let pos = center + cube.lerp(radial * radius, m);
            let normal = face.normal.lerp(radial, m).normalize();
            (pos, normal, Self::sphere_color(face_idx, radial))
        })
    }

    fn sphere_color(face_idx: usize, dir: Vec3) -> Color {
        let variation = 0.85 + 0.15 * (dir.x * 3.0).sin() * (dir.y * 3.0).sin() * (dir.z * 3.0).sin();
        scale_color(FACE_HUES[face_idx], variation)
    }

    /// `2^level` segments per face edge, simple sun shading.
    fn six_face_grid<F>(level: u32, vertex: F) -> MeshData
    where
        F: Fn(usize, &Face, f32, f32) -> (Vec3, Vec3, Color),
    {
        debug_assert!(level <= MAX_SUBDIVISION_LEVEL, "subdivision level {level} is above the supported maximum of {MAX_SUBDIVISION_LEVEL}");
        let segments = 1u32 << level;
        let res = segments + 1;
        let mut mesh = MeshData::with_capacity(6 * (res * res) as usize, 6 * (segments * segments * 6) as usize);

        for (face_idx, face) in FACES.iter().enumerate() {
            let base = mesh.vertex_count() as u32;
            for j in 0..res {
                for i in 0..res {
                    let s = i as f32 / segments as f32;
                    let t = j as f32 / segments as f32;
                    let (pos, normal, base_color) = vertex(face_idx, face, s, t);
                    mesh.push_vertex(pos, normal, [s, t], shade_simple(pos, normal, base_color));
                }
            }
            triangulate_grid(&mut mesh.indices, base, res, res);
        }

        mesh
    }
}
