//scene.rs

use std::f32::consts::{FRAC_PI_2, PI};
use std::path::PathBuf;
use glam::{Mat4, Vec3};
use crate::backend::{DrawStyle, MeshHandle, RenderBackend};
use crate::common::*;
use crate::config::GraphicsConfig;
use crate::gen::{calculate_subdivision_level, MeshGen, MAX_SUBDIVISION_LEVEL};
use crate::lighting::LightingEnvironment;
use crate::maze::Maze;
use crate::terrain::{HeightField, TERRAIN_SIZE};

pub const MAX_SCENES: usize = 10;

/// Everything a scene needs to (re)generate its meshes.
pub struct SceneContext<'a> {
    pub lighting: &'a LightingEnvironment,
    pub config: &'a GraphicsConfig,
    pub backend: &'a mut dyn RenderBackend,
}

pub trait Scene {
    fn name(&self) -> &str;
    fn init(&mut self, ctx: &mut SceneContext);
    fn update(&mut self, dt: f32, camera: &Camera, ctx: &mut SceneContext);
    fn render(&self, camera: &Camera, config: &GraphicsConfig, backend: &mut dyn RenderBackend);
    /// Must release every mesh the scene uploaded. Safe to call twice.
    fn cleanup(&mut self, backend: &mut dyn RenderBackend);

    /// +/- input, one step per key press.
    fn adjust(&mut self, _steps: i32) {}

    /// Baked vertex colors are out of date.
    fn invalidate_lighting(&mut self) {}

    fn status(&self) -> String {
        self.name().to_string()
    }
}

// --- UPLOADED MESHES ---

#[derive(Clone, Copy, Debug)]
struct GpuMesh {
    handle: MeshHandle,
    vertices: usize,
    triangles: usize,
}

fn upload(backend: &mut dyn RenderBackend, mesh: MeshData, label: &str) -> GpuMesh {
    let vertices = mesh.vertex_count();
    let triangles = mesh.triangle_count();
    log::debug!("Uploading {label}: {vertices} vertices, {triangles} triangles");
    GpuMesh { handle: backend.upload_mesh(mesh), vertices, triangles }
}

fn release(backend: &mut dyn RenderBackend, slot: &mut Option<GpuMesh>) {
    if let Some(mesh) = slot.take() {
        backend.release_mesh(mesh.handle);
    }
}

/// Snaps repeated 0.1 steps back onto the decimal grid.
fn step_tenths(value: f32, steps: i32, min: f32, max: f32) -> f32 {
    ((value + steps as f32 * 0.1) * 10.0).round().clamp(min * 10.0, max * 10.0) / 10.0
}

// --- MAZE ---

pub struct MazeScene {
    maze_path: PathBuf,
    maze: Maze,
    floor: Option<GpuMesh>,
    block: Option<GpuMesh>,
    boundary: Option<GpuMesh>,
    stale: bool,
}

impl MazeScene {
    pub fn new(maze_path: impl Into<PathBuf>) -> Self {
        Self {
            maze_path: maze_path.into(),
            maze: Maze::default(),
            floor: None,
            block: None,
            boundary: None,
            stale: false,
        }
    }

    fn build(&mut self, ctx: &mut SceneContext) {
        self.release_all(ctx.backend);

        let span = WORLD_SIZE * 2.0;
        let floor = MeshGen::floor(span, span, FLOOR_SEGMENTS, FLOOR_SEGMENTS, ctx.lighting, ctx.config);
        let block = MeshGen::wall_block(CELL_SIZE, ctx.lighting, ctx.config);
        let boundary = MeshGen::wall(span, WALL_HEIGHT, 40, 10, ctx.lighting, ctx.config);

        self.floor = Some(upload(ctx.backend, floor, "maze floor"));
        self.block = Some(upload(ctx.backend, block, "wall block"));
        self.boundary = Some(upload(ctx.backend, boundary, "boundary wall"));
        self.stale = false;
    }

    fn release_all(&mut self, backend: &mut dyn RenderBackend) {
        release(backend, &mut self.floor);
        release(backend, &mut self.block);
        release(backend, &mut self.boundary);
    }

    /// Blocks are laid out from the top-left corner of a grid centered on the origin.
    fn block_transform(&self, row: usize, col: usize) -> Mat4 {
        let start_x = -(self.maze.width() as f32 * CELL_SIZE) / 2.0;
        let start_z = -(self.maze.height() as f32 * CELL_SIZE) / 2.0;
        let pos = Vec3::new(
            start_x + col as f32 * CELL_SIZE,
            WALL_HEIGHT / 2.0,
            start_z + row as f32 * CELL_SIZE,
        );
        Mat4::from_translation(pos) * Mat4::from_scale(Vec3::new(1.0, WALL_HEIGHT / CELL_SIZE, 1.0))
    }

    /// The boundary wall mesh faces +Z; each copy is turned to face the world center.
    fn boundary_transforms() -> [Mat4; 4] {
        [
            Mat4::from_translation(Vec3::new(0.0, 0.0, -WORLD_SIZE)),
            Mat4::from_translation(Vec3::new(0.0, 0.0, WORLD_SIZE)) * Mat4::from_rotation_y(PI),
            Mat4::from_translation(Vec3::new(-WORLD_SIZE, 0.0, 0.0)) * Mat4::from_rotation_y(FRAC_PI_2),
            Mat4::from_translation(Vec3::new(WORLD_SIZE, 0.0, 0.0)) * Mat4::from_rotation_y(-FRAC_PI_2),
        ]
    }
}

impl Scene for MazeScene {
    fn name(&self) -> &str {
        "Maze"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        self.maze = Maze::load_or_empty(&self.maze_path);
        self.build(ctx);
    }

    fn update(&mut self, _dt: f32, _camera: &Camera, ctx: &mut SceneContext) {
        if self.stale {
            self.build(ctx);
        }
    }

    fn render(&self, _camera: &Camera, config: &GraphicsConfig, backend: &mut dyn RenderBackend) {
        if let Some(floor) = self.floor {
            backend.draw_mesh(floor.handle, Mat4::IDENTITY, Color::WHITE, DrawStyle::Solid);
        }
        if let Some(boundary) = self.boundary {
            for transform in Self::boundary_transforms() {
                backend.draw_mesh(boundary.handle, transform, Color::WHITE, DrawStyle::Solid);
            }
        }
        if let Some(block) = self.block {
            for (row, col) in self.maze.walls() {
                let transform = self.block_transform(row, col);
                backend.draw_mesh(block.handle, transform, Color::WHITE, DrawStyle::Solid);
                if config.high_quality {
                    backend.draw_mesh(block.handle, transform, config.wireframe_color, DrawStyle::Wireframe);
                }
            }
        }
    }

    fn cleanup(&mut self, backend: &mut dyn RenderBackend) {
        self.release_all(backend);
        self.maze = Maze::default();
    }

    fn invalidate_lighting(&mut self) {
        self.stale = true;
    }

    fn status(&self) -> String {
        format!("Maze {}x{} | {} walls", self.maze.width(), self.maze.height(), self.maze.walls().count())
    }
}

// --- TERRAIN ---

pub struct TerrainScene {
    heightmap_path: PathBuf,
    seed: u32,
    field_size: usize,
    field: Option<HeightField>,
    mesh: Option<GpuMesh>,
}

impl TerrainScene {
    pub fn new(heightmap_path: impl Into<PathBuf>, seed: u32) -> Self {
        Self {
            heightmap_path: heightmap_path.into(),
            seed,
            field_size: TERRAIN_SIZE,
            field: None,
            mesh: None,
        }
    }

    pub fn with_field_size(mut self, size: usize) -> Self {
        self.field_size = size;
        self
    }

    fn rebuild(&mut self, ctx: &mut SceneContext) {
        let Some(field) = &self.field else { return };
        let mesh = MeshGen::terrain(field, ctx.lighting, ctx.config);
        release(ctx.backend, &mut self.mesh);
        self.mesh = Some(upload(ctx.backend, mesh, "terrain"));
    }
}

impl Scene for TerrainScene {
    fn name(&self) -> &str {
        "Terrain"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        let field = match HeightField::load_image(&self.heightmap_path, self.field_size) {
            Ok(field) => field,
            Err(e) => {
                log::warn!("Heightmap {} unavailable ({e}), generating procedural terrain", self.heightmap_path.display());
                HeightField::generate_fallback(self.field_size, self.seed)
            }
        };
        self.field = Some(field);
        self.rebuild(ctx);
    }

    fn update(&mut self, _dt: f32, _camera: &Camera, ctx: &mut SceneContext) {
        let dirty = self.field.as_mut().is_some_and(HeightField::take_rebuild);
        if dirty {
            self.rebuild(ctx);
        }
    }

    fn render(&self, _camera: &Camera, _config: &GraphicsConfig, backend: &mut dyn RenderBackend) {
        if let Some(mesh) = self.mesh {
            backend.draw_mesh(mesh.handle, Mat4::IDENTITY, Color::WHITE, DrawStyle::Solid);
        }
    }

    fn cleanup(&mut self, backend: &mut dyn RenderBackend) {
        release(backend, &mut self.mesh);
        self.field = None;
    }

    fn adjust(&mut self, steps: i32) {
        if let Some(field) = self.field.as_mut() {
            let m = step_tenths(field.height_multiplier(), steps, 0.0, crate::terrain::MAX_HEIGHT_MULTIPLIER);
            field.set_height_multiplier(m);
            log::info!("Height multiplier: {m:.1}");
        }
    }

    fn invalidate_lighting(&mut self) {
        if let Some(field) = self.field.as_mut() {
            field.request_rebuild();
        }
    }

    fn status(&self) -> String {
        match (&self.field, self.mesh) {
            (Some(field), Some(mesh)) => format!(
                "Terrain ({}) | height x{:.1} | {} verts",
                if field.loaded { "image" } else { "procedural" },
                field.height_multiplier(),
                mesh.vertices,
            ),
            _ => "Terrain".to_string(),
        }
    }
}

// --- CUBE SPHERE ---

pub struct CubeSphereScene {
    radius: f32,
    center: Vec3,
    max_subdivisions: u32,
    subdivision_level: u32,
    morph_factor: f32,
    last_distance: Option<f32>,
    morph_mesh: Option<GpuMesh>,
    shell: Option<GpuMesh>,
    morph_dirty: bool,
    shell_dirty: bool,
}

impl Default for CubeSphereScene {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeSphereScene {
    /// Camera has to move this far before the LOD is re-evaluated.
    const LOD_DISTANCE_STEP: f32 = 1.0;
    const SHELL_INFLATE: f32 = 1.01;

    pub fn new() -> Self {
        Self {
            radius: 50.0,
            center: Vec3::ZERO,
            max_subdivisions: 6,
            subdivision_level: 6,
            morph_factor: 0.0,
            last_distance: None,
            morph_mesh: None,
            shell: None,
            morph_dirty: false,
            shell_dirty: false,
        }
    }

    /// Clamped to `1..=MAX_SUBDIVISION_LEVEL`.
    pub fn with_max_subdivisions(mut self, max: u32) -> Self {
        let max = max.clamp(1, MAX_SUBDIVISION_LEVEL);
        self.max_subdivisions = max;
        self.subdivision_level = max;
        self
    }

    pub fn morph_factor(&self) -> f32 {
        self.morph_factor
    }

    pub fn subdivision_level(&self) -> u32 {
        self.subdivision_level
    }

    fn update_lod(&mut self, camera: &Camera) {
        let distance = camera.position.distance(self.center);
        let moved = self.last_distance.map_or(true, |last| (distance - last).abs() > Self::LOD_DISTANCE_STEP);
        if !moved {
            return;
        }
        self.last_distance = Some(distance);

        let level = calculate_subdivision_level(self.center, camera.position, self.radius, self.max_subdivisions);
        if level != self.subdivision_level {
            log::debug!("Cube-sphere LOD {} -> {level}", self.subdivision_level);
            self.subdivision_level = level;
            self.morph_dirty = true;
            self.shell_dirty = true;
        }
    }

    fn rebuild(&mut self, backend: &mut dyn RenderBackend) {
        if self.morph_dirty {
            let mesh = MeshGen::morph_cube(self.center, self.radius, self.subdivision_level, self.morph_factor);
            release(backend, &mut self.morph_mesh);
            self.morph_mesh = Some(upload(backend, mesh, "morph cube"));
            self.morph_dirty = false;
        }
        if self.shell_dirty {
            let mesh = MeshGen::cube_sphere(self.center, self.radius * Self::SHELL_INFLATE, self.subdivision_level);
            release(backend, &mut self.shell);
            self.shell = Some(upload(backend, mesh, "sphere shell"));
            self.shell_dirty = false;
        }
    }
}

impl Scene for CubeSphereScene {
    fn name(&self) -> &str {
        "Cube Sphere"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        self.subdivision_level = self.max_subdivisions;
        self.last_distance = None;
        self.morph_dirty = true;
        self.shell_dirty = true;
        self.rebuild(ctx.backend);
    }

    fn update(&mut self, _dt: f32, camera: &Camera, ctx: &mut SceneContext) {
        self.update_lod(camera);
        self.rebuild(ctx.backend);
    }

    fn render(&self, _camera: &Camera, config: &GraphicsConfig, backend: &mut dyn RenderBackend) {
        if let Some(mesh) = self.morph_mesh {
            backend.draw_mesh(mesh.handle, Mat4::IDENTITY, Color::WHITE, DrawStyle::Solid);
        }
        if config.high_quality {
            if let Some(shell) = self.shell {
                backend.draw_mesh(shell.handle, Mat4::IDENTITY, config.wireframe_color, DrawStyle::Wireframe);
            }
        }
    }

    fn cleanup(&mut self, backend: &mut dyn RenderBackend) {
        release(backend, &mut self.morph_mesh);
        release(backend, &mut self.shell);
    }

    fn adjust(&mut self, steps: i32) {
        let m = step_tenths(self.morph_factor, steps, 0.0, 1.0);
        if m != self.morph_factor {
            self.morph_factor = m;
            self.morph_dirty = true;
            log::info!("Morph factor: {m:.1}");
        }
    }

    fn status(&self) -> String {
        let tris = self.morph_mesh.map_or(0, |m| m.triangles);
        format!(
            "Morph {:.1} | LOD {} ({} segments) | {} tris",
            self.morph_factor(),
            self.subdivision_level(),
            1u32 << self.subdivision_level(),
            tris,
        )
    }
}

// --- SCENE MANAGER ---

#[derive(Default)]
pub struct SceneManager {
    scenes: Vec<Box<dyn Scene>>,
    active: Option<usize>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scene's index, or `None` once `MAX_SCENES` are registered.
    pub fn add_scene(&mut self, scene: Box<dyn Scene>) -> Option<usize> {
        if self.scenes.len() >= MAX_SCENES {
            log::warn!("Scene limit ({MAX_SCENES}) reached, ignoring '{}'", scene.name());
            return None;
        }
        self.scenes.push(scene);
        Some(self.scenes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Cleans up the outgoing scene, then initializes the incoming one.
    pub fn switch(&mut self, index: usize, ctx: &mut SceneContext) {
        if index >= self.scenes.len() {
            log::warn!("No scene at index {index}");
            return;
        }
        if self.active == Some(index) {
            return;
        }

        if let Some(current) = self.active.take() {
            self.scenes[current].cleanup(ctx.backend);
        }

        let scene = &mut self.scenes[index];
        log::info!("Switching to scene '{}'", scene.name());
        scene.init(ctx);
        self.active = Some(index);
    }

    pub fn update(&mut self, dt: f32, camera: &Camera, ctx: &mut SceneContext) {
        if let Some(i) = self.active {
            self.scenes[i].update(dt, camera, ctx);
        }
    }

    pub fn render(&self, camera: &Camera, config: &GraphicsConfig, backend: &mut dyn RenderBackend) {
        if let Some(i) = self.active {
            self.scenes[i].render(camera, config, backend);
        }
    }

    pub fn adjust(&mut self, steps: i32) {
        if let Some(i) = self.active {
            self.scenes[i].adjust(steps);
        }
    }

    pub fn invalidate_lighting(&mut self) {
        if let Some(i) = self.active {
            self.scenes[i].invalidate_lighting();
        }
    }

    pub fn status(&self) -> Option<String> {
        self.active.map(|i| self.scenes[i].status())
    }

    /// Shutdown path: every scene is cleaned up, active or not.
    pub fn cleanup_all(&mut self, backend: &mut dyn RenderBackend) {
        for scene in &mut self.scenes {
            scene.cleanup(backend);
        }
        self.scenes.clear();
        self.active = None;
    }
}
