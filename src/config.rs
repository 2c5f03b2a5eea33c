//config.rs

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::common::Color;
use crate::gen::MAX_SUBDIVISION_LEVEL;
use crate::terrain::TERRAIN_SIZE;
use crate::error::AssetError;

pub const DEFAULT_CONFIG_PATH: &str = "vertexwalk.json";

/// Render and shading switches flipped by the F1-F5 keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub antialiasing: bool,
    pub wireframe_thickness: f32,
    pub high_quality: bool,
    pub advanced_shading: bool,
    pub specular_strength: f32,
    pub shininess: f32,
    pub wireframe_color: Color,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            antialiasing: true,
            wireframe_thickness: 2.0,
            high_quality: true,
            advanced_shading: true,
            specular_strength: 0.5,
            shininess: 32.0,
            wireframe_color: Color::BLACK,
        }
    }
}

impl GraphicsConfig {
    const MAX_WIREFRAME_THICKNESS: f32 = 5.0;

    pub fn toggle_antialiasing(&mut self) {
        self.antialiasing = !self.antialiasing;
        log::info!("Antialiasing: {} (applies on restart)", on_off(self.antialiasing));
    }

    pub fn cycle_wireframe_thickness(&mut self) {
        self.wireframe_thickness += 0.5;
        if self.wireframe_thickness > Self::MAX_WIREFRAME_THICKNESS {
            self.wireframe_thickness = 1.0;
        }
        log::info!("Wireframe thickness: {:.1}", self.wireframe_thickness);
    }

    pub fn toggle_high_quality(&mut self) {
        self.high_quality = !self.high_quality;
        log::info!("High quality: {}", on_off(self.high_quality));
    }

    pub fn toggle_advanced_shading(&mut self) {
        self.advanced_shading = !self.advanced_shading;
        log::info!("Advanced shading: {}", on_off(self.advanced_shading));
    }

    pub fn cycle_specular_strength(&mut self) {
        self.specular_strength += 0.1;
        // 1.0 must stay reachable after float drift from repeated steps
        if self.specular_strength > 1.0 + 1e-4 {
            self.specular_strength = 0.0;
        }
        log::info!("Specular strength: {:.1}", self.specular_strength);
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "ON" } else { "OFF" }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_title: String,
    pub width: u32,
    pub height: u32,
    pub graphics: GraphicsConfig,
    pub maze_path: PathBuf,
    pub heightmap_path: PathBuf,
    pub terrain_seed: u32,
    pub terrain_size: usize,
    pub sphere_max_subdivisions: u32,
    pub start_scene: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "vertexwalk".to_string(),
            width: 1280,
            height: 720,
            graphics: GraphicsConfig::default(),
            maze_path: PathBuf::from("maze.txt"),
            heightmap_path: PathBuf::from("heightmap.png"),
            terrain_seed: 1337,
            terrain_size: TERRAIN_SIZE,
            sphere_max_subdivisions: 6,
            start_scene: 0,
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> Result<Self, AssetError> {
        let cfg: AppConfig = serde_json::from_str(text)?;
        if cfg.width == 0 || cfg.height == 0 {
            return Err(AssetError::Parse(format!("window size {}x{} is empty", cfg.width, cfg.height)));
        }
        if cfg.terrain_size < 2 {
            return Err(AssetError::Parse(format!("terrain_size {} needs at least 2 samples", cfg.terrain_size)));
        }
        if !(1..=MAX_SUBDIVISION_LEVEL).contains(&cfg.sphere_max_subdivisions) {
            return Err(AssetError::Parse(format!(
                "sphere_max_subdivisions {} is outside 1..={MAX_SUBDIVISION_LEVEL}",
                cfg.sphere_max_subdivisions
            )));
        }
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Missing file is the normal case; a broken one is worth a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(AssetError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_values() {
        let cfg = GraphicsConfig::default();
        assert!(cfg.antialiasing);
        assert!(cfg.high_quality);
        assert!(cfg.advanced_shading);
        assert_eq!(cfg.wireframe_thickness, 2.0);
        assert_eq!(cfg.specular_strength, 0.5);
        assert_eq!(cfg.shininess, 32.0);
    }

    #[test]
    fn wireframe_thickness_wraps_to_one() {
        let mut cfg = GraphicsConfig::default();
        let seen: Vec<f32> = (0..8).map(|_| { cfg.cycle_wireframe_thickness(); cfg.wireframe_thickness }).collect();
        assert_eq!(seen, vec![2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 1.0, 1.5]);
    }

    #[test]
    fn specular_strength_wraps_to_zero() {
        let mut cfg = GraphicsConfig::default();
        for _ in 0..5 {
            cfg.cycle_specular_strength();
        }
        assert!((cfg.specular_strength - 1.0).abs() < 1e-4, "got {}", cfg.specular_strength);
        cfg.cycle_specular_strength();
        assert_eq!(cfg.specular_strength, 0.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = AppConfig::parse(r#"{ "width": 800, "graphics": { "shininess": 8.0 } }"#).unwrap();
        assert_eq!(cfg.width, 800);
        assert_eq!(cfg.height, 720);
        assert_eq!(cfg.graphics.shininess, 8.0);
        assert!(cfg.graphics.advanced_shading);
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        assert!(matches!(AppConfig::parse(r#"{ "width": 0 }"#), Err(AssetError::Parse(_))));
        assert!(matches!(AppConfig::parse("not json"), Err(AssetError::Config(_))));
    }

    #[test]
    fn missing_file_falls_back() {
        let cfg = AppConfig::load_or_default(Path::new("definitely/not/here.json"));
        assert_eq!(cfg.width, 1280);
        assert_eq!(cfg.terrain_size, TERRAIN_SIZE);
        assert_eq!(cfg.sphere_max_subdivisions, 6);
    }

    #[test]
    fn degenerate_terrain_is_rejected() {
        assert!(matches!(AppConfig::parse(r#"{ "terrain_size": 1 }"#), Err(AssetError::Parse(_))));
        assert_eq!(AppConfig::parse(r#"{ "terrain_size": 64 }"#).unwrap().terrain_size, 64);
    }

    #[test]
    fn sphere_subdivisions_must_be_in_range() {
        assert!(matches!(AppConfig::parse(r#"{ "sphere_max_subdivisions": 0 }"#), Err(AssetError::Parse(_))));
        assert!(matches!(AppConfig::parse(r#"{ "sphere_max_subdivisions": 13 }"#), Err(AssetError::Parse(_))));
        assert_eq!(AppConfig::parse(r#"{ "sphere_max_subdivisions": 1 }"#).unwrap().sphere_max_subdivisions, 1);
        assert_eq!(AppConfig::parse(r#"{ "sphere_max_subdivisions": 12 }"#).unwrap().sphere_max_subdivisions, MAX_SUBDIVISION_LEVEL);
    }
}
