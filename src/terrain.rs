//terrain.rs

use std::path::Path;
use image::imageops::{self, FilterType};
use image::GrayImage;
use crate::error::AssetError;

// --- CONSTANTS ---
pub const TERRAIN_SIZE: usize = 1024;
pub const TERRAIN_RESOLUTION: u32 = 128;
pub const TERRAIN_EXTENT: f32 = 100.0;
pub const HEIGHT_SCALE: f32 = 5.0;
pub const MAX_HEIGHT_MULTIPLIER: f32 = 2.0;

const IMAGE_MAX_HEIGHT: f32 = 50.0;
const ISLAND_PEAK: f32 = 30.0;
const JITTER: f32 = 2.5;

// --- HEIGHT FIELD ---

/// Square grid of raw heights. The multiplier is applied on every read so
/// rescaling never touches the stored samples.
pub struct HeightField {
    size: usize,
    heights: Vec<f32>,
    peak: f32,
    height_multiplier: f32,
    pub loaded: bool,
    needs_rebuild: bool,
}

impl HeightField {
    pub fn from_heights(size: usize, heights: Vec<f32>) -> Self {
        debug_assert!(size >= 2, "height field needs at least 2x2 samples");
        debug_assert_eq!(heights.len(), size * size);
        let peak = heights.iter().copied().fold(0.0, f32::max);
        Self {
            size,
            heights,
            peak,
            height_multiplier: 0.0,
            loaded: false,
            needs_rebuild: false,
        }
    }

    /// Maps 8-bit luma linearly onto [0, 50], resampled to `size x size`.
    pub fn from_image(img: &GrayImage, size: usize) -> Self {
        let side = size as u32;
        let resized;
        let img = if img.dimensions() == (side, side) {
            img
        } else {
            resized = imageops::resize(img, side, side, FilterType::Triangle);
            &resized
        };

        let heights = img.pixels().map(|p| p.0[0] as f32 / 255.0 * IMAGE_MAX_HEIGHT).collect();
        let mut field = Self::from_heights(size, heights);
        field.loaded = true;
        field
    }

    pub fn load_image(path: &Path, size: usize) -> Result<Self, AssetError> {
        let img = image::open(path)?.to_luma8();
        log::info!("Loaded heightmap {} ({}x{})", path.display(), img.width(), img.height());
        Ok(Self::from_image(&img, size))
    }

    /// Island falloff from the center with a little seeded jitter.
    pub fn generate_fallback(size: usize, seed: u32) -> Self {
        let mut rng = Lcg::new(seed);
        let half = size as f32 / 2.0;
        let mut heights = Vec::with_capacity(size * size);

        for z in 0..size {
            for x in 0..size {
                let dx = x as f32 - half;
                let dz = z as f32 - half;
                let norm_dist = (dx * dx + dz * dz).sqrt() / half;

                let base = ((1.0 - norm_dist) * ISLAND_PEAK).max(0.0);
                let jitter = rng.next_f32() * 2.0 * JITTER - JITTER;
                heights.push((base + jitter).max(0.0));
            }
        }

        Self::from_heights(size, heights)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn height_multiplier(&self) -> f32 {
        self.height_multiplier
    }

    pub fn set_height_multiplier(&mut self, m: f32) {
        let m = m.clamp(0.0, MAX_HEIGHT_MULTIPLIER);
        if m != self.height_multiplier {
            self.height_multiplier = m;
            self.needs_rebuild = true;
        }
    }

    pub fn request_rebuild(&mut self) {
        self.needs_rebuild = true;
    }

    /// Returns the pending rebuild flag and clears it.
    pub fn take_rebuild(&mut self) -> bool {
        std::mem::replace(&mut self.needs_rebuild, false)
    }

    #[inline(always)]
    fn cell(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.size + x]
    }

    /// Bilinear sample of the raw grid at fractional grid coordinates,
    /// clamped to the field edges.
    pub fn sample(&self, gx: f32, gz: f32) -> f32 {
        let last = (self.size - 1) as f32;
        let gx = gx.clamp(0.0, last);
        let gz = gz.clamp(0.0, last);

        let x0 = gx.floor() as usize;
        let z0 = gz.floor() as usize;
        let x1 = (x0 + 1).min(self.size - 1);
        let z1 = (z0 + 1).min(self.size - 1);
        let fx = gx - x0 as f32;
        let fz = gz - z0 as f32;

        let top = lerp(self.cell(x0, z0), self.cell(x1, z0), fx);
        let bottom = lerp(self.cell(x0, z1), self.cell(x1, z1), fx);
        lerp(top, bottom, fz)
    }

    pub fn height_at(&self, gx: f32, gz: f32, height_scale: f32) -> f32 {
        self.sample(gx, gz) * height_scale * self.height_multiplier
    }

    pub fn max_height(&self, height_scale: f32) -> f32 {
        self.peak * height_scale * self.height_multiplier
    }
}

// ---MATH-HELPERS---

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

struct Lcg {
    state: u32,
}

impl Lcg {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1).
    fn next_f32(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        (self.state >> 8) as f32 / (1u32 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn ramp_x(size: usize) -> HeightField {
        let heights = (0..size * size).map(|i| (i % size) as f32).collect();
        HeightField::from_heights(size, heights)
    }

    #[test]
    fn bilinear_interpolates_between_cells() {
        let field = HeightField::from_heights(2, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(field.sample(0.0, 0.0), 0.0);
        assert_eq!(field.sample(1.0, 1.0), 30.0);
        assert_eq!(field.sample(0.5, 0.0), 5.0);
        assert_eq!(field.sample(0.5, 0.5), 15.0);
        assert_eq!(field.sample(0.25, 1.0), 22.5);
    }

    #[test]
    fn sampling_clamps_outside_the_grid() {
        let field = ramp_x(4);
        assert_eq!(field.sample(-5.0, 1.0), 0.0);
        assert_eq!(field.sample(99.0, 1.0), 3.0);
        assert_eq!(field.sample(3.0, 3.0), 3.0);
    }

    #[test]
    fn multiplier_scales_reads_not_storage() {
        let mut field = ramp_x(4);
        assert_eq!(field.height_at(2.0, 0.0, HEIGHT_SCALE), 0.0);
        assert_eq!(field.max_height(HEIGHT_SCALE), 0.0);

        field.set_height_multiplier(1.5);
        assert_eq!(field.height_at(2.0, 0.0, HEIGHT_SCALE), 2.0 * 5.0 * 1.5);
        assert_eq!(field.max_height(HEIGHT_SCALE), 3.0 * 5.0 * 1.5);
        assert_eq!(field.sample(2.0, 0.0), 2.0);
    }

    #[test]
    fn multiplier_clamps_and_flags_rebuild() {
        let mut field = ramp_x(3);
        assert!(!field.take_rebuild());

        field.set_height_multiplier(7.0);
        assert_eq!(field.height_multiplier(), MAX_HEIGHT_MULTIPLIER);
        assert!(field.take_rebuild());
        assert!(!field.take_rebuild());

        field.set_height_multiplier(MAX_HEIGHT_MULTIPLIER);
        assert!(!field.take_rebuild(), "unchanged multiplier should not rebuild");

        field.set_height_multiplier(-1.0);
        assert_eq!(field.height_multiplier(), 0.0);
        assert!(field.take_rebuild());
    }

    #[test]
    fn fallback_is_seeded_island() {
        let a = HeightField::generate_fallback(64, 7);
        let b = HeightField::generate_fallback(64, 7);
        let c = HeightField::generate_fallback(64, 8);
        assert_eq!(a.heights, b.heights);
        assert_ne!(a.heights, c.heights);
        assert!(!a.loaded);

        let center = a.cell(32, 32);
        assert!((ISLAND_PEAK - JITTER..=ISLAND_PEAK + JITTER).contains(&center), "center {center}");
        let corner = a.cell(0, 0);
        assert!((0.0..=JITTER).contains(&corner), "corner {corner}");
        assert!(a.heights.iter().all(|h| *h >= 0.0));
    }

    #[test]
    fn image_maps_luma_to_height() {
        let img = GrayImage::from_fn(2, 2, |x, y| Luma([if x == 1 && y == 0 { 255 } else { 0 }]));
        let field = HeightField::from_image(&img, 2);
        assert!(field.loaded);
        assert_eq!(field.heights, vec![0.0, 50.0, 0.0, 0.0]);
        assert_eq!(field.peak, 50.0);
    }

    #[test]
    fn image_is_resampled_to_field_size() {
        let img = GrayImage::from_pixel(3, 3, Luma([255]));
        let field = HeightField::from_image(&img, 8);
        assert_eq!(field.size(), 8);
        assert_eq!(field.heights.len(), 64);
        assert!(field.heights.iter().all(|h| (h - 50.0).abs() < 0.5));
    }

    #[test]
    fn missing_image_is_an_error() {
        let err = HeightField::load_image(Path::new("no/such/heightmap.png"), 8);
        assert!(err.is_err());
    }
}
