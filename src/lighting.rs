//lighting.rs

use glam::Vec3;
use crate::common::Color;
use crate::config::GraphicsConfig;

pub const MAX_LIGHTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
    /// half-angle of the cone, degrees
    pub spot_angle: f32,
    pub enabled: bool,
}

impl Light {
    pub fn directional(position: Vec3, direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            position,
            direction,
            color,
            intensity,
            range: 1000.0,
            spot_angle: 0.0,
            enabled: true,
        }
    }

    pub fn point(position: Vec3, color: Color, intensity: f32, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            direction: Vec3::NEG_Y,
            color,
            intensity,
            range,
            spot_angle: 0.0,
            enabled: true,
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, color: Color, intensity: f32, range: f32, angle: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            position,
            direction,
            color,
            intensity,
            range,
            spot_angle: angle,
            enabled: true,
        }
    }

    /// Direction towards the light and its attenuation at `p`, or `None`
    /// when the point is out of range or outside the spot cone.
    fn incidence(&self, p: Vec3) -> Option<(Vec3, f32)> {
        if self.kind == LightKind::Directional {
            return Some((-self.direction.normalize_or_zero(), 1.0));
        }

        let to_light = self.position - p;
        let distance = to_light.length();
        if distance > self.range {
            return None;
        }
        let light_dir = to_light.normalize_or_zero();
        let mut attenuation = 1.0 / (1.0 + 0.09 * distance + 0.032 * distance * distance);

        if self.kind == LightKind::Spot {
            let spot_cos = (-light_dir).dot(self.direction);
            if spot_cos < self.spot_angle.to_radians().cos() {
                return None;
            }
            attenuation *= spot_cos;
        }

        Some((light_dir, attenuation))
    }
}

pub struct LightingEnvironment {
    lights: Vec<Light>,
    pub ambient_color: Color,
    pub ambient_intensity: f32,
    pub elapsed_time: f32,
}

impl Default for LightingEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl LightingEnvironment {
    const ORBIT_RADIUS: f32 = 80.0;
    const ORBIT_SPEED: f32 = 0.5;

    pub fn new() -> Self {
        Self {
            lights: Vec::with_capacity(MAX_LIGHTS),
            ambient_color: Color::rgb(30, 30, 40),
            ambient_intensity: 0.2,
            elapsed_time: 0.0,
        }
    }

    /// Sun, a warm point light over the origin and a blue spot.
    pub fn with_default_rig() -> Self {
        let mut env = Self::new();
        env.add_light(Light::directional(SUN_POSITION, Vec3::new(-0.3, -1.0, -0.2), Color::YELLOW, 1.0));
        env.add_light(Light::point(Vec3::new(0.0, 15.0, 0.0), Color::ORANGE, 2.0, 100.0));
        env.add_light(Light::spot(Vec3::new(50.0, 20.0, 0.0), Vec3::new(-1.0, -1.0, 0.0), Color::BLUE, 1.5, 80.0, 45.0));
        env
    }

    /// Ignored once `MAX_LIGHTS` are registered.
    pub fn add_light(&mut self, mut light: Light) {
        if self.lights.len() >= MAX_LIGHTS {
            log::debug!("Light list full ({MAX_LIGHTS}), dropping {:?} light", light.kind);
            return;
        }
        light.direction = light.direction.normalize_or_zero();
        light.enabled = true;
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Advances the orbit of the leading point light.
    pub fn animate(&mut self, dt: f32) {
        self.elapsed_time += dt;
        let angle = self.elapsed_time * Self::ORBIT_SPEED;
        if let Some(light) = self.lights.first_mut() {
            if light.kind == LightKind::Point {
                light.position.x = angle.cos() * Self::ORBIT_RADIUS;
                light.position.z = angle.sin() * Self::ORBIT_RADIUS;
            }
        }
    }
}

// --- SHADING ---

pub const SUN_POSITION: Vec3 = Vec3::new(50.0, 100.0, 50.0);

fn to_vec(c: Color) -> Vec3 {
    Vec3::new(c.r as f32, c.g as f32, c.b as f32)
}

fn to_color(v: Vec3, alpha: u8) -> Color {
    let v = v.clamp(Vec3::ZERO, Vec3::splat(255.0));
    Color { r: v.x as u8, g: v.y as u8, b: v.z as u8, a: alpha }
}

/// Lambert against the fixed sun with a 0.3 floor.
pub fn shade_simple(position: Vec3, normal: Vec3, base: Color) -> Color {
    let to_sun = (SUN_POSITION - position).normalize_or_zero();
    let intensity = 0.3 + 0.7 * normal.dot(to_sun).max(0.0);
    to_color(to_vec(base) * intensity, base.a)
}

/// Blinn-Phong contribution of one light before clamping.
fn light_contribution(light: &Light, position: Vec3, normal: Vec3, view: Vec3, base: Vec3, config: &GraphicsConfig) -> Vec3 {
    let Some((light_dir, attenuation)) = light.incidence(position) else {
        return Vec3::ZERO;
    };

    let n_dot_l = normal.dot(light_dir).max(0.0);
    let half = (light_dir + view).normalize_or_zero();
    let n_dot_h = normal.dot(half).max(0.0);
    let specular = n_dot_h.powf(config.shininess) * config.specular_strength;

    let strength = light.intensity * attenuation;
    base * (strength * n_dot_l) + to_vec(light.color) * (strength * specular)
}

/// Per-vertex color. A missing view direction means the vertex is seen head-on.
pub fn shade(position: Vec3, normal: Vec3, view_dir: Option<Vec3>, base: Color, env: &LightingEnvironment, config: &GraphicsConfig) -> Color {
    if !config.advanced_shading {
        return shade_simple(position, normal, base);
    }

    let base_v = to_vec(base);
    let view = view_dir.unwrap_or(normal);

    let mut acc = to_vec(env.ambient_color) * env.ambient_intensity * base_v / 255.0;
    for light in env.lights.iter().filter(|l| l.enabled) {
        acc += light_contribution(light, position, normal, view, base_v, config);
    }

    to_color(acc, base.a)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREY: Color = Color::rgb(200, 200, 200);

    fn advanced() -> GraphicsConfig {
        GraphicsConfig { advanced_shading: true, ..GraphicsConfig::default() }
    }

    fn ambient_only(base: Color) -> Color {
        shade(Vec3::ZERO, Vec3::Y, None, base, &LightingEnvironment::new(), &advanced())
    }

    #[test]
    fn simple_mode_matches_lambert_formula() {
        let cfg = GraphicsConfig { advanced_shading: false, ..GraphicsConfig::default() };
        let out = shade(Vec3::ZERO, Vec3::Y, None, GREY, &LightingEnvironment::new(), &cfg);

        let n_dot_l = 100.0 / (50.0f32 * 50.0 + 100.0 * 100.0 + 50.0 * 50.0).sqrt();
        let expected = (200.0 * (0.3 + 0.7 * n_dot_l)) as u8;
        assert_eq!(expected, 174);
        assert_eq!(out, Color { r: expected, g: expected, b: expected, a: 255 });
    }

    #[test]
    fn simple_mode_ignores_lights() {
        let cfg = GraphicsConfig { advanced_shading: false, ..GraphicsConfig::default() };
        let lit = LightingEnvironment::with_default_rig();
        let a = shade(Vec3::new(3.0, 0.0, -2.0), Vec3::Y, None, GREY, &lit, &cfg);
        assert_eq!(a, shade_simple(Vec3::new(3.0, 0.0, -2.0), Vec3::Y, GREY));
    }

    #[test]
    fn empty_environment_is_pure_ambient() {
        let out = ambient_only(GREY);
        // 30 * 0.2 * 200 / 255 and 40 * 0.2 * 200 / 255
        assert_eq!(out, Color { r: 4, g: 4, b: 6, a: 255 });
    }

    #[test]
    fn point_light_out_of_range_contributes_nothing() {
        let mut env = LightingEnvironment::new();
        env.add_light(Light::point(Vec3::new(0.0, 50.0, 0.0), Color::WHITE, 5.0, 10.0));
        let out = shade(Vec3::ZERO, Vec3::Y, None, GREY, &env, &advanced());
        assert_eq!(out, ambient_only(GREY));
    }

    #[test]
    fn point_light_in_range_brightens() {
        let mut env = LightingEnvironment::new();
        env.add_light(Light::point(Vec3::new(0.0, 5.0, 0.0), Color::WHITE, 1.0, 10.0));
        let out = shade(Vec3::ZERO, Vec3::Y, None, GREY, &env, &advanced());
        assert!(out.r > ambient_only(GREY).r);
    }

    #[test]
    fn contribution_is_monotonic_in_intensity() {
        let cfg = advanced();
        let pos = Vec3::new(1.0, 0.0, 2.0);
        let normal = Vec3::new(0.2, 1.0, 0.1).normalize();
        let base = to_vec(Color::rgb(120, 60, 200));
        let lights = [
            Light::point(Vec3::new(4.0, 6.0, -1.0), Color::ORANGE, 0.0, 50.0),
            Light::spot(Vec3::new(0.0, 8.0, 0.0), Vec3::NEG_Y, Color::BLUE, 0.0, 50.0, 60.0),
            Light::directional(Vec3::ZERO, Vec3::new(-0.3, -1.0, -0.2).normalize(), Color::YELLOW, 0.0),
        ];
        for template in lights {
            let mut prev = Vec3::ZERO;
            for step in 0..10 {
                let light = Light { intensity: step as f32 * 0.5, ..template };
                let c = light_contribution(&light, pos, normal, normal, base, &cfg);
                assert!(c.cmpge(prev).all(), "{:?} decreased: {prev} -> {c}", template.kind);
                prev = c;
            }
            assert!(prev.max_element() > 0.0);
        }
    }

    #[test]
    fn spot_outside_cone_is_skipped() {
        let mut env = LightingEnvironment::new();
        // pointing straight up, away from the shaded point below it
        env.add_light(Light::spot(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, Color::WHITE, 3.0, 50.0, 30.0));
        let out = shade(Vec3::ZERO, Vec3::Y, None, GREY, &env, &advanced());
        assert_eq!(out, ambient_only(GREY));
    }

    #[test]
    fn disabled_lights_are_ignored() {
        let mut env = LightingEnvironment::new();
        env.add_light(Light::point(Vec3::new(0.0, 5.0, 0.0), Color::WHITE, 3.0, 50.0));
        env.lights[0].enabled = false;
        let out = shade(Vec3::ZERO, Vec3::Y, None, GREY, &env, &advanced());
        assert_eq!(out, ambient_only(GREY));
    }

    #[test]
    fn output_saturates_and_keeps_alpha() {
        let mut env = LightingEnvironment::new();
        env.add_light(Light::directional(Vec3::ZERO, Vec3::NEG_Y, Color::WHITE, 50.0));
        let base = Color { r: 200, g: 10, b: 90, a: 77 };
        let out = shade(Vec3::ZERO, Vec3::Y, None, base, &env, &advanced());
        assert_eq!(out, Color { r: 255, g: 255, b: 255, a: 77 });
    }

    #[test]
    fn shading_is_deterministic() {
        let env = LightingEnvironment::with_default_rig();
        let cfg = advanced();
        let p = Vec3::new(12.0, 1.0, -7.0);
        let n = Vec3::new(0.3, 0.9, 0.1).normalize();
        let a = shade(p, n, Some(Vec3::Y), GREY, &env, &cfg);
        let b = shade(p, n, Some(Vec3::Y), GREY, &env, &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn add_light_caps_at_max_and_normalizes() {
        let mut env = LightingEnvironment::new();
        for i in 0..12 {
            let mut l = Light::spot(Vec3::ZERO, Vec3::new(0.0, -3.0, 4.0), Color::WHITE, i as f32, 10.0, 30.0);
            l.enabled = false;
            env.add_light(l);
        }
        assert_eq!(env.lights().len(), MAX_LIGHTS);
        assert_eq!(env.lights()[7].intensity, 7.0);
        for l in env.lights() {
            assert!(l.enabled);
            assert!((l.direction.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn leading_point_light_orbits() {
        let mut env = LightingEnvironment::new();
        env.add_light(Light::point(Vec3::new(0.0, 15.0, 0.0), Color::ORANGE, 2.0, 100.0));
        env.animate(std::f32::consts::PI);
        let p = env.lights()[0].position;
        assert!(p.x.abs() < 1e-3);
        assert!((p.z - 80.0).abs() < 1e-3);
        assert_eq!(p.y, 15.0);
        assert_eq!(env.elapsed_time, std::f32::consts::PI);
    }

    #[test]
    fn default_rig_keeps_sun_still() {
        let mut env = LightingEnvironment::with_default_rig();
        let before = env.lights()[0].position;
        env.animate(2.0);
        assert_eq!(env.lights()[0].position, before);
        assert_eq!(env.lights().len(), 3);
    }
}
