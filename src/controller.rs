//engine controller

use std::f32::consts::FRAC_PI_2;
use glam::Vec3;
use winit::keyboard::KeyCode;
use crate::common::{Camera, PLAYER_HEIGHT};

/// Discrete actions bound to single key presses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SelectScene(usize),
    Adjust(i32),
    ToggleAntialiasing,
    CycleWireframe,
    ToggleHighQuality,
    ToggleShading,
    CycleSpecular,
    ToggleCursorLock,
    Quit,
}

pub fn command_for(key: KeyCode) -> Option<Command> {
    let cmd = match key {
        KeyCode::Digit1 => Command::SelectScene(0),
        KeyCode::Digit2 => Command::SelectScene(1),
        KeyCode::Digit3 => Command::SelectScene(2),
        KeyCode::Equal | KeyCode::NumpadAdd => Command::Adjust(1),
        KeyCode::Minus | KeyCode::NumpadSubtract => Command::Adjust(-1),
        KeyCode::F1 => Command::ToggleAntialiasing,
        KeyCode::F2 => Command::CycleWireframe,
        KeyCode::F3 => Command::ToggleHighQuality,
        KeyCode::F4 => Command::ToggleShading,
        KeyCode::F5 => Command::CycleSpecular,
        KeyCode::Tab => Command::ToggleCursorLock,
        KeyCode::Escape => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// First-person walker. Moves along the full view direction and never drops below eye height.
pub struct Controller {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub move_speed: f32,
    pub mouse_sens: f32,
    pub cursor_locked: bool,

    mouse_delta: (f32, f32),
    keys: [bool; 4], // W, A, S, D
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.1;

    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, PLAYER_HEIGHT, 10.0),
            yaw: 0.0,
            pitch: 0.0,
            move_speed: 8.0,
            mouse_sens: 0.01,
            cursor_locked: true,
            mouse_delta: (0.0, 0.0),
            keys: [false; 4],
        }
    }

    /// Returns true if the key drives movement.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        let slot = match key {
            KeyCode::KeyW => 0,
            KeyCode::KeyA => 1,
            KeyCode::KeyS => 2,
            KeyCode::KeyD => 3,
            _ => return false,
        };
        self.keys[slot] = pressed;
        true
    }

    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.cursor_locked {
            self.mouse_delta.0 += delta.0 as f32;
            self.mouse_delta.1 += delta.1 as f32;
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    pub fn update(&mut self, dt: f32) {
        // --- LOOK ---
        let (dx, dy) = std::mem::take(&mut self.mouse_delta);
        self.yaw += dx * self.mouse_sens;
        self.pitch = (self.pitch - dy * self.mouse_sens).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);

        // --- MOVE ---
        let forward = self.forward();
        let right = forward.cross(Vec3::Y).normalize_or_zero();

        let mut dir = Vec3::ZERO;
        if self.keys[0] { dir += forward; }
        if self.keys[1] { dir -= right; }
        if self.keys[2] { dir -= forward; }
        if self.keys[3] { dir += right; }

        self.position += dir.normalize_or_zero() * self.move_speed * dt;
        self.position.y = self.position.y.max(PLAYER_HEIGHT);
    }

    pub fn camera(&self) -> Camera {
        Camera::new(self.position, self.position + self.forward())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_looking_down_negative_z() {
        let c = Controller::new();
        assert_eq!(c.position, Vec3::new(0.0, 2.5, 10.0));
        let cam = c.camera();
        assert!((cam.target - Vec3::new(0.0, 2.5, 9.0)).length() < 1e-6);
    }

    #[test]
    fn walks_at_move_speed() {
        let mut c = Controller::new();
        c.set_key(KeyCode::KeyW, true);
        c.update(0.5);
        assert!((c.position - Vec3::new(0.0, 2.5, 6.0)).length() < 1e-5);

        c.set_key(KeyCode::KeyW, false);
        c.set_key(KeyCode::KeyD, true);
        c.update(0.25);
        assert!((c.position.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn floor_clamp_holds_eye_height() {
        let mut c = Controller::new();
        c.pitch = -1.2;
        c.set_key(KeyCode::KeyW, true);
        for _ in 0..60 {
            c.update(1.0 / 60.0);
        }
        assert_eq!(c.position.y, PLAYER_HEIGHT);
        assert!(c.position.z < 10.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut c = Controller::new();
        c.process_mouse_motion((0.0, -10_000.0));
        c.update(0.0);
        assert_eq!(c.pitch, Controller::PITCH_LIMIT);
        c.process_mouse_motion((0.0, 10_000.0));
        c.update(0.0);
        assert_eq!(c.pitch, -Controller::PITCH_LIMIT);
    }

    #[test]
    fn mouse_ignored_when_unlocked() {
        let mut c = Controller::new();
        c.cursor_locked = false;
        c.process_mouse_motion((50.0, 50.0));
        c.update(0.016);
        assert_eq!((c.yaw, c.pitch), (0.0, 0.0));
    }

    #[test]
    fn key_bindings() {
        assert_eq!(command_for(KeyCode::Digit2), Some(Command::SelectScene(1)));
        assert_eq!(command_for(KeyCode::NumpadSubtract), Some(Command::Adjust(-1)));
        assert_eq!(command_for(KeyCode::F4), Some(Command::ToggleShading));
        assert_eq!(command_for(KeyCode::KeyW), None);
        assert!(!Controller::new().set_key(KeyCode::F1, true));
    }
}
