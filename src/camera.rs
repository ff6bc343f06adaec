use nalgebra_glm::{identity, rotate_x, rotate_y, translate, vec3, TMat4, TVec3};

use crate::{entities::Entity, input::MouseState};

const DEFAULT_DISTANCE: f32 = 50.0;
const DEFAULT_PITCH: f32 = 20.0;

const MIN_DISTANCE: f32 = 10.0;
const MAX_DISTANCE: f32 = 200.0;
const MIN_PITCH: f32 = 5.0;
const MAX_PITCH: f32 = 85.0;

// degrees per pixel of cursor travel, distance per wheel notch
const ANGLE_SENSITIVITY: f32 = 0.3;
const PITCH_SENSITIVITY: f32 = 0.1;
const ZOOM_SENSITIVITY: f32 = 2.0;

/// Orbits the player: left drag swings around, right drag tilts, wheel zooms.
#[derive(Debug, Clone)]
pub struct ThirdPersonCamera {
    pub position: TVec3<f32>,
    /// Degrees.
    pub pitch: f32,
    /// Degrees.
    pub yaw: f32,
    distance_from_player: f32,
    angle_around_player: f32,
}

impl Default for ThirdPersonCamera {
    fn default() -> Self {
        ThirdPersonCamera {
            position: vec3(0.0, 0.0, 0.0),
            pitch: DEFAULT_PITCH,
            yaw: 0.0,
            distance_from_player: DEFAULT_DISTANCE,
            angle_around_player: 0.0,
        }
    }
}

impl ThirdPersonCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_from_player(&self) -> f32 {
        self.distance_from_player
    }

    pub fn angle_around_player(&self) -> f32 {
        self.angle_around_player
    }

    pub fn cursor_moved(&mut self, mouse: &MouseState, dx: f64, dy: f64) {
        if mouse.left_held {
            self.angle_around_player -= dx as f32 * ANGLE_SENSITIVITY;
        }
        if mouse.right_held {
            self.pitch = (self.pitch - dy as f32 * PITCH_SENSITIVITY).clamp(MIN_PITCH, MAX_PITCH);
        }
    }

    pub fn scrolled(&mut self, lines: f64) {
        self.distance_from_player = (self.distance_from_player - lines as f32 * ZOOM_SENSITIVITY)
            .clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Places the camera behind and above `player`.
    pub fn move_to(&mut self, player: &Entity) {
        let pitch = self.pitch.to_radians();
        let horizontal = self.distance_from_player * pitch.cos();
        let vertical = self.distance_from_player * pitch.sin();

        let theta = player.transform.rot_y + self.angle_around_player;
        let offset_x = horizontal * theta.to_radians().sin();
        let offset_z = horizontal * theta.to_radians().cos();

        let target = player.transform.position;
        self.position = vec3(target.x - offset_x, target.y + vertical, target.z - offset_z);
        self.yaw = 180.0 - theta;
    }

    pub fn view_matrix(&self) -> TMat4<f32> {
        let mut view: TMat4<f32> = identity();
        view = rotate_x(&view, self.pitch.to_radians());
        view = rotate_y(&view, self.yaw.to_radians());
        translate(&view, &-self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_system::model::{ModelId, TexturedModel, Transform};
    use approx::assert_relative_eq;
    use nalgebra_glm::{length, vec4};
    use winit::event::{ElementState, MouseButton};

    fn player_at(position: TVec3<f32>, rot_y: f32) -> Entity {
        Entity::new(
            TexturedModel { id: ModelId(0) },
            Transform::new(position, 0.0, rot_y, 0.0, 1.0),
        )
    }

    #[test]
    fn sits_behind_and_above_the_player() {
        let mut camera = ThirdPersonCamera::new();
        let player = player_at(vec3(10.0, 0.0, 5.0), 0.0);
        camera.move_to(&player);

        assert_relative_eq!(
            length(&(camera.position - player.transform.position)),
            50.0,
            epsilon = 1e-3
        );
        assert!(camera.position.y > 0.0);
        assert!(camera.position.z < 5.0);
        assert_relative_eq!(camera.position.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(camera.yaw, 180.0);
    }

    #[test]
    fn player_is_straight_ahead_in_view_space() {
        let mut camera = ThirdPersonCamera::new();
        let player = player_at(vec3(3.0, 0.0, -7.0), 135.0);
        camera.move_to(&player);

        let p = player.transform.position;
        let in_view = camera.view_matrix() * vec4(p.x, p.y, p.z, 1.0);
        assert_relative_eq!(in_view.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(in_view.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(in_view.z, -50.0, epsilon = 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = ThirdPersonCamera::new();
        camera.scrolled(1000.0);
        assert_eq!(camera.distance_from_player(), MIN_DISTANCE);
        camera.scrolled(-1000.0);
        assert_eq!(camera.distance_from_player(), MAX_DISTANCE);
    }

    #[test]
    fn drags_need_a_held_button() {
        let mut camera = ThirdPersonCamera::new();
        let mut mouse = MouseState::default();
        camera.cursor_moved(&mouse, 10.0, 10.0);
        assert_eq!(camera.angle_around_player(), 0.0);
        assert_eq!(camera.pitch, DEFAULT_PITCH);

        mouse.button(MouseButton::Left, ElementState::Pressed);
        camera.cursor_moved(&mouse, 10.0, 10.0);
        assert_relative_eq!(camera.angle_around_player(), -3.0);
        assert_eq!(camera.pitch, DEFAULT_PITCH);

        mouse.button(MouseButton::Right, ElementState::Pressed);
        camera.cursor_moved(&mouse, 0.0, -1000.0);
        assert_eq!(camera.pitch, MAX_PITCH);
    }
}
