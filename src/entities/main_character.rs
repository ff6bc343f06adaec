use std::f32::consts::TAU;

use winit::event::VirtualKeyCode;

use super::Entity;
use crate::input::KeyState;

const RUN_SPEED: f32 = 20.0;
const TURN_SPEED: f32 = 160.0;
const GRAVITY: f32 = -50.0;
const JUMP_POWER: f32 = 30.0;
const GROUND_HEIGHT: f32 = 0.0;

// walk sway: radians of phase per second, and peak roll in degrees
const WALK_CYCLE_RATE: f32 = 10.0;
const SWAY_DEGREES: f32 = 5.0;

/// The player-controlled entity.
pub struct MainCharacter {
    pub entity: Entity,
    current_speed: f32,
    current_turn_speed: f32,
    upwards_speed: f32,
    in_air: bool,
    walk_phase: f32,
}

impl MainCharacter {
    pub fn new(entity: Entity) -> Self {
        MainCharacter {
            entity,
            current_speed: 0.0,
            current_turn_speed: 0.0,
            upwards_speed: 0.0,
            in_air: false,
            walk_phase: 0.0,
        }
    }

    /// Applies this frame's input and integrates movement over `delta` seconds.
    pub fn update(&mut self, keys: &KeyState, delta: f32) {
        self.check_inputs(keys);

        let transform = &mut self.entity.transform;
        transform.increase_rotation(0.0, self.current_turn_speed * delta, 0.0);

        let distance = self.current_speed * delta;
        let heading = transform.rot_y.to_radians();
        transform.position.x += distance * heading.sin();
        transform.position.z += distance * heading.cos();

        self.upwards_speed += GRAVITY * delta;
        transform.position.y += self.upwards_speed * delta;
        if transform.position.y < GROUND_HEIGHT {
            transform.position.y = GROUND_HEIGHT;
            self.upwards_speed = 0.0;
            self.in_air = false;
        }
    }

    /// Rolls the model side to side while running.
    pub fn animate(&mut self, delta: f32) {
        if self.current_speed == 0.0 || self.in_air {
            self.walk_phase = 0.0;
            self.entity.transform.rot_z = 0.0;
            return;
        }

        self.walk_phase = (self.walk_phase + WALK_CYCLE_RATE * delta) % TAU;
        self.entity.transform.rot_z = self.walk_phase.sin() * SWAY_DEGREES;
    }

    pub fn is_in_air(&self) -> bool {
        self.in_air
    }

    fn jump(&mut self) {
        if !self.in_air {
            self.upwards_speed = JUMP_POWER;
            self.in_air = true;
        }
    }

    fn check_inputs(&mut self, keys: &KeyState) {
        self.current_speed = if keys.is_down(VirtualKeyCode::W) {
            RUN_SPEED
        } else if keys.is_down(VirtualKeyCode::S) {
            -RUN_SPEED
        } else {
            0.0
        };

        self.current_turn_speed = if keys.is_down(VirtualKeyCode::D) {
            -TURN_SPEED
        } else if keys.is_down(VirtualKeyCode::A) {
            TURN_SPEED
        } else {
            0.0
        };

        if keys.is_down(VirtualKeyCode::Space) {
            self.jump();
        }
    }
}
