use std::collections::HashSet;

use winit::event::{ElementState, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode};

// winit reports touchpad scrolling in pixels; this many pixels count as one wheel notch
const PIXELS_PER_LINE: f64 = 40.0;

/// Keys currently held down.
#[derive(Debug, Default)]
pub struct KeyState {
    held: HashSet<VirtualKeyCode>,
    pressed_this_frame: HashSet<VirtualKeyCode>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, input: &KeyboardInput) {
        if let Some(key) = input.virtual_keycode {
            self.set(key, input.state == ElementState::Pressed);
        }
    }

    pub fn set(&mut self, key: VirtualKeyCode, pressed: bool) {
        if pressed {
            if self.held.insert(key) {
                self.pressed_this_frame.insert(key);
            }
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_down(&self, key: VirtualKeyCode) -> bool {
        self.held.contains(&key)
    }

    /// True once per physical key press, until [`KeyState::end_frame`].
    pub fn was_pressed(&self, key: VirtualKeyCode) -> bool {
        self.pressed_this_frame.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.pressed_this_frame.clear();
    }
}

#[derive(Debug, Default)]
pub struct MouseState {
    pub left_held: bool,
    pub right_held: bool,
    last_position: Option<(f64, f64)>,
}

impl MouseState {
    pub fn button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left_held = pressed,
            MouseButton::Right => self.right_held = pressed,
            _ => {}
        }
    }

    /// Records the new cursor position and returns the movement since the last one.
    pub fn moved_to(&mut self, x: f64, y: f64) -> (f64, f64) {
        let delta = match self.last_position {
            Some((lx, ly)) => (x - lx, y - ly),
            None => (0.0, 0.0),
        };
        self.last_position = Some((x, y));
        delta
    }

    pub fn scroll_lines(delta: MouseScrollDelta) -> f64 {
        match delta {
            MouseScrollDelta::LineDelta(_, y) => y as f64,
            MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_LINE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn keys_track_press_and_release() {
        let mut keys = KeyState::new();
        keys.set(VirtualKeyCode::W, true);
        assert!(keys.is_down(VirtualKeyCode::W));
        assert!(keys.was_pressed(VirtualKeyCode::W));

        keys.end_frame();
        keys.set(VirtualKeyCode::W, true); // key repeat
        assert!(keys.is_down(VirtualKeyCode::W));
        assert!(!keys.was_pressed(VirtualKeyCode::W));

        keys.set(VirtualKeyCode::W, false);
        assert!(!keys.is_down(VirtualKeyCode::W));
    }

    #[test]
    fn first_cursor_event_has_no_delta() {
        let mut mouse = MouseState::default();
        assert_eq!(mouse.moved_to(100.0, 50.0), (0.0, 0.0));
        assert_eq!(mouse.moved_to(110.0, 45.0), (10.0, -5.0));
    }

    #[test]
    fn buttons_toggle() {
        let mut mouse = MouseState::default();
        mouse.button(MouseButton::Left, ElementState::Pressed);
        mouse.button(MouseButton::Right, ElementState::Pressed);
        assert!(mouse.left_held && mouse.right_held);
        mouse.button(MouseButton::Left, ElementState::Released);
        assert!(!mouse.left_held);
    }

    #[test]
    fn scroll_normalises_pixels() {
        assert_eq!(MouseState::scroll_lines(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 80.0));
        assert_eq!(MouseState::scroll_lines(pixels), 2.0);
    }
}
