use nalgebra_glm::TMat4;

use crate::{
    input::{KeyState, MouseState},
    render_system::lighting::light::Light,
    renderer::MasterRenderer,
};

pub mod pokemon;

pub trait Scene {
    /// Advances the scene by `delta` seconds.
    fn update(&mut self, keys: &KeyState, delta: f32);

    fn cursor_moved(&mut self, mouse: &MouseState, dx: f64, dy: f64);

    fn scrolled(&mut self, lines: f64);

    /// Queues everything visible this frame.
    fn submit(&self, renderer: &mut MasterRenderer);

    fn view_matrix(&self) -> TMat4<f32>;

    fn light(&self) -> &Light;
}
