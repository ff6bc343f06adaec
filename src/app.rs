use std::time::Instant;

use log::{debug, info};
use winit::{
    event::{ElementState, Event, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
};

use crate::{
    config::ViewerConfig,
    error::Result,
    gui::GuiTexture,
    input::{KeyState, MouseState},
    render_system::{model::ModelRegistry, RenderSystem, RenderStage},
    renderer::{GroundRenderer, GuiRenderer, MasterRenderer, MeshRenderer},
    scenes::{
        pokemon::{PokemonScene, LOADING_SCREEN},
        Scene,
    },
};

// frames longer than this are treated as a stall, not as movement
const MAX_FRAME_DELTA: f32 = 0.25;

///
/// Open the window, load the scene behind a loading screen and run until the
/// window closes. Returns early only if loading fails.
///
pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new();
    let mut render_system = RenderSystem::new(&event_loop, &config);

    let mut registry = ModelRegistry::new();
    let loading_screen = GuiTexture::load_model(&mut registry, config.asset(LOADING_SCREEN))?;
    render_system.upload_models(&registry);
    render_system.draw_loading_screen(loading_screen);

    let load_started = Instant::now();
    let mut master_renderer =
        MasterRenderer::new(MeshRenderer::new(), GroundRenderer::new(), GuiRenderer::new());
    let mut scene = PokemonScene::load(&config, &mut registry, &mut master_renderer)?;
    render_system.upload_models(&registry);
    info!("Loading took {:.2?}", load_started.elapsed());

    let mut keys = KeyState::new();
    let mut mouse = MouseState::default();
    let mut last_frame = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    render_system.render_stage = RenderStage::NeedsRedraw;
                }
                WindowEvent::KeyboardInput { input, .. } => {
                    if input.virtual_keycode == Some(VirtualKeyCode::Escape)
                        && input.state == ElementState::Pressed
                    {
                        *control_flow = ControlFlow::Exit;
                    }
                    keys.handle(&input);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    mouse.button(button, state);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let (dx, dy) = mouse.moved_to(position.x, position.y);
                    scene.cursor_moved(&mouse, dx, dy);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    scene.scrolled(MouseState::scroll_lines(delta));
                }
                _ => {}
            },
            Event::RedrawEventsCleared => {
                let now = Instant::now();
                let delta = (now - last_frame).as_secs_f32().min(MAX_FRAME_DELTA);
                last_frame = now;

                scene.update(&keys, delta);
                keys.end_frame();

                scene.submit(&mut master_renderer);
                let projection = render_system.projection();
                master_renderer.render(
                    &mut render_system,
                    projection,
                    scene.view_matrix(),
                    scene.light(),
                );
            }
            Event::LoopDestroyed => {
                debug!("Event loop closed");
                master_renderer.clean();
            }
            _ => {}
        }
    })
}
