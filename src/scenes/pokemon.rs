use log::{info, warn};
use nalgebra_glm::{vec2, vec3, TMat4};
use winit::event::VirtualKeyCode;

use super::Scene;
use crate::{
    camera::ThirdPersonCamera,
    config::ViewerConfig,
    entities::{mesh_wrapper::ScatterArea, Entity, Ground, MainCharacter, MeshWrapper, Terrain},
    error::Result,
    gui::{GuiTexture, Healthbar},
    input::{KeyState, MouseState},
    render_system::{
        lighting::light::Light,
        model::{ModelRegistry, TexturedModel, Transform},
    },
    renderer::MasterRenderer,
};

pub const LOADING_SCREEN: &str = "textures/LoadingScreen.tga";

const GROUND_TEXTURE: &str = "textures/Ground_grass3.tga";
const HEALTH_FILL: &str = "textures/HealthFill.tga";
const HEALTH_BORDER: &str = "textures/HealthBorder.tga";

const TREES_PER_WRAPPER: usize = 250;
const MAX_HP: u32 = 100;
const DAMAGE_PER_HIT: u32 = 10;

/// The trainer walking around a pokecenter in a forest.
pub struct PokemonScene {
    player: MainCharacter,
    props: Vec<Entity>,
    grounds: Vec<Ground>,
    healthbar: Healthbar,
    camera: ThirdPersonCamera,
    light: Light,
}

impl PokemonScene {
    ///
    /// Load every model into `registry` and hand the forests to `renderer`,
    /// which keeps drawing them until cleaned.
    ///
    pub fn load(
        config: &ViewerConfig,
        registry: &mut ModelRegistry,
        renderer: &mut MasterRenderer,
    ) -> Result<Self> {
        let object = |name: &str| config.asset(&format!("objects/{name}.obj"));
        let texture = |name: &str| config.asset(&format!("textures/{name}.tga"));

        let trainer = ModelRegistry::textured(object("Trainer"), texture("Trainer")).build(registry)?;
        let player = MainCharacter::new(
            Entity::new(
                trainer,
                Transform::new(vec3(0.0, 0.0, 0.0), 0.0, 180.0, 0.0, 0.1),
            )
            .with_material(0.2, 50.0),
        );

        let props = vec![
            Terrain::load(
                registry,
                object("Pokecenter"),
                texture("Pokecenter"),
                vec3(30.0, 1.2, -50.0),
                0.0,
                180.0,
                0.0,
                10.0,
            )?
            .with_material(1.0, 50.0),
            Terrain::load(
                registry,
                object("Squirtle"),
                texture("Squirtle"),
                vec3(-20.0, 0.0, -24.0),
                0.0,
                0.0,
                0.0,
                0.15,
            )?,
            Terrain::load(
                registry,
                object("Pikachu"),
                texture("Pikachu"),
                vec3(5.0, 0.0, -100.0),
                0.0,
                0.0,
                0.0,
                0.15,
            )?,
        ];

        let forest = ScatterArea {
            count: TREES_PER_WRAPPER,
            half_extent: 500.0,
            centre: (0.0, 0.0),
            min_scale: 0.01,
            max_scale: 0.04,
        };
        for (offset, name) in ["Tree2", "Tree"].into_iter().enumerate() {
            let model = ModelRegistry::textured(object(name), texture(name)).build(registry)?;
            renderer.process_wrapper(MeshWrapper::scatter(
                model,
                forest,
                config.scatter_seed.wrapping_add(offset as u64),
            ));
        }

        let grass = Ground::load_model(registry, config.asset(GROUND_TEXTURE))?;
        let grounds = [(-1, -1), (0, -1), (-1, 0), (0, 0)]
            .into_iter()
            .map(|(x, z)| Ground::new(x, z, grass))
            .collect();

        let fill = gui_model(registry, config, HEALTH_FILL, [200, 30, 30, 255]);
        let border = gui_model(registry, config, HEALTH_BORDER, [20, 20, 20, 160]);
        let healthbar = Healthbar::new(
            GuiTexture::new(fill, vec2(-0.7, 0.9), vec2(0.25, 0.03)),
            GuiTexture::new(border, vec2(-0.7, 0.9), vec2(0.26, 0.04)),
            MAX_HP,
        );

        let mut camera = ThirdPersonCamera::new();
        camera.move_to(&player.entity);

        info!("Scene loaded with {} models", registry.len());

        Ok(PokemonScene {
            player,
            props,
            grounds,
            healthbar,
            camera,
            light: Light::white(vec3(-50.0, 150.0, 10.0)),
        })
    }

    pub fn player(&self) -> &MainCharacter {
        &self.player
    }

    pub fn healthbar(&self) -> &Healthbar {
        &self.healthbar
    }

    pub fn camera(&self) -> &ThirdPersonCamera {
        &self.camera
    }
}

impl Scene for PokemonScene {
    fn update(&mut self, keys: &KeyState, delta: f32) {
        if keys.was_pressed(VirtualKeyCode::H) {
            self.healthbar.take_damage(DAMAGE_PER_HIT);
        }

        self.player.update(keys, delta);
        self.player.animate(delta);
        self.camera.move_to(&self.player.entity);
    }

    fn cursor_moved(&mut self, mouse: &MouseState, dx: f64, dy: f64) {
        self.camera.cursor_moved(mouse, dx, dy);
    }

    fn scrolled(&mut self, lines: f64) {
        self.camera.scrolled(lines);
    }

    fn submit(&self, renderer: &mut MasterRenderer) {
        renderer.process_entity(&self.player.entity);
        for prop in &self.props {
            renderer.process_entity(prop);
        }
        for ground in &self.grounds {
            renderer.process_ground(ground);
        }
        for gui in self.healthbar.guis() {
            renderer.process_gui(gui);
        }
    }

    fn view_matrix(&self) -> TMat4<f32> {
        self.camera.view_matrix()
    }

    fn light(&self) -> &Light {
        &self.light
    }
}

// The healthbar images are optional; plain colours stand in for missing ones.
fn gui_model(
    registry: &mut ModelRegistry,
    config: &ViewerConfig,
    file: &str,
    fallback: [u8; 4],
) -> TexturedModel {
    match GuiTexture::load_model(registry, config.asset(file)) {
        Ok(model) => model,
        Err(e) => {
            warn!("{e}; using a plain colour instead");
            GuiTexture::solid_model(registry, fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use super::*;
    use crate::{
        render_system::model::ModelId,
        renderer::{FrameSink, FrameUniforms, GuiInstance, InstanceData, PipelineKind},
    };

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

    // 1x1 uncompressed true-colour TGA
    fn tga() -> Vec<u8> {
        let mut bytes = vec![0u8; 18];
        bytes[2] = 2;
        bytes[12] = 1;
        bytes[14] = 1;
        bytes[16] = 24;
        bytes.extend_from_slice(&[0, 255, 0]);
        bytes
    }

    fn asset_tree(root: &Path) {
        fs::create_dir_all(root.join("objects")).unwrap();
        fs::create_dir_all(root.join("textures")).unwrap();
        for name in ["Trainer", "Pokecenter", "Squirtle", "Pikachu", "Tree2", "Tree"] {
            fs::write(root.join(format!("objects/{name}.obj")), TRIANGLE).unwrap();
            fs::write(root.join(format!("textures/{name}.tga")), tga()).unwrap();
        }
        fs::write(root.join(GROUND_TEXTURE), tga()).unwrap();
    }

    #[derive(Default)]
    struct Counter {
        bound: Vec<(PipelineKind, ModelId)>,
        instances: usize,
        guis: usize,
    }

    impl FrameSink for Counter {
        fn begin_frame(&mut self, _: &FrameUniforms) -> bool {
            true
        }
        fn bind_model(&mut self, kind: PipelineKind, model: ModelId) {
            self.bound.push((kind, model));
        }
        fn draw_instance(&mut self, _: &InstanceData) {
            self.instances += 1;
        }
        fn draw_gui(&mut self, _: &GuiInstance) {
            self.guis += 1;
        }
        fn end_frame(&mut self) {}
    }

    fn load() -> (tempfile::TempDir, ModelRegistry, MasterRenderer, PokemonScene) {
        let dir = tempfile::tempdir().unwrap();
        asset_tree(dir.path());
        let config = ViewerConfig {
            asset_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut registry = ModelRegistry::new();
        let mut renderer = MasterRenderer::default();
        let scene = PokemonScene::load(&config, &mut registry, &mut renderer).unwrap();
        (dir, registry, renderer, scene)
    }

    #[test]
    fn loads_the_demo_scene() {
        let (_dir, registry, _renderer, scene) = load();
        // six obj models, the grass ground and two plain healthbar colours
        assert_eq!(registry.len(), 9);
        assert_eq!(scene.healthbar().hp(), MAX_HP);
        assert_eq!(scene.player().entity.transform.rot_y, 180.0);
    }

    #[test]
    fn one_frame_draws_everything_once() {
        let (_dir, _registry, mut renderer, scene) = load();
        scene.submit(&mut renderer);
        assert_eq!(renderer.queued_entities(), 4);

        let mut sink = Counter::default();
        let stats = renderer.render(
            &mut sink,
            nalgebra_glm::identity(),
            scene.view_matrix(),
            scene.light(),
        );

        // four entity models, two forests and one ground model
        assert_eq!(stats.batches, 7);
        assert_eq!(sink.instances, 4 + 2 * TREES_PER_WRAPPER + 4);
        assert_eq!(sink.guis, 2);
        assert_eq!(
            sink.bound
                .iter()
                .filter(|(kind, _)| *kind == PipelineKind::Ground)
                .count(),
            1
        );
    }

    #[test]
    fn h_hurts_once_per_press() {
        let (_dir, _registry, _renderer, mut scene) = load();
        let mut keys = KeyState::new();
        keys.set(VirtualKeyCode::H, true);
        scene.update(&keys, 0.016);
        keys.end_frame();
        scene.update(&keys, 0.016);
        assert_eq!(scene.healthbar().hp(), MAX_HP - DAMAGE_PER_HIT);
    }

    #[test]
    fn camera_follows_the_player() {
        let (_dir, _registry, _renderer, mut scene) = load();
        let mut keys = KeyState::new();
        keys.set(VirtualKeyCode::W, true);
        let before = scene.camera().position;
        scene.update(&keys, 0.5);
        assert_ne!(scene.camera().position, before);
        assert!(scene.player().entity.transform.position.z < 0.0);
    }

    #[test]
    fn missing_model_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig {
            asset_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut registry = ModelRegistry::new();
        let mut renderer = MasterRenderer::default();
        assert!(PokemonScene::load(&config, &mut registry, &mut renderer).is_err());
    }
}
