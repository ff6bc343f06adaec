//! Frame composition: collects what should be drawn this frame, groups it by
//! pipeline and model, and replays it into a [`FrameSink`] in a fixed order.

mod ground_renderer;
mod gui_renderer;
mod mesh_renderer;

pub use self::{
    ground_renderer::GroundRenderer, gui_renderer::GuiRenderer, mesh_renderer::MeshRenderer,
};

use std::collections::BTreeMap;

use log::trace;
use nalgebra_glm::TMat4;

use crate::{
    entities::{Entity, Ground, MeshWrapper},
    gui::GuiTexture,
    render_system::{
        lighting::light::Light,
        model::{Material, ModelId},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Entity,
    Ground,
}

/// Per-frame uniforms shared by every 3D draw.
#[derive(Debug, Clone)]
pub struct FrameUniforms {
    pub projection: TMat4<f32>,
    pub view: TMat4<f32>,
    pub light: Light,
}

/// Per-draw uniforms for one placed model.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceData {
    pub transform: TMat4<f32>,
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuiInstance {
    pub texture: ModelId,
    pub position: [f32; 2],
    pub scale: [f32; 2],
}

/// Something that turns a frame's draw stream into pixels.
///
/// Calls always arrive as `begin_frame`, then any number of `bind_model`
/// each followed by its `draw_instance`s, then `draw_gui`s, then `end_frame`.
pub trait FrameSink {
    /// Returns false when the frame cannot be drawn (e.g. the swapchain is out
    /// of date); nothing else is sent for that frame.
    fn begin_frame(&mut self, frame: &FrameUniforms) -> bool;

    fn bind_model(&mut self, pipeline: PipelineKind, model: ModelId);

    fn draw_instance(&mut self, instance: &InstanceData);

    fn draw_gui(&mut self, gui: &GuiInstance);

    fn end_frame(&mut self);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub batches: usize,
    pub instances: usize,
    pub guis: usize,
}

/// Owns the per-type renderers and the queues they draw from.
#[derive(Default)]
pub struct MasterRenderer {
    mesh_renderer: MeshRenderer,
    ground_renderer: GroundRenderer,
    gui_renderer: GuiRenderer,

    entities: BTreeMap<ModelId, Vec<Entity>>,
    grounds: Vec<Ground>,
    guis: Vec<GuiTexture>,
    wrappers: Vec<MeshWrapper>,
}

impl MasterRenderer {
    pub fn new(
        mesh_renderer: MeshRenderer,
        ground_renderer: GroundRenderer,
        gui_renderer: GuiRenderer,
    ) -> Self {
        MasterRenderer {
            mesh_renderer,
            ground_renderer,
            gui_renderer,
            ..Default::default()
        }
    }

    /// Queues an entity for the next frame only.
    pub fn process_entity(&mut self, entity: &Entity) {
        self.entities
            .entry(entity.model_id())
            .or_default()
            .push(entity.clone());
    }

    /// Queues a ground tile for the next frame only.
    pub fn process_ground(&mut self, ground: &Ground) {
        self.grounds.push(ground.clone());
    }

    /// Queues a gui quad for the next frame only.
    pub fn process_gui(&mut self, gui: &GuiTexture) {
        self.guis.push(gui.clone());
    }

    /// Keeps drawing every instance of `wrapper` until [`MasterRenderer::clean`].
    pub fn process_wrapper(&mut self, wrapper: MeshWrapper) {
        self.wrappers.push(wrapper);
    }

    pub fn render<S>(
        &mut self,
        sink: &mut S,
        projection: TMat4<f32>,
        view: TMat4<f32>,
        light: &Light,
    ) -> FrameStats
    where
        S: FrameSink + ?Sized,
    {
        let mut stats = FrameStats::default();

        let frame = FrameUniforms {
            projection,
            view,
            light: light.clone(),
        };

        if sink.begin_frame(&frame) {
            self.mesh_renderer
                .render(self.entity_batches(), sink, &mut stats);
            self.ground_renderer
                .render(&self.grounds, sink, &mut stats);
            self.gui_renderer.render(&self.guis, sink, &mut stats);
            sink.end_frame();
        } else {
            trace!("frame skipped by sink");
        }

        self.entities.clear();
        self.grounds.clear();
        self.guis.clear();

        trace!(
            "frame: {} batches, {} instances, {} guis",
            stats.batches,
            stats.instances,
            stats.guis
        );
        stats
    }

    /// Drops everything queued or registered.
    pub fn clean(&mut self) {
        self.entities.clear();
        self.grounds.clear();
        self.guis.clear();
        self.wrappers.clear();
    }

    pub fn queued_entities(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    // Per-frame entities first, then wrapper instances of the same model.
    fn entity_batches(&self) -> BTreeMap<ModelId, Vec<&Entity>> {
        let mut batches: BTreeMap<ModelId, Vec<&Entity>> = BTreeMap::new();
        for (model, entities) in &self.entities {
            batches.entry(*model).or_default().extend(entities.iter());
        }
        for wrapper in &self.wrappers {
            batches
                .entry(wrapper.model().id)
                .or_default()
                .extend(wrapper.instances().iter());
        }
        batches
    }
}
