use super::{FrameSink, FrameStats, InstanceData, PipelineKind};
use crate::{entities::Entity, render_system::model::ModelId};

/// Draws textured entities with the lit entity pipeline.
#[derive(Debug, Default)]
pub struct MeshRenderer;

impl MeshRenderer {
    pub fn new() -> Self {
        MeshRenderer
    }

    /// Each batch binds its model once and then draws every instance of it.
    pub fn render<'a, S, B>(&self, batches: B, sink: &mut S, stats: &mut FrameStats)
    where
        S: FrameSink + ?Sized,
        B: IntoIterator<Item = (ModelId, Vec<&'a Entity>)>,
    {
        for (model, entities) in batches {
            if entities.is_empty() {
                continue;
            }
            sink.bind_model(PipelineKind::Entity, model);
            stats.batches += 1;

            for entity in entities {
                sink.draw_instance(&Self::prepare_instance(entity));
                stats.instances += 1;
            }
        }
    }

    fn prepare_instance(entity: &Entity) -> InstanceData {
        InstanceData {
            transform: entity.transformation_matrix(),
            material: entity.material,
        }
    }
}
