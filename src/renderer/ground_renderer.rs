use std::collections::BTreeMap;

use super::{FrameSink, FrameStats, InstanceData, PipelineKind};
use crate::{
    entities::Ground,
    render_system::model::{Material, ModelId},
};

/// Draws ground tiles with the ground pipeline.
#[derive(Debug, Default)]
pub struct GroundRenderer;

impl GroundRenderer {
    pub fn new() -> Self {
        GroundRenderer
    }

    pub fn render<S>(&self, grounds: &[Ground], sink: &mut S, stats: &mut FrameStats)
    where
        S: FrameSink + ?Sized,
    {
        let mut by_model: BTreeMap<ModelId, Vec<&Ground>> = BTreeMap::new();
        for ground in grounds {
            by_model.entry(ground.model.id).or_default().push(ground);
        }

        for (model, tiles) in by_model {
            sink.bind_model(PipelineKind::Ground, model);
            stats.batches += 1;

            for tile in tiles {
                sink.draw_instance(&Self::prepare_instance(tile));
                stats.instances += 1;
            }
        }
    }

    // whatever is stored on the tile, it is drawn at its grid origin, unrotated, unit scale
    fn prepare_instance(ground: &Ground) -> InstanceData {
        InstanceData {
            transform: ground.transform().create_transformation_matrix(),
            material: Material::default(),
        }
    }
}
