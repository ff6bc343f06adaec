use nalgebra_glm::vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::Entity;
use crate::render_system::model::{TexturedModel, Transform};

/// Where and how large scattered instances may be.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterArea {
    pub count: usize,
    /// Instances land in `[-half_extent, half_extent)` on x and z around `centre`.
    pub half_extent: f32,
    pub centre: (f32, f32),
    pub min_scale: f32,
    pub max_scale: f32,
}

/// Many copies of one model, e.g. a forest. Built once and drawn every frame.
#[derive(Clone, Debug)]
pub struct MeshWrapper {
    model: TexturedModel,
    instances: Vec<Entity>,
}

impl MeshWrapper {
    pub fn scatter(model: TexturedModel, area: ScatterArea, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let instances = (0..area.count)
            .map(|_| {
                let x = area.centre.0 + rng.gen_range(-area.half_extent..area.half_extent);
                let z = area.centre.1 + rng.gen_range(-area.half_extent..area.half_extent);
                let scale = if area.max_scale > area.min_scale {
                    rng.gen_range(area.min_scale..area.max_scale)
                } else {
                    area.min_scale
                };
                let rot_y = rng.gen_range(0.0..360.0);
                Entity::new(model, Transform::new(vec3(x, 0.0, z), 0.0, rot_y, 0.0, scale))
            })
            .collect();

        MeshWrapper { model, instances }
    }

    pub fn model(&self) -> TexturedModel {
        self.model
    }

    pub fn instances(&self) -> &[Entity] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_system::model::ModelId;

    fn forest() -> ScatterArea {
        ScatterArea {
            count: 250,
            half_extent: 500.0,
            centre: (0.0, 0.0),
            min_scale: 0.01,
            max_scale: 0.04,
        }
    }

    #[test]
    fn instances_stay_inside_the_area() {
        let wrapper = MeshWrapper::scatter(TexturedModel { id: ModelId(3) }, forest(), 7);
        assert_eq!(wrapper.len(), 250);
        for tree in wrapper.instances() {
            let t = &tree.transform;
            assert!(t.position.x >= -500.0 && t.position.x < 500.0);
            assert!(t.position.z >= -500.0 && t.position.z < 500.0);
            assert_eq!(t.position.y, 0.0);
            assert!(t.scale >= 0.01 && t.scale < 0.04);
            assert_eq!(tree.model_id(), ModelId(3));
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let model = TexturedModel { id: ModelId(0) };
        let a = MeshWrapper::scatter(model, forest(), 42);
        let b = MeshWrapper::scatter(model, forest(), 42);
        let c = MeshWrapper::scatter(model, forest(), 43);
        assert_eq!(a.instances(), b.instances());
        assert_ne!(a.instances(), c.instances());
    }

    #[test]
    fn fixed_scale_when_range_is_empty() {
        let area = ScatterArea {
            count: 3,
            half_extent: 1.0,
            centre: (10.0, -10.0),
            min_scale: 2.0,
            max_scale: 2.0,
        };
        let wrapper = MeshWrapper::scatter(TexturedModel { id: ModelId(0) }, area, 1);
        for e in wrapper.instances() {
            assert_eq!(e.transform.scale, 2.0);
            assert!(e.transform.position.x >= 9.0 && e.transform.position.x < 11.0);
        }
    }
}
