use std::path::Path;

use nalgebra_glm::vec3;

use crate::{
    error::Result,
    obj_loader::{MeshData, TexturedVertex},
    render_system::model::{ModelRegistry, TexturedModel, Transform},
};

pub const GROUND_SIZE: f32 = 800.0;
pub const GROUND_VERTEX_COUNT: u32 = 128;

/// One square tile of the ground plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Ground {
    pub x: f32,
    pub z: f32,
    pub model: TexturedModel,
}

impl Ground {
    pub fn new(grid_x: i32, grid_z: i32, model: TexturedModel) -> Self {
        Ground {
            x: grid_x as f32 * GROUND_SIZE,
            z: grid_z as f32 * GROUND_SIZE,
            model,
        }
    }

    /// Tiles sharing a texture share one model.
    pub fn load_model(
        registry: &mut ModelRegistry,
        texture_file: impl AsRef<Path>,
    ) -> Result<TexturedModel> {
        registry.generated("ground", texture_file, || {
            generate_ground_mesh(GROUND_SIZE, GROUND_VERTEX_COUNT)
        })
    }

    /// Tiles are never rotated or scaled; only their grid offset matters.
    pub fn transform(&self) -> Transform {
        Transform::at(vec3(self.x, 0.0, self.z))
    }
}

/// Flat `vertex_count` x `vertex_count` grid spanning `size` on x and z,
/// facing up, with texture coordinates running 0..1 across the tile.
pub fn generate_ground_mesh(size: f32, vertex_count: u32) -> MeshData {
    assert!(vertex_count >= 2, "a ground tile needs at least 2x2 vertices");
    let last = (vertex_count - 1) as f32;

    let mut vertices = Vec::with_capacity((vertex_count * vertex_count) as usize);
    for i in 0..vertex_count {
        for j in 0..vertex_count {
            let u = j as f32 / last;
            let v = i as f32 / last;
            vertices.push(TexturedVertex {
                position: [u * size, 0.0, v * size],
                tex_coord: [u, v],
                normal: [0.0, 1.0, 0.0],
            });
        }
    }

    let mut indices = Vec::with_capacity(((vertex_count - 1) * (vertex_count - 1) * 6) as usize);
    for gz in 0..vertex_count - 1 {
        for gx in 0..vertex_count - 1 {
            let top_left = gz * vertex_count + gx;
            let top_right = top_left + 1;
            let bottom_left = (gz + 1) * vertex_count + gx;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render_system::model::ModelId, texture::TextureData};

    #[test]
    fn tile_origin_follows_grid() {
        let model = TexturedModel { id: ModelId(0) };
        let ground = Ground::new(-1, 2, model);
        assert_eq!(ground.x, -GROUND_SIZE);
        assert_eq!(ground.z, 2.0 * GROUND_SIZE);

        let t = ground.transform();
        assert_eq!(t.position, vec3(-GROUND_SIZE, 0.0, 2.0 * GROUND_SIZE));
        assert_eq!((t.rot_x, t.rot_y, t.rot_z, t.scale), (0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn grid_mesh_shape() {
        let mesh = generate_ground_mesh(10.0, 3);
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.indices.len(), 2 * 2 * 6);
        assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[8].position, [10.0, 0.0, 10.0]);
        assert_eq!(mesh.vertices[8].tex_coord, [1.0, 1.0]);
        assert!(mesh.indices.iter().all(|&i| i < 9));
        assert_eq!(&mesh.indices[..6], &[0, 3, 1, 1, 3, 4]);
    }

    #[test]
    fn grid_triangles_face_up() {
        let mesh = generate_ground_mesh(1.0, 2);
        let p = |i: u32| {
            let v = mesh.vertices[i as usize].position;
            vec3(v[0], v[1], v[2])
        };
        for tri in mesh.indices.chunks(3) {
            let n = nalgebra_glm::cross(&(p(tri[1]) - p(tri[0])), &(p(tri[2]) - p(tri[0])));
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn tiles_with_same_texture_share_a_model() {
        let dir = tempfile::tempdir().unwrap();
        let grass = dir.path().join("grass.tga");
        let mut bytes = vec![0u8; 18];
        bytes[2] = 2;
        bytes[12] = 1;
        bytes[14] = 1;
        bytes[16] = 24;
        bytes.extend_from_slice(&[0, 255, 0]);
        std::fs::write(&grass, bytes).unwrap();

        let mut registry = ModelRegistry::new();
        registry.insert(generate_ground_mesh(1.0, 2), TextureData::solid([0; 4]));
        let a = Ground::load_model(&mut registry, &grass).unwrap();
        let b = Ground::load_model(&mut registry, &grass).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id, ModelId(1));
        assert_eq!(registry.len(), 2);
    }
}
