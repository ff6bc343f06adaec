use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use log::debug;
use nalgebra_glm::{identity, rotate_x, rotate_y, rotate_z, scale, translate, vec3, TMat4, TVec3};

use crate::{
    error::Result,
    obj_loader::{Loader, MeshData},
    texture::TextureData,
};

/// Handle into a [`ModelRegistry`]. Ids are handed out in load order, which is
/// also the order the renderers draw batches in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub u32);

/// Geometry plus the texture it is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexturedModel {
    pub id: ModelId,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub reflectivity: f32,
    pub shine_damper: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            reflectivity: 0.0,
            shine_damper: 1.0,
        }
    }
}

pub struct ModelAsset {
    pub mesh: MeshData,
    pub texture: TextureData,
}

/// Owns the CPU side of every loaded model.
#[derive(Default)]
pub struct ModelRegistry {
    assets: Vec<ModelAsset>,
    by_source: HashMap<(PathBuf, PathBuf), ModelId>,
}

pub struct ModelBuilder {
    obj_file: PathBuf,
    texture_file: PathBuf,
    invert: bool,
}

impl ModelBuilder {
    fn new(obj_file: PathBuf, texture_file: PathBuf) -> ModelBuilder {
        ModelBuilder {
            obj_file,
            texture_file,
            invert: false,
        }
    }

    pub fn invert_winding_order(mut self, invert: bool) -> ModelBuilder {
        self.invert = invert;
        self
    }

    /// Loads the OBJ and TGA unless this pair was loaded before.
    pub fn build(self, registry: &mut ModelRegistry) -> Result<TexturedModel> {
        let key = (self.obj_file.clone(), self.texture_file.clone());
        if let Some(&id) = registry.by_source.get(&key) {
            debug!("{} already loaded as {:?}", self.obj_file.display(), id);
            return Ok(TexturedModel { id });
        }

        let mesh = Loader::new(&self.obj_file, self.invert)?.as_mesh_data();
        let texture = TextureData::load_tga(&self.texture_file)?;
        let model = registry.insert(mesh, texture);
        registry.by_source.insert(key, model.id);
        Ok(model)
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn textured(obj_file: impl AsRef<Path>, texture_file: impl AsRef<Path>) -> ModelBuilder {
        ModelBuilder::new(
            obj_file.as_ref().to_path_buf(),
            texture_file.as_ref().to_path_buf(),
        )
    }

    /// Like [`ModelBuilder::build`] for geometry generated in code: the mesh is
    /// produced once per (`name`, texture) pair.
    pub fn generated(
        &mut self,
        name: &str,
        texture_file: impl AsRef<Path>,
        mesh: impl FnOnce() -> MeshData,
    ) -> Result<TexturedModel> {
        let texture_file = texture_file.as_ref();
        let key = (PathBuf::from(format!("<{name}>")), texture_file.to_path_buf());
        if let Some(&id) = self.by_source.get(&key) {
            return Ok(TexturedModel { id });
        }

        let texture = TextureData::load_tga(texture_file)?;
        let model = self.insert(mesh(), texture);
        self.by_source.insert(key, model.id);
        Ok(model)
    }

    /// Registers geometry that did not come from a file.
    pub fn insert(&mut self, mesh: MeshData, texture: TextureData) -> TexturedModel {
        let id = ModelId(self.assets.len() as u32);
        self.assets.push(ModelAsset { mesh, texture });
        TexturedModel { id }
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelAsset> {
        self.assets.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &ModelAsset)> {
        self.assets
            .iter()
            .enumerate()
            .map(|(i, asset)| (ModelId(i as u32), asset))
    }
}

/// Placement of a model in the world. Rotations are in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: TVec3<f32>,
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: vec3(0.0, 0.0, 0.0),
            rot_x: 0.0,
            rot_y: 0.0,
            rot_z: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn new(position: TVec3<f32>, rot_x: f32, rot_y: f32, rot_z: f32, scale: f32) -> Self {
        Transform {
            position,
            rot_x,
            rot_y,
            rot_z,
            scale,
        }
    }

    pub fn at(position: TVec3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }

    pub fn create_transformation_matrix(&self) -> TMat4<f32> {
        let mut matrix: TMat4<f32> = identity();
        matrix = translate(&matrix, &self.position);
        matrix = rotate_x(&matrix, self.rot_x.to_radians());
        matrix = rotate_y(&matrix, self.rot_y.to_radians());
        matrix = rotate_z(&matrix, self.rot_z.to_radians());
        scale(&matrix, &vec3(self.scale, self.scale, self.scale))
    }

    pub fn increase_position(&mut self, d: TVec3<f32>) {
        self.position += d;
    }

    pub fn increase_rotation(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rot_x += dx;
        self.rot_y += dy;
        self.rot_z += dz;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj_loader::TexturedVertex;
    use approx::assert_relative_eq;
    use nalgebra_glm::vec4;
    use std::fs;

    fn triangle() -> MeshData {
        MeshData {
            vertices: vec![TexturedVertex::default(); 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut registry = ModelRegistry::new();
        let a = registry.insert(triangle(), TextureData::solid([0; 4]));
        let b = registry.insert(triangle(), TextureData::solid([0; 4]));
        assert_eq!(a.id, ModelId(0));
        assert_eq!(b.id, ModelId(1));
        assert!(a.id < b.id);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            vec![ModelId(0), ModelId(1)]
        );
    }

    #[test]
    fn same_files_load_once() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        let tga = dir.path().join("tri.tga");
        fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mut header = vec![0u8; 18];
        header[2] = 2;
        header[12] = 1;
        header[14] = 1;
        header[16] = 24;
        header.extend_from_slice(&[10, 20, 30]);
        fs::write(&tga, header).unwrap();

        let mut registry = ModelRegistry::new();
        let first = ModelRegistry::textured(&obj, &tga).build(&mut registry).unwrap();
        let second = ModelRegistry::textured(&obj, &tga).build(&mut registry).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(first.id).unwrap().texture.pixels, vec![30, 20, 10, 255]);
    }

    #[test]
    fn missing_asset_propagates() {
        let mut registry = ModelRegistry::new();
        assert!(ModelRegistry::textured("nope.obj", "nope.tga")
            .build(&mut registry)
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn transformation_scales_rotates_then_translates() {
        let transform = Transform::new(vec3(10.0, 0.0, 0.0), 0.0, 90.0, 0.0, 2.0);
        let p = transform.create_transformation_matrix() * vec4(1.0, 0.0, 0.0, 1.0);
        // scaled to x = 2, rotated 90 degrees about y to z = -2, then moved
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn default_material_is_matte() {
        let m = Material::default();
        assert_eq!(m.reflectivity, 0.0);
        assert_eq!(m.shine_damper, 1.0);
    }
}
