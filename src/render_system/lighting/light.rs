use nalgebra_glm::{vec3, TVec3};

/// Point light feeding the diffuse and specular terms of the scene shaders.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub position: TVec3<f32>,
    pub colour: TVec3<f32>,
}

impl Light {
    pub fn new(position: TVec3<f32>, colour: TVec3<f32>) -> Self {
        Light { position, colour }
    }

    pub fn white(position: TVec3<f32>) -> Self {
        Light::new(position, vec3(1.0, 1.0, 1.0))
    }

    pub fn position_array(&self) -> [f32; 4] {
        [self.position.x, self.position.y, self.position.z, 1.0]
    }

    pub fn colour_array(&self) -> [f32; 4] {
        [self.colour.x, self.colour.y, self.colour.z, 1.0]
    }
}
