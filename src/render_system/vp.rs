use nalgebra_glm::{identity, perspective_rh_zo, TMat4};

#[derive(Debug, Clone)]
pub struct VP {
    pub view: TMat4<f32>,
    pub projection: TMat4<f32>,
}

impl VP {
    pub fn new() -> VP {
        VP {
            view: identity(),
            projection: identity(),
        }
    }
}

impl Default for VP {
    fn default() -> Self {
        Self::new()
    }
}

/// Right-handed perspective with Vulkan's 0..1 depth range and downward Y.
pub fn perspective_projection(aspect_ratio: f32, fov_degrees: f32, near: f32, far: f32) -> TMat4<f32> {
    let mut projection = perspective_rh_zo(aspect_ratio, fov_degrees.to_radians(), near, far);
    projection[(1, 1)] *= -1.0;
    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra_glm::vec4;

    #[test]
    fn near_and_far_map_to_vulkan_depth() {
        let p = perspective_projection(16.0 / 9.0, 45.0, 0.1, 500.0);

        let near = p * vec4(0.0, 0.0, -0.1, 1.0);
        let far = p * vec4(0.0, 0.0, -500.0, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn up_is_negative_clip_y() {
        let p = perspective_projection(1.0, 90.0, 0.1, 100.0);
        let up = p * vec4(0.0, 1.0, -1.0, 1.0);
        assert!(up.y / up.w < 0.0);
    }
}
