mod face;
mod loader;
pub use self::loader::Loader;

use bytemuck::{Pod, Zeroable};
use vulkano::{buffer::BufferContents, pipeline::graphics::vertex_input::Vertex};

/// Full-screen quad used by the gui pipeline, drawn as a triangle strip.
#[derive(Clone, Copy, Debug, Default, BufferContents, Vertex, Zeroable, Pod)]
#[repr(C)]
pub struct GuiVertex {
    #[format(R32G32_SFLOAT)]
    pub position: [f32; 2],
    #[format(R32G32_SFLOAT)]
    pub tex_coord: [f32; 2],
}

impl GuiVertex {
    pub fn list() -> [GuiVertex; 4] {
        [
            GuiVertex {
                position: [-1.0, 1.0],
                tex_coord: [0.0, 0.0],
            },
            GuiVertex {
                position: [-1.0, -1.0],
                tex_coord: [0.0, 1.0],
            },
            GuiVertex {
                position: [1.0, 1.0],
                tex_coord: [1.0, 0.0],
            },
            GuiVertex {
                position: [1.0, -1.0],
                tex_coord: [1.0, 1.0],
            },
        ]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, BufferContents, Vertex, Zeroable, Pod)]
#[repr(C)]
pub struct TexturedVertex {
    #[format(R32G32B32_SFLOAT)]
    pub position: [f32; 3],
    #[format(R32G32_SFLOAT)]
    pub tex_coord: [f32; 2],
    #[format(R32G32B32_SFLOAT)]
    pub normal: [f32; 3],
}

/// Indexed triangle list ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<TexturedVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
