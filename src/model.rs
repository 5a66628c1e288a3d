use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl ModelPrimitive {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

impl Model {
    pub fn from_primitive(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
    ) -> Model {
        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices,
                indices,
            }],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(ModelPrimitive::triangle_count).sum()
    }
}
