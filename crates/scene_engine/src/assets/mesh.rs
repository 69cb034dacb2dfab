//! Mesh asset

use crate::serialization::attribute::assign;
use crate::serialization::{Attribute, Identifier, Serialized, SerializedType};

const ATTRIBUTES: &[&str] = &["Name", "Indices", "Positions", "Normals", "TexCoord"];

/// Indexed triangle geometry with flat per-vertex arrays
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    unique_id: Identifier,
    /// Mesh name
    pub name: String,
    /// Triangle vertex indices
    pub indices: Vec<u32>,
    /// xyz per vertex
    pub positions: Vec<f32>,
    /// xyz per vertex
    pub normals: Vec<f32>,
    /// uvw per vertex
    pub tex_coords: Vec<f32>,
}

impl Mesh {
    /// Number of vertices described by the position array
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of whole triangles described by the index array
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when every index points at an existing vertex
    pub fn indices_in_bounds(&self) -> bool {
        let vertices = self.vertex_count();
        self.indices.iter().all(|&i| (i as usize) < vertices)
    }
}

impl SerializedType for Mesh {
    const TYPE_NAME: &'static str = "Mesh";
}

impl Serialized for Mesh {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn unique_id(&self) -> Identifier {
        self.unique_id
    }

    fn set_unique_id(&mut self, id: Identifier) {
        self.unique_id = id;
    }

    fn attribute_names(&self) -> &'static [&'static str] {
        ATTRIBUTES
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        let value = &attribute.value;
        let applied = match attribute.name.as_str() {
            "Name" => assign(&mut self.name, value.as_str().map(str::to_string)),
            "Indices" => assign(&mut self.indices, value.as_u32s()),
            "Positions" => assign(&mut self.positions, value.as_floats()),
            "Normals" => assign(&mut self.normals, value.as_floats()),
            "TexCoord" => assign(&mut self.tex_coords, value.as_floats()),
            _ => false,
        };
        if !applied {
            log::trace!("Mesh ignored attribute {:?}", attribute.name);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "Name" => Some(Attribute::string(name, self.name.as_str())),
            "Indices" => Some(Attribute::uints(name, self.indices.clone())),
            "Positions" => Some(Attribute::floats(name, self.positions.clone())),
            "Normals" => Some(Attribute::floats(name, self.normals.clone())),
            "TexCoord" => Some(Attribute::floats(name, self.tex_coords.clone())),
            _ => None,
        }
    }
}
