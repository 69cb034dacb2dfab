//! Renderer component

use crate::ecs::component::{Component, EntityId};
use crate::serialization::attribute::assign;
use crate::serialization::{Attribute, Identifier, Serialized, SerializedType, NULL_ID};

/// How a mesh is rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawType {
    /// Edges only
    WireFrame,
    /// Filled triangles
    #[default]
    Fill,
    /// Vertices only
    Points,
}

impl DrawType {
    /// Decode the stored byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::WireFrame),
            1 => Some(Self::Fill),
            2 => Some(Self::Points),
            _ => None,
        }
    }

    /// Byte written to scene files
    pub fn code(self) -> u8 {
        match self {
            Self::WireFrame => 0,
            Self::Fill => 1,
            Self::Points => 2,
        }
    }
}

const ATTRIBUTES: &[&str] = &["DrawType", "Enabled", "MeshReference", "MaterialReference"];

/// Links an entity to the mesh and material it is drawn with
#[derive(Debug, Clone, PartialEq)]
pub struct RendererComponent {
    unique_id: Identifier,
    entity_id: EntityId,
    /// Rasterization mode
    pub draw_type: DrawType,
    /// Whether the entity is drawn
    pub enabled: bool,
    /// Mesh asset id
    pub mesh_reference: Identifier,
    /// Material asset id
    pub material_reference: Identifier,
}

impl Default for RendererComponent {
    fn default() -> Self {
        Self {
            unique_id: NULL_ID,
            entity_id: NULL_ID,
            draw_type: DrawType::Fill,
            enabled: true,
            mesh_reference: NULL_ID,
            material_reference: NULL_ID,
        }
    }
}

impl SerializedType for RendererComponent {
    const TYPE_NAME: &'static str = "RendererComponent";
}

impl Serialized for RendererComponent {
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
            "DrawType" => assign(&mut self.draw_type, value.as_u8().and_then(DrawType::from_code)),
            "Enabled" => assign(&mut self.enabled, value.as_bool()),
            "MeshReference" => assign(&mut self.mesh_reference, value.as_id()),
            "MaterialReference" => assign(&mut self.material_reference, value.as_id()),
            _ => false,
        };
        if !applied {
            log::trace!("RendererComponent ignored attribute {:?}", attribute.name);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "DrawType" => Some(Attribute::byte(name, self.draw_type.code())),
            "Enabled" => Some(Attribute::flag(name, self.enabled)),
            "MeshReference" => Some(Attribute::id(name, self.mesh_reference)),
            "MaterialReference" => Some(Attribute::id(name, self.material_reference)),
            _ => None,
        }
    }
}

impl Component for RendererComponent {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn set_entity_id(&mut self, entity_id: EntityId) {
        self.entity_id = entity_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_are_identifiers() {
        let renderer = RendererComponent {
            mesh_reference: 12,
            material_reference: 13,
            draw_type: DrawType::WireFrame,
            ..Default::default()
        };
        let attributes = renderer.get_all_attributes();
        assert_eq!(attributes[0], Attribute::byte("DrawType", 0));
        assert_eq!(attributes[2], Attribute::id("MeshReference", 12));

        let mut copy = RendererComponent::default();
        copy.set_attributes(attributes);
        assert_eq!(copy, renderer);
    }
}
