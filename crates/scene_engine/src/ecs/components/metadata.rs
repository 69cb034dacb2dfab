//! Object metadata component

use crate::ecs::component::{Component, EntityId};
use crate::serialization::attribute::assign;
use crate::serialization::{Attribute, Identifier, Serialized, SerializedType, NULL_ID};

const ATTRIBUTES: &[&str] = &["Name", "Tag", "Layer"];

/// Human-facing name, tag and layer of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMetadataComponent {
    unique_id: Identifier,
    entity_id: EntityId,
    /// Display name
    pub name: String,
    /// Free-form tag
    pub tag: String,
    /// Layer name
    pub layer: String,
}

impl Default for ObjectMetadataComponent {
    fn default() -> Self {
        Self {
            unique_id: NULL_ID,
            entity_id: NULL_ID,
            name: String::new(),
            tag: "default".to_string(),
            layer: "default".to_string(),
        }
    }
}

impl ObjectMetadataComponent {
    /// Metadata with a name and default tag and layer
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl SerializedType for ObjectMetadataComponent {
    const TYPE_NAME: &'static str = "ObjectMetadataComponent";
}

impl Serialized for ObjectMetadataComponent {
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
        let text = attribute.value.as_str().map(str::to_string);
        let applied = match attribute.name.as_str() {
            "Name" => assign(&mut self.name, text),
            "Tag" => assign(&mut self.tag, text),
            "Layer" => assign(&mut self.layer, text),
            _ => false,
        };
        if !applied {
            log::trace!("ObjectMetadataComponent ignored attribute {:?}", attribute.name);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "Name" => Some(Attribute::string(name, self.name.as_str())),
            "Tag" => Some(Attribute::string(name, self.tag.as_str())),
            "Layer" => Some(Attribute::string(name, self.layer.as_str())),
            _ => None,
        }
    }
}

impl Component for ObjectMetadataComponent {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn set_entity_id(&mut self, entity_id: EntityId) {
        self.entity_id = entity_id;
    }
}
