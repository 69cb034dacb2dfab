//! Shader asset
//!
//! A shader owns its stage sources as nested objects written inline in the
//! shader's node.

use crate::serialization::attribute::assign;
use crate::serialization::{Attribute, AttributeValue, Identifier, Serialized, SerializedType};

const SHADER_ATTRIBUTES: &[&str] = &["Language", "Source"];
const SOURCE_ATTRIBUTES: &[&str] = &["Type", "Source"];

/// Source text of one shader stage
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderSource {
    unique_id: Identifier,
    /// Stage code
    pub stage: u16,
    /// Source text
    pub source: String,
}

impl ShaderSource {
    /// Source for a stage
    pub fn new(stage: u16, source: impl Into<String>) -> Self {
        Self {
            unique_id: 0,
            stage,
            source: source.into(),
        }
    }
}

impl SerializedType for ShaderSource {
    const TYPE_NAME: &'static str = "ShaderSource";
}

impl Serialized for ShaderSource {
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
        SOURCE_ATTRIBUTES
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        let value = &attribute.value;
        let applied = match attribute.name.as_str() {
            "Type" => assign(&mut self.stage, value.as_u16()),
            "Source" => assign(&mut self.source, value.as_str().map(str::to_string)),
            _ => false,
        };
        if !applied {
            log::trace!("ShaderSource ignored attribute {:?}", attribute.name);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "Type" => Some(Attribute::ushort(name, self.stage)),
            "Source" => Some(Attribute::string(name, self.source.as_str())),
            _ => None,
        }
    }
}

/// Shader program described by a language and its stage sources
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shader {
    unique_id: Identifier,
    /// Shading language name
    pub language: String,
    /// Stage sources in file order
    pub sources: Vec<ShaderSource>,
}

impl Shader {
    /// Source of a stage, if present
    pub fn stage(&self, stage: u16) -> Option<&ShaderSource> {
        self.sources.iter().find(|s| s.stage == stage)
    }
}

impl SerializedType for Shader {
    const TYPE_NAME: &'static str = "Shader";
}

impl Serialized for Shader {
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
        SHADER_ATTRIBUTES
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        match (attribute.name.as_str(), attribute.value) {
            ("Language", value) => {
                if let Some(language) = value.as_str() {
                    self.language = language.to_string();
                }
            }
            ("Source", AttributeValue::Class(instances)) => {
                self.sources = instances
                    .into_iter()
                    .filter_map(|instance| {
                        if !instance.is::<ShaderSource>() {
                            log::debug!("Shader ignored nested {}", instance.type_name());
                            return None;
                        }
                        instance.downcast::<ShaderSource>().map(|source| *source)
                    })
                    .collect();
            }
            (name, _) => log::trace!("Shader ignored attribute {:?}", name),
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "Language" => Some(Attribute::string(name, self.language.as_str())),
            "Source" => Some(Attribute::class(
                name,
                self.sources
                    .iter()
                    .map(|s| Box::new(s.clone()) as Box<dyn Serialized>)
                    .collect(),
            )),
            _ => None,
        }
    }
}
