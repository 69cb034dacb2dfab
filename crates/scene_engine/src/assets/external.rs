//! External asset placeholder
//!
//! A scene node standing in for an asset stored in its own file. The loader
//! replaces it with the file's contents under the placeholder's id.

use crate::serialization::attribute::assign;
use crate::serialization::{Attribute, Identifier, Serialized, SerializedType};

const ATTRIBUTES: &[&str] = &["FileName"];

/// Reference to an asset file, relative to the referencing scene
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalAsset {
    unique_id: Identifier,
    /// Path relative to the scene's directory
    pub file_name: String,
}

impl ExternalAsset {
    /// Placeholder for a file
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            unique_id: 0,
            file_name: file_name.into(),
        }
    }
}

impl SerializedType for ExternalAsset {
    const TYPE_NAME: &'static str = "ExternalAsset";
}

impl Serialized for ExternalAsset {
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
        let applied = match attribute.name.as_str() {
            "FileName" => assign(
                &mut self.file_name,
                attribute.value.as_str().map(str::to_string),
            ),
            _ => false,
        };
        if !applied {
            log::trace!("ExternalAsset ignored attribute {:?}", attribute.name);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "FileName" => Some(Attribute::string(name, self.file_name.as_str())),
            _ => None,
        }
    }
}
