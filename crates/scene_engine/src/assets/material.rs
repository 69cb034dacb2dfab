//! Material asset
//!
//! Uniform values are stored as parallel name/value attributes on disk and
//! as `(name, value)` pairs in memory.

use crate::foundation::math::Vec4;
use crate::serialization::{Attribute, Identifier, Serialized, SerializedType, NULL_ID};

const ATTRIBUTES: &[&str] = &[
    "Name",
    "ShaderId",
    "FloatUniformNames",
    "FloatUniformValues",
    "VectorUniformNames",
    "VectorUniformValues",
    "TextureUniformNames",
    "TextureUniformValues",
    "ExternalTexturePaths",
];

/// Shader binding plus named uniform values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    unique_id: Identifier,
    /// Material name
    pub name: String,
    /// Shader asset id
    pub shader_id: Identifier,
    /// Scalar uniforms
    pub float_uniforms: Vec<(String, f32)>,
    /// Four-component uniforms
    pub vector_uniforms: Vec<(String, Vec4)>,
    /// Texture uniforms, valued by texture asset id
    pub texture_uniforms: Vec<(String, Identifier)>,
    /// Texture files to resolve relative to the material
    pub external_texture_paths: Vec<String>,
}

impl Material {
    /// Material with a name and no uniforms
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set a float uniform, replacing any previous value of the same name
    pub fn set_float(&mut self, name: &str, value: f32) {
        upsert(&mut self.float_uniforms, name, value);
    }

    /// Set a vector uniform
    pub fn set_vector(&mut self, name: &str, value: Vec4) {
        upsert(&mut self.vector_uniforms, name, value);
    }

    /// Set a texture uniform
    pub fn set_texture(&mut self, name: &str, texture_id: Identifier) {
        upsert(&mut self.texture_uniforms, name, texture_id);
    }

    /// Float uniform by name
    pub fn float(&self, name: &str) -> Option<f32> {
        lookup(&self.float_uniforms, name)
    }

    /// Vector uniform by name
    pub fn vector(&self, name: &str) -> Option<Vec4> {
        lookup(&self.vector_uniforms, name)
    }

    /// Texture id by uniform name
    pub fn texture(&self, name: &str) -> Option<Identifier> {
        lookup(&self.texture_uniforms, name)
    }

    fn set_names<T: Clone>(uniforms: &mut Vec<(String, T)>, names: Vec<String>, fill: T) {
        uniforms.resize_with(names.len(), || (String::new(), fill.clone()));
        for (slot, name) in uniforms.iter_mut().zip(names) {
            slot.0 = name;
        }
    }

    fn set_values<T: Clone>(uniforms: &mut Vec<(String, T)>, values: Vec<T>) {
        if uniforms.len() != values.len() {
            log::debug!(
                "Material uniform values ({}) do not match names ({})",
                values.len(),
                uniforms.len()
            );
        }
        uniforms.truncate(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match uniforms.get_mut(index) {
                Some(slot) => slot.1 = value,
                None => uniforms.push((String::new(), value)),
            }
        }
    }
}

fn upsert<T>(uniforms: &mut Vec<(String, T)>, name: &str, value: T) {
    match uniforms.iter_mut().find(|(n, _)| n == name) {
        Some(slot) => slot.1 = value,
        None => uniforms.push((name.to_string(), value)),
    }
}

fn lookup<T: Copy>(uniforms: &[(String, T)], name: &str) -> Option<T> {
    uniforms.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
}

fn names<T>(uniforms: &[(String, T)]) -> Vec<String> {
    uniforms.iter().map(|(n, _)| n.clone()).collect()
}

impl SerializedType for Material {
    const TYPE_NAME: &'static str = "Material";
}

impl Serialized for Material {
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
        match attribute.name.as_str() {
            "Name" => {
                if let Some(name) = value.as_str() {
                    self.name = name.to_string();
                }
            }
            "ShaderId" => {
                if let Some(id) = value.as_id() {
                    self.shader_id = id;
                }
            }
            "FloatUniformNames" => {
                if let Some(names) = value.as_strings() {
                    Self::set_names(&mut self.float_uniforms, names, 0.0);
                }
            }
            "FloatUniformValues" => {
                if let Some(values) = value.as_floats() {
                    Self::set_values(&mut self.float_uniforms, values);
                }
            }
            "VectorUniformNames" => {
                if let Some(names) = value.as_strings() {
                    Self::set_names(&mut self.vector_uniforms, names, Vec4::zeros());
                }
            }
            "VectorUniformValues" => {
                if let Some(values) = value.as_floats() {
                    let vectors = values
                        .chunks_exact(4)
                        .map(|c| Vec4::new(c[0], c[1], c[2], c[3]))
                        .collect();
                    Self::set_values(&mut self.vector_uniforms, vectors);
                }
            }
            "TextureUniformNames" => {
                if let Some(names) = value.as_strings() {
                    Self::set_names(&mut self.texture_uniforms, names, NULL_ID);
                }
            }
            "TextureUniformValues" => {
                if let Some(ids) = value.as_ids() {
                    Self::set_values(&mut self.texture_uniforms, ids);
                }
            }
            "ExternalTexturePaths" => {
                if let Some(paths) = value.as_strings() {
                    self.external_texture_paths = paths;
                }
            }
            _ => log::trace!("Material ignored attribute {:?}", attribute.name),
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        let attribute = match name {
            "Name" => Attribute::string(name, self.name.as_str()),
            "ShaderId" => Attribute::id(name, self.shader_id),
            "FloatUniformNames" => Attribute::strings(name, names(&self.float_uniforms)),
            "FloatUniformValues" => Attribute::floats(
                name,
                self.float_uniforms.iter().map(|(_, v)| *v).collect(),
            ),
            "VectorUniformNames" => Attribute::strings(name, names(&self.vector_uniforms)),
            "VectorUniformValues" => Attribute::floats(
                name,
                self.vector_uniforms
                    .iter()
                    .flat_map(|(_, v)| [v.x, v.y, v.z, v.w])
                    .collect(),
            ),
            "TextureUniformNames" => Attribute::strings(name, names(&self.texture_uniforms)),
            "TextureUniformValues" => Attribute::ids(
                name,
                self.texture_uniforms.iter().map(|(_, id)| *id).collect(),
            ),
            "ExternalTexturePaths" => Attribute::strings(name, self.external_texture_paths.clone()),
            _ => return None,
        };
        Some(attribute)
    }
}
