//! Light component
//!
//! Pure data: color, intensity, attenuation and spot cut-off, plus an
//! optional nested [`ShadowSettings`] object.

use crate::ecs::component::{Component, EntityId};
use crate::foundation::math::Vec3;
use crate::serialization::attribute::assign;
use crate::serialization::{
    Attribute, IdAllocator, Identifier, Serialized, SerializedType, TypeRegistry, NULL_ID,
};

/// Types of lights supported by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightType {
    /// Radiates in all directions from a position
    #[default]
    Point,
    /// Cone of light from a position
    Spot,
    /// Parallel rays, like sunlight
    Directional,
}

impl LightType {
    /// Decode the stored byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Point),
            1 => Some(Self::Spot),
            2 => Some(Self::Directional),
            _ => None,
        }
    }

    /// Byte written to scene files
    pub fn code(self) -> u8 {
        match self {
            Self::Point => 0,
            Self::Spot => 1,
            Self::Directional => 2,
        }
    }
}

const LIGHT_ATTRIBUTES: &[&str] = &[
    "Color",
    "Exposure",
    "Intensity",
    "LightType",
    "Constant",
    "Linear",
    "Quadratic",
    "CutOff",
    "ShadowEnabled",
    "Shadow",
];

/// Light attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct LightComponent {
    unique_id: Identifier,
    entity_id: EntityId,
    /// RGB color
    pub color: Vec3,
    /// Exposure multiplier
    pub exposure: f32,
    /// Intensity multiplier
    pub intensity: f32,
    /// Light kind
    pub light_type: LightType,
    /// Constant attenuation term
    pub constant: f32,
    /// Linear attenuation term
    pub linear: f32,
    /// Quadratic attenuation term
    pub quadratic: f32,
    /// Spot cut-off angle in degrees
    pub cut_off: f32,
    /// Whether this light casts shadows
    pub shadow_enabled: bool,
    /// Shadow map settings, created when the light is created through the registry or loaded
    pub shadow: Option<ShadowSettings>,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            unique_id: NULL_ID,
            entity_id: NULL_ID,
            color: Vec3::new(1.0, 1.0, 1.0),
            exposure: 1.0,
            intensity: 1.0,
            light_type: LightType::Point,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            cut_off: 12.5,
            shadow_enabled: false,
            shadow: None,
        }
    }
}

impl SerializedType for LightComponent {
    const TYPE_NAME: &'static str = "LightComponent";
}

impl Serialized for LightComponent {
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
        LIGHT_ATTRIBUTES
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        let value = &attribute.value;
        let applied = match attribute.name.as_str() {
            "Color" => assign(&mut self.color, value.as_vec3()),
            "Exposure" => assign(&mut self.exposure, value.as_f32()),
            "Intensity" => assign(&mut self.intensity, value.as_f32()),
            "LightType" => assign(
                &mut self.light_type,
                value.as_u8().and_then(LightType::from_code),
            ),
            "Constant" => assign(&mut self.constant, value.as_f32()),
            "Linear" => assign(&mut self.linear, value.as_f32()),
            "Quadratic" => assign(&mut self.quadratic, value.as_f32()),
            "CutOff" => assign(&mut self.cut_off, value.as_f32()),
            "ShadowEnabled" => assign(&mut self.shadow_enabled, value.as_bool()),
            "Shadow" => {
                let shadow = attribute
                    .value
                    .into_instances()
                    .and_then(|instances| instances.into_iter().next())
                    .and_then(|instance| instance.downcast::<ShadowSettings>());
                match shadow {
                    Some(shadow) => {
                        self.shadow = Some(*shadow);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };
        if !applied {
            log::trace!("LightComponent ignored attribute {:?}", attribute.name);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        let attribute = match name {
            "Color" => Attribute::vec3(name, &self.color),
            "Exposure" => Attribute::float(name, self.exposure),
            "Intensity" => Attribute::float(name, self.intensity),
            "LightType" => Attribute::byte(name, self.light_type.code()),
            "Constant" => Attribute::float(name, self.constant),
            "Linear" => Attribute::float(name, self.linear),
            "Quadratic" => Attribute::float(name, self.quadratic),
            "CutOff" => Attribute::float(name, self.cut_off),
            "ShadowEnabled" => Attribute::flag(name, self.shadow_enabled),
            "Shadow" => Attribute::class(
                name,
                self.shadow
                    .iter()
                    .map(|shadow| Box::new(shadow.clone()) as Box<dyn Serialized>)
                    .collect(),
            ),
            _ => return None,
        };
        Some(attribute)
    }

    fn prime(&mut self, registry: &TypeRegistry, ids: &IdAllocator) {
        if self.shadow.is_none() {
            self.shadow = registry
                .create::<ShadowSettings>(ShadowSettings::TYPE_NAME, Some(ids))
                .map(|shadow| *shadow);
        }
    }
}

impl Component for LightComponent {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn set_entity_id(&mut self, entity_id: EntityId) {
        self.entity_id = entity_id;
    }
}

const SHADOW_ATTRIBUTES: &[&str] = &["Bias", "Resolution"];

/// Shadow map settings nested inside a [`LightComponent`]
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowSettings {
    unique_id: Identifier,
    /// Depth bias
    pub bias: f32,
    /// Shadow map edge length in texels
    pub resolution: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            unique_id: NULL_ID,
            bias: 0.005,
            resolution: 1024,
        }
    }
}

impl SerializedType for ShadowSettings {
    const TYPE_NAME: &'static str = "ShadowSettings";
}

impl Serialized for ShadowSettings {
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
        SHADOW_ATTRIBUTES
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        match attribute.name.as_str() {
            "Bias" => assign(&mut self.bias, attribute.value.as_f32()),
            "Resolution" => assign(&mut self.resolution, attribute.value.as_u32()),
            _ => false,
        };
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "Bias" => Some(Attribute::float(name, self.bias)),
            "Resolution" => Some(Attribute::uint(name, self.resolution)),
            _ => None,
        }
    }
}
