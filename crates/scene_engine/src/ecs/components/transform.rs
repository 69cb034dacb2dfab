//! Transform component
//!
//! Local position/rotation/scale plus a parent entity link. The matrices and
//! decomposed world values are derived state written only by
//! [`crate::ecs::systems::TransformSystem`].

use crate::ecs::component::{Component, EntityId};
use crate::foundation::math::{Mat4, Quat, Transform as MathTransform, Vec3};
use crate::serialization::attribute::assign;
use crate::serialization::{Attribute, Identifier, Serialized, SerializedType, NULL_ID};

const ATTRIBUTES: &[&str] = &["Position", "Rotation", "Scale", "ParentID", "IsDynamic"];

/// Spatial transform of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    unique_id: Identifier,
    entity_id: EntityId,

    /// Position relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Scale relative to the parent
    pub scale: Vec3,
    /// Parent entity, 0 for a root
    pub parent_id: EntityId,
    /// Recomputed on every update; static transforms only on full passes
    pub is_dynamic: bool,

    pub(crate) local_transform: Mat4,
    pub(crate) local_transform_uniform_scale: Mat4,
    pub(crate) world_transform: Mat4,
    pub(crate) world_transform_uniform_scale: Mat4,
    pub(crate) world_transform_inverse_transpose: Mat4,
    pub(crate) world_position: Vec3,
    pub(crate) world_rotation: Quat,
    pub(crate) world_scale: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            unique_id: NULL_ID,
            entity_id: NULL_ID,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            parent_id: NULL_ID,
            is_dynamic: false,
            local_transform: Mat4::identity(),
            local_transform_uniform_scale: Mat4::identity(),
            world_transform: Mat4::identity(),
            world_transform_uniform_scale: Mat4::identity(),
            world_transform_inverse_transpose: Mat4::identity(),
            world_position: Vec3::zeros(),
            world_rotation: Quat::identity(),
            world_scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder pattern: Set parent entity
    pub fn with_parent(mut self, parent_id: EntityId) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Builder pattern: Set the dynamic flag
    pub fn with_dynamic(mut self, is_dynamic: bool) -> Self {
        self.is_dynamic = is_dynamic;
        self
    }

    /// Local values as a math transform
    pub fn to_math_transform(&self) -> MathTransform {
        MathTransform::new(self.position, self.rotation, self.scale)
    }

    /// Local matrix, `translate * rotate * scale`
    pub fn local_transform(&self) -> &Mat4 {
        &self.local_transform
    }

    /// Local matrix with scale replaced by its dominant axis
    pub fn local_transform_uniform_scale(&self) -> &Mat4 {
        &self.local_transform_uniform_scale
    }

    /// Parent chain times local matrix
    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    /// World matrix built from uniform-scale local matrices
    pub fn world_transform_uniform_scale(&self) -> &Mat4 {
        &self.world_transform_uniform_scale
    }

    /// Inverse of the transposed world matrix, for normals
    pub fn world_transform_inverse_transpose(&self) -> &Mat4 {
        &self.world_transform_inverse_transpose
    }

    /// World-space position
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// World-space rotation
    pub fn world_rotation(&self) -> Quat {
        self.world_rotation
    }

    /// World-space scale
    pub fn world_scale(&self) -> Vec3 {
        self.world_scale
    }
}

impl SerializedType for TransformComponent {
    const TYPE_NAME: &'static str = "TransformComponent";
}

impl Serialized for TransformComponent {
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
            "Position" | "LocalPosition" => assign(&mut self.position, value.as_vec3()),
            "Rotation" | "LocalRotation" => assign(&mut self.rotation, value.as_quat()),
            "Scale" | "LocalScale" => assign(&mut self.scale, value.as_vec3()),
            "ParentID" => assign(&mut self.parent_id, value.as_id()),
            "IsDynamic" => assign(&mut self.is_dynamic, value.as_bool()),
            _ => false,
        };
        if !applied {
            log::trace!("TransformComponent ignored attribute {:?}", attribute.name);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "Position" => Some(Attribute::vec3(name, &self.position)),
            "Rotation" => Some(Attribute::quat(name, &self.rotation)),
            "Scale" => Some(Attribute::vec3(name, &self.scale)),
            "ParentID" => Some(Attribute::id(name, self.parent_id)),
            "IsDynamic" => Some(Attribute::flag(name, self.is_dynamic)),
            _ => None,
        }
    }
}

impl Component for TransformComponent {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn set_entity_id(&mut self, entity_id: EntityId) {
        self.entity_id = entity_id;
    }
}
