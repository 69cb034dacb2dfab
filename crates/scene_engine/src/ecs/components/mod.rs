//! Built-in components

pub mod light;
pub mod metadata;
pub mod renderer;
pub mod transform;

pub use light::{LightComponent, LightType, ShadowSettings};
pub use metadata::ObjectMetadataComponent;
pub use renderer::{DrawType, RendererComponent};
pub use transform::TransformComponent;

use crate::serialization::TypeRegistry;

/// Register every built-in component with its short alias
pub fn register_types(registry: &mut TypeRegistry) {
    registry
        .register_component::<TransformComponent>()
        .register_component::<LightComponent>()
        .register_component::<RendererComponent>()
        .register_component::<ObjectMetadataComponent>()
        .register::<ShadowSettings>();

    for (alias, type_name) in [
        ("Transform", "TransformComponent"),
        ("Light", "LightComponent"),
        ("Renderer", "RendererComponent"),
        ("ObjectMetadata", "ObjectMetadataComponent"),
    ] {
        registry.register_alias(alias, type_name);
    }
}
