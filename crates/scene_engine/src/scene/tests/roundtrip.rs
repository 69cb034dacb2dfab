//! Reflection and file round-trips

use approx::assert_relative_eq;

use super::temp_test_dir;
use crate::assets::{AssetOrigin, AssetStore, ExternalAsset, Material, Mesh, Shader, ShaderSource};
use crate::core::config::SceneConfig;
use crate::ecs::component::Component;
use crate::ecs::component_store::ComponentStore;
use crate::ecs::components::{
    LightComponent, ObjectMetadataComponent, RendererComponent, TransformComponent,
};
use crate::foundation::math::{Vec3, Vec4};
use crate::scene::{SceneLoader, SceneSaver};
use crate::serialization::{Serialized, SerializationContext, NULL_ID};

#[test]
fn test_every_registered_type_reflects_its_own_attributes() {
    let context = SerializationContext::with_builtin_types();
    let mut names: Vec<&str> = context.registry.type_names().collect();
    names.sort_unstable();
    assert!(!names.is_empty());

    for name in names {
        let source = context.create_instance(name).unwrap();
        let attributes = source.get_all_attributes();
        assert_eq!(
            attributes.len(),
            source.attribute_names().len(),
            "{} declares attributes it cannot read",
            name
        );

        let mut copy = context.registry.create_instance(name, None).unwrap();
        copy.set_attributes(attributes.clone());
        assert_eq!(copy.get_all_attributes(), attributes, "{} lost attributes", name);
    }
}

fn populated_scene() -> (ComponentStore, AssetStore) {
    let mut components = ComponentStore::new();

    let mut root = TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0)).with_dynamic(true);
    root.set_unique_id(11);
    root.set_entity_id(10);
    components.add(Box::new(root));

    let mut light = LightComponent::default();
    light.intensity = 4.0;
    light.color = Vec3::new(1.0, 0.5, 0.25);
    light.set_unique_id(12);
    light.set_entity_id(10);
    components.add(Box::new(light));

    let mut renderer = RendererComponent::default();
    renderer.mesh_reference = 30;
    renderer.material_reference = 31;
    renderer.set_unique_id(13);
    renderer.set_entity_id(10);
    components.add(Box::new(renderer));

    let mut child = TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)).with_parent(10);
    child.set_unique_id(21);
    child.set_entity_id(20);
    components.add(Box::new(child));

    let mut metadata = ObjectMetadataComponent::named("crate");
    metadata.set_unique_id(22);
    metadata.set_entity_id(20);
    components.add(Box::new(metadata));

    let mut assets = AssetStore::new();

    let mut mesh = Mesh::default();
    mesh.name = "quad".to_string();
    mesh.indices = vec![0, 1, 2, 2, 1, 3];
    mesh.positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
    mesh.set_unique_id(30);
    assets.add(Box::new(mesh));

    let mut material = Material::named("painted");
    material.set_unique_id(31);
    material.shader_id = 32;
    material.set_float("Roughness", 0.75);
    material.set_vector("Albedo", Vec4::new(0.1, 0.2, 0.3, 1.0));
    assets.add(Box::new(material));

    let mut shader = Shader::default();
    shader.language = "glsl".to_string();
    shader.sources = vec![
        ShaderSource::new(0, "void main() {}"),
        ShaderSource::new(1, "void main() { discard; }"),
    ];
    shader.set_unique_id(32);
    assets.add(Box::new(shader));

    (components, assets)
}

#[test]
fn test_saved_scene_loads_back_with_fresh_ids() {
    let dir = temp_test_dir();
    let path = dir.join("level.ssd");
    let (components, assets) = populated_scene();
    SceneSaver::new().save_scene(&path, &components, &assets).unwrap();

    let context = SerializationContext::with_builtin_types();
    let loader = SceneLoader::new(&context, SceneConfig::default());
    let mut loaded_components = ComponentStore::new();
    let mut loaded_assets = AssetStore::new();
    let summary = loader
        .load_scene(&path, &mut loaded_components, &mut loaded_assets)
        .unwrap();
    assert_eq!(summary.entities, 2);
    assert_eq!(summary.components, 5);
    assert_eq!(summary.assets, 3);
    assert!(summary.remap.dangling.is_empty());

    let (root_entity, root) = loaded_components
        .iter::<TransformComponent>()
        .find(|(_, t)| t.parent_id == NULL_ID)
        .unwrap();
    assert_eq!(root.position, Vec3::new(1.0, 2.0, 3.0));
    assert!(root.is_dynamic);

    let (child_entity, child) = loaded_components
        .iter::<TransformComponent>()
        .find(|(_, t)| t.parent_id != NULL_ID)
        .unwrap();
    assert_eq!(child.parent_id, root_entity);
    assert_eq!(
        loaded_components.get::<ObjectMetadataComponent>(child_entity).unwrap().name,
        "crate"
    );

    let light = loaded_components.get::<LightComponent>(root_entity).unwrap();
    assert_relative_eq!(light.intensity, 4.0);
    assert_eq!(light.color, Vec3::new(1.0, 0.5, 0.25));

    let renderer = loaded_components.get::<RendererComponent>(root_entity).unwrap();
    let mesh = loaded_assets.get_typed::<Mesh>(renderer.mesh_reference).unwrap();
    assert_eq!(mesh.name, "quad");
    assert_eq!(mesh.triangle_count(), 2);
    assert!(mesh.indices_in_bounds());

    let material = loaded_assets.get_typed::<Material>(renderer.material_reference).unwrap();
    assert_eq!(material.float("Roughness"), Some(0.75));
    assert_eq!(material.vector("Albedo"), Some(Vec4::new(0.1, 0.2, 0.3, 1.0)));

    let shader = loaded_assets.get_typed::<Shader>(material.shader_id).unwrap();
    assert_eq!(shader.language, "glsl");
    assert_eq!(shader.sources.len(), 2);
    assert_eq!(shader.stage(1).unwrap().source, "void main() { discard; }");
    assert!(shader.sources.iter().all(|s| s.unique_id() != NULL_ID));

    assert_eq!(loaded_assets.source(mesh.unique_id()).unwrap().origin, AssetOrigin::Scene);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_external_asset_takes_the_placeholder_id() {
    let dir = temp_test_dir();

    let mut material = Material::named("shared");
    material.set_unique_id(7);
    material.set_float("Metallic", 1.0);
    SceneSaver::new().save_asset(dir.join("shared.ssd"), &material).unwrap();

    let mut placeholder = ExternalAsset::new("shared.ssd");
    placeholder.set_unique_id(40);
    let mut renderer = RendererComponent::default();
    renderer.material_reference = 40;
    renderer.set_unique_id(41);
    renderer.set_entity_id(41);
    let scene = SceneSaver::new()
        .document(&[&placeholder as &dyn Serialized, &renderer])
        .unwrap();
    let bytes = crate::serialization::writer::write_document_to_vec(&scene).unwrap();
    let scene_path = dir.join("level.ssd");
    std::fs::write(&scene_path, bytes).unwrap();

    let context = SerializationContext::with_builtin_types();
    let loader = SceneLoader::new(&context, SceneConfig::default());
    let mut components = ComponentStore::new();
    let mut assets = AssetStore::new();
    let summary = loader.load_scene(&scene_path, &mut components, &mut assets).unwrap();
    assert_eq!(summary.external_assets, 1);
    assert_eq!(summary.components, 1);

    let (_, renderer) = components.iter::<RendererComponent>().next().unwrap();
    assert_ne!(renderer.material_reference, NULL_ID);
    let material = assets.get_typed::<Material>(renderer.material_reference).unwrap();
    assert_eq!(material.name, "shared");
    assert_eq!(material.float("Metallic"), Some(1.0));
    assert!(assets.get_typed::<ExternalAsset>(renderer.material_reference).is_none());

    let source = assets.source(renderer.material_reference).unwrap();
    assert_eq!(source.origin, AssetOrigin::External);
    assert_eq!(source.file_name, dir.join("shared.ssd"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_external_file_fails_the_load() {
    let dir = temp_test_dir();
    let scene = SceneSaver::new()
        .document(&[&ExternalAsset::new("nowhere.ssd") as &dyn Serialized])
        .unwrap();
    let scene_path = dir.join("level.ssd");
    std::fs::write(
        &scene_path,
        crate::serialization::writer::write_document_to_vec(&scene).unwrap(),
    )
    .unwrap();

    let context = SerializationContext::with_builtin_types();
    let loader = SceneLoader::new(&context, SceneConfig::default());
    let mut components = ComponentStore::new();
    let mut assets = AssetStore::new();
    assert!(loader.load_scene(&scene_path, &mut components, &mut assets).is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}
