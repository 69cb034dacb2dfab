//! Transform hierarchy resolution
//!
//! Two passes over every [`TransformComponent`] in the store. The local pass
//! rebuilds each local matrix from position, rotation and scale. The world
//! pass then walks each transform's parent chain through the store and
//! composes `World = parentChain * Local`, where the chain is the product of
//! the ancestors' local matrices from the root down.

use std::collections::HashMap;

use crate::core::config::TransformConfig;
use crate::ecs::component::EntityId;
use crate::ecs::component_store::ComponentStore;
use crate::ecs::components::TransformComponent;
use crate::ecs::system::System;
use crate::foundation::math::{inverse_transpose, Mat4, Transform};
use crate::serialization::NULL_ID;

/// Maximum number of parent hops followed from one transform
///
/// Reaching it while a parent is still present means the hierarchy is
/// deeper than supported or contains a cycle; the entity is reported as
/// truncated and composed from the hops already taken.
pub const MAX_HIERARCHY_DEPTH: usize = 255;

/// Outcome of one [`TransformSystem::calculate_transforms`] call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformPassReport {
    /// Transforms whose world values were recomputed
    pub updated: usize,
    /// Entities whose parent chain hit [`MAX_HIERARCHY_DEPTH`]
    pub truncated: Vec<EntityId>,
    /// Entities whose world matrix had no inverse
    pub singular: Vec<EntityId>,
}

/// Ancestor data the world pass needs, copied out before any transform is written
#[derive(Clone, Copy)]
struct ParentLink {
    local: Mat4,
    local_uniform: Mat4,
    parent: EntityId,
}

/// System computing local and world matrices for every transform
#[derive(Debug, Clone, Default)]
pub struct TransformSystem {
    config: TransformConfig,
    active: bool,
    last_report: TransformPassReport,
}

impl TransformSystem {
    /// Create a transform system
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            active: false,
            last_report: TransformPassReport::default(),
        }
    }

    /// Whether [`System::initialize`] has run
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Report of the most recent pass run through the [`System`] hooks
    pub fn last_report(&self) -> &TransformPassReport {
        &self.last_report
    }

    /// Run the local pass, then the world pass
    ///
    /// With `ignore_static` set, transforms whose dynamic flag is false keep
    /// every derived value from the previous full pass.
    pub fn calculate_transforms(
        store: &mut ComponentStore,
        ignore_static: bool,
    ) -> TransformPassReport {
        Self::local_pass(store, ignore_static);
        let report = Self::world_pass(store, ignore_static);

        if !report.truncated.is_empty() {
            log::warn!(
                "Transform hierarchy exceeded {} levels for entities {:?}",
                MAX_HIERARCHY_DEPTH,
                report.truncated
            );
        }
        log::trace!(
            "Resolved {} transforms (ignore_static = {})",
            report.updated,
            ignore_static
        );
        report
    }

    fn local_pass(store: &mut ComponentStore, ignore_static: bool) {
        for (_, transform) in store.iter_mut::<TransformComponent>() {
            if ignore_static && !transform.is_dynamic {
                continue;
            }
            let trs = transform.to_math_transform();
            transform.local_transform = trs.to_matrix();
            transform.local_transform_uniform_scale = trs.to_uniform_scale_matrix();
        }
    }

    fn world_pass(store: &mut ComponentStore, ignore_static: bool) -> TransformPassReport {
        let links: HashMap<EntityId, ParentLink> = store
            .iter::<TransformComponent>()
            .map(|(entity, transform)| {
                (
                    entity,
                    ParentLink {
                        local: transform.local_transform,
                        local_uniform: transform.local_transform_uniform_scale,
                        parent: transform.parent_id,
                    },
                )
            })
            .collect();

        let mut report = TransformPassReport::default();
        for (entity, transform) in store.iter_mut::<TransformComponent>() {
            if ignore_static && !transform.is_dynamic {
                continue;
            }

            let mut chain = Mat4::identity();
            let mut chain_uniform = Mat4::identity();
            let mut parent = transform.parent_id;
            let mut hops = 0;
            while parent != NULL_ID {
                let Some(link) = links.get(&parent) else {
                    break;
                };
                if hops == MAX_HIERARCHY_DEPTH {
                    report.truncated.push(entity);
                    break;
                }
                chain = link.local * chain;
                chain_uniform = link.local_uniform * chain_uniform;
                parent = link.parent;
                hops += 1;
            }

            transform.world_transform = chain * transform.local_transform;
            transform.world_transform_uniform_scale =
                chain_uniform * transform.local_transform_uniform_scale;
            transform.world_transform_inverse_transpose =
                match inverse_transpose(&transform.world_transform) {
                    Some(matrix) => matrix,
                    None => {
                        log::warn!("World transform of entity {} is singular", entity);
                        report.singular.push(entity);
                        Mat4::identity()
                    }
                };

            let world = Transform::from_matrix(&transform.world_transform);
            transform.world_position = world.position;
            transform.world_rotation = world.rotation;
            transform.world_scale = world.scale;
            report.updated += 1;
        }
        report
    }
}

impl System for TransformSystem {
    fn name(&self) -> &'static str {
        "TransformSystem"
    }

    fn initialize(&mut self, store: &mut ComponentStore) -> bool {
        if self.config.resolve_on_initialize {
            self.last_report = Self::calculate_transforms(store, false);
        }
        self.active = true;
        true
    }

    fn update(&mut self, store: &mut ComponentStore) -> bool {
        if !self.active {
            log::warn!("TransformSystem updated before initialize");
            return false;
        }
        self.last_report = Self::calculate_transforms(store, self.config.update_ignores_static);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::Component;
    use crate::foundation::math::{Quat, Vec3};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn add(store: &mut ComponentStore, entity: EntityId, transform: TransformComponent) {
        let mut transform = transform;
        transform.set_entity_id(entity);
        store.add(Box::new(transform));
    }

    fn world_position(store: &ComponentStore, entity: EntityId) -> Vec3 {
        store.get::<TransformComponent>(entity).unwrap().world_position()
    }

    #[test]
    fn test_child_translation_composes_with_parent() {
        let mut store = ComponentStore::new();
        add(&mut store, 1, TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0)));
        add(
            &mut store,
            2,
            TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)).with_parent(1),
        );

        let report = TransformSystem::calculate_transforms(&mut store, false);
        assert_eq!(report.updated, 2);
        assert!(report.truncated.is_empty());
        assert_relative_eq!(world_position(&store, 2), Vec3::new(1.0, 3.0, 3.0));
        assert_relative_eq!(world_position(&store, 1), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_child_listed_before_parent() {
        let mut store = ComponentStore::new();
        add(&mut store, 3, TransformComponent::from_position(Vec3::new(0.0, 0.0, 1.0)).with_parent(2));
        add(&mut store, 2, TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)).with_parent(1));
        add(&mut store, 1, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)));

        TransformSystem::calculate_transforms(&mut store, false);
        assert_relative_eq!(world_position(&store, 3), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_parent_rotation_and_scale_apply_to_child() {
        let mut store = ComponentStore::new();
        add(
            &mut store,
            1,
            TransformComponent::default()
                .with_rotation(Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2))
                .with_scale(Vec3::new(2.0, 2.0, 2.0)),
        );
        add(
            &mut store,
            2,
            TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)).with_parent(1),
        );

        TransformSystem::calculate_transforms(&mut store, false);
        let child = store.get::<TransformComponent>(2).unwrap();
        assert_relative_eq!(child.world_position(), Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(child.world_scale(), Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-5);
        let expected = Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2);
        assert!(child.world_rotation().coords.dot(&expected.coords).abs() > 0.9999);
    }

    #[test]
    fn test_uniform_world_uses_dominant_axis_along_chain() {
        let mut store = ComponentStore::new();
        add(&mut store, 1, TransformComponent::default().with_scale(Vec3::new(1.0, 3.0, 2.0)));
        add(
            &mut store,
            2,
            TransformComponent::default()
                .with_scale(Vec3::new(2.0, 1.0, 1.0))
                .with_parent(1),
        );

        TransformSystem::calculate_transforms(&mut store, false);
        let child = store.get::<TransformComponent>(2).unwrap();
        let uniform = child.world_transform_uniform_scale();
        assert_relative_eq!(uniform.m11, 6.0);
        assert_relative_eq!(uniform.m22, 6.0);
        assert_relative_eq!(uniform.m33, 6.0);
        assert_relative_eq!(child.world_transform().m22, 3.0);
    }

    #[test]
    fn test_missing_parent_acts_as_root() {
        let mut store = ComponentStore::new();
        add(
            &mut store,
            4,
            TransformComponent::from_position(Vec3::new(5.0, 0.0, 0.0)).with_parent(99),
        );
        let report = TransformSystem::calculate_transforms(&mut store, false);
        assert!(report.truncated.is_empty());
        assert_relative_eq!(world_position(&store, 4), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_cycle_terminates_at_hop_limit() {
        let mut store = ComponentStore::new();
        add(&mut store, 1, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)).with_parent(2));
        add(&mut store, 2, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)).with_parent(1));

        let first = TransformSystem::calculate_transforms(&mut store, false);
        assert_eq!(first.truncated, vec![1, 2]);
        // own translation plus one per hop
        let expected = 1.0 + MAX_HIERARCHY_DEPTH as f32;
        assert_relative_eq!(world_position(&store, 1).x, expected);

        let second = TransformSystem::calculate_transforms(&mut store, false);
        assert_eq!(second, first);
        assert_relative_eq!(world_position(&store, 1).x, expected);
    }

    #[test]
    fn test_self_parent_is_truncated() {
        let mut store = ComponentStore::new();
        add(&mut store, 7, TransformComponent::default().with_parent(7));
        let report = TransformSystem::calculate_transforms(&mut store, false);
        assert_eq!(report.truncated, vec![7]);
    }

    #[test]
    fn test_ignore_static_skips_non_dynamic() {
        let mut store = ComponentStore::new();
        add(&mut store, 1, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)).with_dynamic(true));
        add(&mut store, 2, TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)).with_parent(1));
        TransformSystem::calculate_transforms(&mut store, false);
        let before = *store.get::<TransformComponent>(2).unwrap().world_transform();

        store.get_mut::<TransformComponent>(1).unwrap().position = Vec3::new(10.0, 0.0, 0.0);
        let report = TransformSystem::calculate_transforms(&mut store, true);
        assert_eq!(report.updated, 1);
        assert_relative_eq!(world_position(&store, 1), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(store.get::<TransformComponent>(2).unwrap().world_transform(), &before);

        TransformSystem::calculate_transforms(&mut store, false);
        assert_relative_eq!(world_position(&store, 2), Vec3::new(10.0, 1.0, 0.0));
    }

    #[test]
    fn test_singular_world_falls_back_to_identity_inverse() {
        let mut store = ComponentStore::new();
        add(&mut store, 1, TransformComponent::default().with_scale(Vec3::new(0.0, 1.0, 1.0)));
        let report = TransformSystem::calculate_transforms(&mut store, false);
        assert_eq!(report.singular, vec![1]);
        let transform = store.get::<TransformComponent>(1).unwrap();
        assert_eq!(transform.world_transform_inverse_transpose(), &Mat4::identity());
        assert!(transform.world_rotation().coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_inverse_transpose_of_scaled_world() {
        let mut store = ComponentStore::new();
        add(&mut store, 1, TransformComponent::default().with_scale(Vec3::new(2.0, 4.0, 1.0)));
        TransformSystem::calculate_transforms(&mut store, false);
        let inverse = *store.get::<TransformComponent>(1).unwrap().world_transform_inverse_transpose();
        assert_relative_eq!(inverse.m11, 0.5);
        assert_relative_eq!(inverse.m22, 0.25);
    }

    #[test]
    fn test_system_hooks_follow_config() {
        let mut store = ComponentStore::new();
        add(&mut store, 1, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)));

        let mut system = TransformSystem::new(TransformConfig::default());
        assert!(!system.update(&mut store));
        assert!(system.initialize(&mut store));
        assert!(system.is_active());
        assert_eq!(system.last_report().updated, 1);
        assert_relative_eq!(world_position(&store, 1), Vec3::new(1.0, 0.0, 0.0));

        store.get_mut::<TransformComponent>(1).unwrap().position = Vec3::new(2.0, 0.0, 0.0);
        assert!(system.update(&mut store));
        assert_eq!(system.last_report().updated, 0);
        assert_relative_eq!(world_position(&store, 1), Vec3::new(1.0, 0.0, 0.0));
    }
}
