//! Built-in systems

pub mod transform_system;

pub use transform_system::{TransformPassReport, TransformSystem, MAX_HIERARCHY_DEPTH};
