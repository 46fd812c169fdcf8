//! Scene data
//!
//! Flat containers the renderer reads from:
//! - Scene: slot maps of geometries, materials and meshes
//! - Mesh: a drawable binding geometry to one or more materials
//! - Camera: view and projection matrices
//!
//! Passes share scenes and cameras with the application through
//! [`SharedScene`] / [`SharedCamera`].

pub mod camera;
pub mod mesh;
pub mod scene;

use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::new_key_type;

pub use camera::{Camera, ProjectionType};
pub use mesh::{InstanceData, MaterialSlot, Mesh, MeshId};
pub use scene::{Scene, SceneId};

new_key_type! {
    pub struct MeshKey;
    pub struct GeometryKey;
    pub struct MaterialKey;
}

pub type SharedScene = Arc<RwLock<Scene>>;
pub type SharedCamera = Arc<RwLock<Camera>>;

/// Wraps a scene for sharing with passes.
#[must_use]
pub fn shared_scene(scene: Scene) -> SharedScene {
    Arc::new(RwLock::new(scene))
}

#[must_use]
pub fn shared_camera(camera: Camera) -> SharedCamera {
    Arc::new(RwLock::new(camera))
}
