//! Vantage 3D
//!
//! The camera side of a scroll-driven scene:
//!
//! - [`CameraState`]: the shared logical pose that tweens write
//! - [`CameraRig`]: per-frame smoothing of a render camera toward that pose
//! - [`OrbitController`]: distance-limited orbiting around a look-at target
//! - [`OutlinedModel`]: named model nodes with extracted feature edges
//!
//! # Example
//!
//! ```ignore
//! use vantage_3d::prelude::*;
//!
//! let state = CameraState::default().shared();
//! let mut rig = CameraRig::default();
//! rig.attach(state.clone());
//!
//! // every frame
//! rig.frame(dt_ms, Some(&mut camera), Some(&mut orbit));
//! ```

pub mod camera;
pub mod camera_state;
pub mod edges;
pub mod model;
pub mod orbit;
pub mod rig;

pub use camera::{PerspectiveCamera, RigCamera};
pub use camera_state::{CameraState, SharedCameraState};
pub use edges::extract_edges;
pub use model::{
    default_node_styles, EdgeStyle, Mesh, ModelAsset, ModelNode, NodeStyle, OutlinedModel,
    OutlinedNode,
};
pub use orbit::OrbitController;
pub use rig::{CameraRig, RigState, Smoothing, DEFAULT_ALPHA, DEFAULT_REFERENCE_FRAME_MS};

/// Prelude for common imports
pub mod prelude {
    pub use crate::camera::{PerspectiveCamera, RigCamera};
    pub use crate::camera_state::{CameraState, SharedCameraState};
    pub use crate::model::{ModelAsset, OutlinedModel};
    pub use crate::orbit::OrbitController;
    pub use crate::rig::{CameraRig, RigState, Smoothing};
}
