pub mod authoring;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod geom;
pub mod markers;
pub mod model;
pub mod orientation;
pub mod record;
pub mod sphere;
pub mod store;
pub mod viewer;

pub static SPHERE_WGSL: &str = include_str!("../shaders/sphere.wgsl");
pub static MARKERS_WGSL: &str = include_str!("../shaders/markers.wgsl");

pub use camera::{CameraController, CameraFrame, Viewport};
pub use catalog::{Catalog, FloorPlanEntry};
pub use config::{Mode, ViewerConfig};
pub use error::{PanoError, Result, StoreError, StoreOp};
pub use geom::Ray;
pub use markers::{Activation, ActivationIntent, LoadToken, MarkerLayer, ModelRequest, ModelState};
pub use model::*;
pub use orientation::{OrientationSample, OrientationSampler, PermissionOutcome, RawOrientation};
pub use store::{Dependents, MemoryStore, PanoramaStore};
pub use viewer::{Applied, ClickOutcome, Hit, SceneContents, SceneTicket, TextureState, Viewer};
