// Shared viewer tuning constants used by the core and the web frontend.
// `ViewerConfig::default()` is built from these.

// Field of view (degrees)
pub const FOV_MIN_DEG: f32 = 40.0;
pub const FOV_MAX_DEG: f32 = 75.0;
pub const FOV_DEFAULT_DEG: f32 = 75.0;
pub const ZOOM_STEP_DEG: f32 = 5.0; // one wheel notch or one +/- key press

// Pointer drag
pub const DRAG_DEG_PER_PX: f32 = 0.15; // at the default FOV; scaled by current FOV
pub const PITCH_LIMIT_DEG: f32 = 85.0;

// Scene layout
pub const BACKDROP_RADIUS: f32 = 500.0; // textured sphere around the camera
pub const BACKDROP_WIDTH_SEGMENTS: u32 = 60;
pub const BACKDROP_HEIGHT_SEGMENTS: u32 = 40;
pub const MARKER_SHELL_RADIUS: f32 = 10.0; // where clicked markers/links are placed
pub const MIN_MARKER_DISTANCE: f32 = 1e-3; // below this a position is degenerate

// Camera clip planes; far must enclose the backdrop
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;

// Interaction
pub const PICK_ANGLE_DEG: f32 = 2.5; // angular radius of a marker's pick cone

// Indicator palette
pub const MARKER_COLOR: [f32; 4] = [0.95, 0.95, 0.95, 0.95];
pub const MODEL_MARKER_COLOR: [f32; 4] = [0.98, 0.72, 0.18, 0.95];
pub const LINK_COLOR: [f32; 4] = [0.25, 0.78, 0.55, 0.95];
pub const HOVER_BRIGHTEN: f32 = 1.25;
