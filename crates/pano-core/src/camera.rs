//! Camera controller for the panorama viewer.
//!
//! The camera sits at the origin inside the backdrop sphere. Its orientation
//! comes either from the calibrated gyroscope sample or, as a fallback, from
//! pointer drag. Heading is a rotation about +Y in degrees (counter-clockwise
//! seen from above, 0 looks down -Z); pitch is a rotation about +X (positive
//! looks up).

use crate::config::ViewerConfig;
use crate::constants::{Z_FAR, Z_NEAR};
use crate::geom::Ray;
use crate::orientation::{OrientationSample, OrientationSampler};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Limits {
    fov_min: f32,
    fov_max: f32,
    zoom_step: f32,
    drag_deg_per_px: f32,
    pitch_limit: f32,
    fov_reference: f32,
}

/// Matrices for one rendered frame.
#[derive(Clone, Copy, Debug)]
pub struct CameraFrame {
    pub rotation: Quat,
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    pub viewport: Viewport,
}

impl CameraFrame {
    /// World-space ray through a pixel (backing-store coordinates).
    pub fn screen_ray(&self, px: Vec2) -> Ray {
        let ndc_x = (2.0 * px.x / self.viewport.width.max(1.0)) - 1.0;
        let ndc_y = 1.0 - (2.0 * px.y / self.viewport.height.max(1.0));
        let inv = self.view_proj.inverse();
        let p_far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let p1: Vec3 = p_far.truncate() / p_far.w;
        Ray::new(Vec3::ZERO, p1)
    }

    /// Pixel position of a world point, or `None` when it is behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * world.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
        ))
    }
}

/// Rotation for a calibrated device sample: yaw-pitch-roll order, roll sign
/// inverted because device gamma and scene roll have opposite handedness.
#[inline]
pub fn gyro_rotation(s: OrientationSample) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        s.yaw.to_radians(),
        s.pitch.to_radians(),
        -s.roll.to_radians(),
    )
}

/// Heading (degrees, in [0, 360)) that looks toward `dir` in the horizontal plane.
#[inline]
pub fn heading_toward(dir: Vec3) -> f32 {
    wrap_deg(f32::atan2(-dir.x, -dir.z).to_degrees())
}

#[inline]
pub fn wrap_deg(deg: f32) -> f32 {
    let w = deg.rem_euclid(360.0);
    if w >= 360.0 {
        0.0
    } else {
        w
    }
}

#[derive(Clone, Debug)]
pub struct CameraController {
    limits: Limits,
    heading_deg: f32,
    pitch_deg: f32,
    fov_deg: f32,
    gyro_enabled: bool,
    drag_last: Option<Vec2>,
    pinch_base_fov: Option<f32>,
}

impl CameraController {
    pub fn new(cfg: &ViewerConfig) -> Self {
        Self {
            limits: Limits {
                fov_min: cfg.fov_min_deg,
                fov_max: cfg.fov_max_deg,
                zoom_step: cfg.zoom_step_deg,
                drag_deg_per_px: cfg.drag_deg_per_px,
                pitch_limit: cfg.pitch_limit_deg,
                fov_reference: cfg.initial_fov(),
            },
            heading_deg: 0.0,
            pitch_deg: 0.0,
            fov_deg: cfg.initial_fov(),
            gyro_enabled: cfg.gyro_enabled,
            drag_last: None,
            pinch_base_fov: None,
        }
    }

    pub fn heading(&self) -> f32 {
        self.heading_deg
    }

    pub fn pitch(&self) -> f32 {
        self.pitch_deg
    }

    pub fn fov(&self) -> f32 {
        self.fov_deg
    }

    pub fn gyro_enabled(&self) -> bool {
        self.gyro_enabled
    }

    pub fn set_gyro_enabled(&mut self, enabled: bool) {
        self.gyro_enabled = enabled;
        self.drag_last = None;
    }

    /// Whether this frame is driven by the gyroscope rather than pointer drag.
    #[inline]
    pub fn gyro_active(&self, sampler: &OrientationSampler) -> bool {
        self.gyro_enabled && sampler.calibrated().is_some()
    }

    /// Put the camera at a scene's entry pose.
    pub fn reset_view(&mut self, heading_deg: f32, pitch_deg: f32, fov_deg: f32) {
        self.heading_deg = wrap_deg(heading_deg);
        self.pitch_deg = pitch_deg.clamp(-self.limits.pitch_limit, self.limits.pitch_limit);
        self.fov_deg = self.clamp_fov(fov_deg);
        self.drag_last = None;
        self.pinch_base_fov = None;
    }

    /// Camera orientation for this frame. Hot path: pure math only.
    #[inline]
    pub fn rotation(&self, sampler: &OrientationSampler) -> Quat {
        let base = Quat::from_rotation_y(self.heading_deg.to_radians());
        if self.gyro_enabled {
            if let Some(sample) = sampler.calibrated() {
                return base * gyro_rotation(sample);
            }
        }
        base * Quat::from_rotation_x(self.pitch_deg.to_radians())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), aspect, Z_NEAR, Z_FAR)
    }

    pub fn frame(&self, sampler: &OrientationSampler, viewport: Viewport) -> CameraFrame {
        let rotation = self.rotation(sampler);
        let view = Mat4::from_quat(rotation.conjugate());
        let proj = self.projection_matrix(viewport.aspect());
        CameraFrame {
            rotation,
            view,
            proj,
            view_proj: proj * view,
            viewport,
        }
    }

    // ---------------- Pointer drag ----------------

    pub fn drag_start(&mut self, px: Vec2) {
        self.drag_last = Some(px);
    }

    /// Rotate by the pointer movement since the last call. Dragging grabs the
    /// scene: moving right turns the view left. Ignored while the gyroscope
    /// drives the camera.
    pub fn drag_to(&mut self, px: Vec2, sampler: &OrientationSampler) -> bool {
        let Some(last) = self.drag_last else {
            return false;
        };
        self.drag_last = Some(px);
        if self.gyro_active(sampler) {
            return false;
        }
        let delta = px - last;
        // Slower turning when zoomed in keeps the grabbed point under the pointer.
        let k = self.limits.drag_deg_per_px * (self.fov_deg / self.limits.fov_reference);
        self.heading_deg = wrap_deg(self.heading_deg + delta.x * k);
        self.pitch_deg = (self.pitch_deg + delta.y * k)
            .clamp(-self.limits.pitch_limit, self.limits.pitch_limit);
        delta != Vec2::ZERO
    }

    pub fn drag_end(&mut self) {
        self.drag_last = None;
    }

    pub fn dragging(&self) -> bool {
        self.drag_last.is_some()
    }

    // ---------------- Zoom ----------------

    #[inline]
    fn clamp_fov(&self, fov: f32) -> f32 {
        fov.clamp(self.limits.fov_min, self.limits.fov_max)
    }

    pub fn zoom_in(&mut self) {
        self.fov_deg = self.clamp_fov(self.fov_deg - self.limits.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.fov_deg = self.clamp_fov(self.fov_deg + self.limits.zoom_step);
    }

    /// One fixed step per wheel event; positive delta zooms out.
    pub fn zoom_by_wheel(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.zoom_out();
        } else if delta_y < 0.0 {
            self.zoom_in();
        }
    }

    pub fn pinch_start(&mut self) {
        self.pinch_base_fov = Some(self.fov_deg);
    }

    /// `scale` is current finger distance over the distance at pinch start.
    pub fn pinch_to(&mut self, scale: f32) {
        if let Some(base) = self.pinch_base_fov {
            if scale.is_finite() && scale > 0.0 {
                self.fov_deg = self.clamp_fov(base / scale);
            }
        }
    }

    pub fn pinch_end(&mut self) {
        self.pinch_base_fov = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn identity_looks_down_negative_z() {
        let cam = CameraController::new(&ViewerConfig::default());
        let sampler = OrientationSampler::mount();
        let fwd = cam.rotation(&sampler) * Vec3::NEG_Z;
        assert!(approx(fwd, Vec3::NEG_Z));
    }

    #[test]
    fn heading_toward_inverts_rotation() {
        for h in [0.0_f32, 45.0, 90.0, 180.0, 270.0, 315.0] {
            let dir = Quat::from_rotation_y(h.to_radians()) * Vec3::NEG_Z;
            let back = heading_toward(dir);
            let diff = crate::orientation::wrap_deg_signed(back - h).abs();
            assert!(diff < 1e-3, "heading {h} came back as {back}");
        }
    }

    #[test]
    fn positive_pitch_looks_up() {
        let mut cam = CameraController::new(&ViewerConfig::default());
        cam.reset_view(0.0, 30.0, 60.0);
        let fwd = cam.rotation(&OrientationSampler::mount()) * Vec3::NEG_Z;
        assert!(fwd.y > 0.4);
    }

    #[test]
    fn center_pixel_ray_matches_forward() {
        let mut cam = CameraController::new(&ViewerConfig::default());
        cam.reset_view(90.0, 0.0, 60.0);
        let sampler = OrientationSampler::mount();
        let frame = cam.frame(&sampler, Viewport::new(800.0, 600.0));
        let ray = frame.screen_ray(Vec2::new(400.0, 300.0));
        assert!(approx(ray.dir, frame.rotation * Vec3::NEG_Z));
    }

    #[test]
    fn project_round_trips_screen_ray() {
        let cam = CameraController::new(&ViewerConfig::default());
        let frame = cam.frame(&OrientationSampler::mount(), Viewport::new(1024.0, 768.0));
        let px = Vec2::new(700.0, 200.0);
        let ray = frame.screen_ray(px);
        let projected = frame.project(ray.at(10.0)).unwrap();
        assert!((projected - px).length() < 0.5);
        assert!(frame.project(Vec3::new(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn drag_right_turns_left() {
        let mut cam = CameraController::new(&ViewerConfig::default());
        let sampler = OrientationSampler::mount();
        cam.drag_start(Vec2::new(100.0, 100.0));
        assert!(cam.drag_to(Vec2::new(200.0, 100.0), &sampler));
        assert!(cam.heading() > 0.0 && cam.heading() < 180.0);
        cam.drag_end();
        assert!(!cam.drag_to(Vec2::new(300.0, 100.0), &sampler));
    }

    #[test]
    fn pitch_is_clamped_while_dragging() {
        let mut cam = CameraController::new(&ViewerConfig::default());
        let sampler = OrientationSampler::mount();
        cam.drag_start(Vec2::ZERO);
        cam.drag_to(Vec2::new(0.0, 100_000.0), &sampler);
        assert_eq!(cam.pitch(), ViewerConfig::default().pitch_limit_deg);
    }

    #[test]
    fn pinch_divides_fov() {
        let mut cam = CameraController::new(&ViewerConfig::default());
        cam.reset_view(0.0, 0.0, 60.0);
        cam.pinch_start();
        cam.pinch_to(1.2);
        assert!((cam.fov() - 50.0).abs() < 1e-3);
        cam.pinch_to(100.0);
        assert_eq!(cam.fov(), ViewerConfig::default().fov_min_deg);
    }
}
