// Host-side tests for the camera controller, orientation calibration and
// backdrop geometry.

use glam::{Vec2, Vec3};
use pano_core::camera::heading_toward;
use pano_core::sphere::{direction_to_uv, SphereMesh};
use pano_core::{
    CameraController, OrientationSampler, RawOrientation, Viewer, ViewerConfig, Viewport,
};

fn raw(alpha: f32, beta: f32, gamma: f32) -> RawOrientation {
    RawOrientation {
        alpha: Some(alpha),
        beta: Some(beta),
        gamma: Some(gamma),
    }
}

#[test]
fn first_sample_after_mount_becomes_zero() {
    let mut s = OrientationSampler::mount();
    assert!(s.calibrated().is_none());
    s.record(raw(123.0, 45.0, -10.0));
    let c = s.calibrated().unwrap();
    assert_eq!((c.yaw, c.pitch, c.roll), (0.0, 0.0, 0.0));

    // Later samples are relative to the first one, not re-zeroed.
    s.record(raw(133.0, 40.0, -10.0));
    let c = s.calibrated().unwrap();
    assert!((c.yaw - 10.0).abs() < 1e-4);
    assert!((c.pitch + 5.0).abs() < 1e-4);
}

#[test]
fn recalibrating_twice_is_the_same_as_once() {
    let mut s = OrientationSampler::mount();
    s.record(raw(10.0, 0.0, 0.0));
    s.record(raw(80.0, 12.0, 3.0));
    assert!(s.recalibrate());
    let once = s.offset();
    assert!(s.recalibrate());
    assert_eq!(s.offset(), once);
    let c = s.calibrated().unwrap();
    assert_eq!((c.yaw, c.pitch, c.roll), (0.0, 0.0, 0.0));
}

#[test]
fn recalibrate_without_sample_keeps_offset() {
    let mut s = OrientationSampler::mount();
    assert!(!s.recalibrate());
    assert!(s.offset().is_none());
}

#[test]
fn remount_calibrates_afresh() {
    let mut s = OrientationSampler::mount();
    s.record(raw(10.0, 0.0, 0.0));
    s.unmount();
    s.record(raw(200.0, 0.0, 0.0));
    assert_eq!(s.offset().unwrap().yaw, 200.0);
}

#[test]
fn zoom_stays_within_fov_limits() {
    let cfg = ViewerConfig::default();
    let mut cam = CameraController::new(&cfg);
    for _ in 0..50 {
        cam.zoom_in();
        assert!(cam.fov() >= cfg.fov_min_deg);
    }
    assert_eq!(cam.fov(), cfg.fov_min_deg);
    for _ in 0..50 {
        cam.zoom_by_wheel(120.0);
        assert!(cam.fov() <= cfg.fov_max_deg);
    }
    assert_eq!(cam.fov(), cfg.fov_max_deg);

    cam.pinch_start();
    cam.pinch_to(0.01);
    assert_eq!(cam.fov(), cfg.fov_max_deg);
    cam.pinch_to(0.0);
    assert_eq!(cam.fov(), cfg.fov_max_deg);
    cam.pinch_end();

    cam.reset_view(0.0, 0.0, 500.0);
    assert_eq!(cam.fov(), cfg.fov_max_deg);
}

#[test]
fn one_wheel_notch_is_one_zoom_step() {
    let cfg = ViewerConfig::default();
    let mut cam = CameraController::new(&cfg);
    cam.reset_view(0.0, 0.0, 60.0);
    cam.zoom_by_wheel(-3.0);
    assert_eq!(cam.fov(), 60.0 - cfg.zoom_step_deg);
    cam.zoom_by_wheel(0.0);
    assert_eq!(cam.fov(), 60.0 - cfg.zoom_step_deg);
}

#[test]
fn gyroscope_overrides_pointer_drag() {
    let cfg = ViewerConfig::default();
    let mut cam = CameraController::new(&cfg);
    let mut s = OrientationSampler::mount();
    s.record(raw(0.0, 0.0, 0.0));
    s.record(raw(90.0, 0.0, 0.0));
    assert!(cam.gyro_active(&s));

    cam.drag_start(Vec2::ZERO);
    assert!(!cam.drag_to(Vec2::new(300.0, 0.0), &s));
    assert_eq!(cam.heading(), 0.0);

    // Device turned 90 degrees counter-clockwise: the view looks down -X.
    let fwd = cam.rotation(&s) * Vec3::NEG_Z;
    assert!((fwd - Vec3::NEG_X).length() < 1e-4);
    assert!((heading_toward(fwd) - 90.0).abs() < 1e-3);

    cam.set_gyro_enabled(false);
    assert!(!cam.gyro_active(&s));
    let fwd = cam.rotation(&s) * Vec3::NEG_Z;
    assert!((fwd - Vec3::NEG_Z).length() < 1e-4);
}

#[test]
fn backdrop_triangles_face_the_camera() {
    let mesh = SphereMesh::build(500.0, 60, 40);
    let pos = |i: u32| Vec3::from_array(mesh.vertices[i as usize].position);
    let mut checked = 0;
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (pos(tri[0]), pos(tri[1]), pos(tri[2]));
        let normal = (b - a).cross(c - a);
        if normal.length() < 1e-3 {
            continue;
        }
        let centroid = (a + b + c) / 3.0;
        assert!(
            normal.dot(centroid) < 0.0,
            "triangle {tri:?} faces away from the center"
        );
        checked += 1;
    }
    assert_eq!(checked, mesh.triangle_count());
}

#[test]
fn initial_view_shows_image_center() {
    let cam = CameraController::new(&ViewerConfig::default());
    let frame = cam.frame(&OrientationSampler::mount(), Viewport::new(1280.0, 720.0));
    let ray = frame.screen_ray(Vec2::new(640.0, 360.0));
    let uv = direction_to_uv(ray.dir);
    assert!((uv - Vec2::new(0.5, 0.5)).length() < 1e-4);

    // Right half of the screen shows the right half of the photo.
    let right = direction_to_uv(frame.screen_ray(Vec2::new(1200.0, 360.0)).dir);
    assert!(right.x > 0.5);
}

#[test]
fn viewer_drag_yields_to_the_gyroscope_once_samples_arrive() {
    let mut v = Viewer::new(ViewerConfig::default());
    v.camera_mut().drag_start(Vec2::new(100.0, 100.0));
    assert!(v.drag_to(Vec2::new(140.0, 100.0)));
    let turned = v.camera().heading();

    v.sampler_mut().record(raw(30.0, 10.0, 0.0));
    assert!(!v.drag_to(Vec2::new(200.0, 100.0)));
    assert_eq!(v.camera().heading(), turned);
}
