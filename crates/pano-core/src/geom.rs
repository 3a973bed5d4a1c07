use glam::Vec3;

/// World-space ray with a normalised direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Exit distance of a ray that starts inside a sphere (the far root).
#[inline]
pub fn ray_sphere_exit(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b + disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Angle in radians between the ray direction and the direction to `point`.
#[inline]
pub fn angle_to(ray: &Ray, point: Vec3) -> f32 {
    let to = (point - ray.origin).normalize_or_zero();
    ray.dir.dot(to).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_from_center_is_radius() {
        let t = ray_sphere_exit(Vec3::ZERO, Vec3::NEG_Z, Vec3::ZERO, 10.0).unwrap();
        assert!((t - 10.0).abs() < 1e-4);
    }

    #[test]
    fn angle_to_is_zero_on_axis() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(angle_to(&ray, Vec3::new(0.0, 0.0, -4.0)) < 1e-3);
        let right_angle = angle_to(&ray, Vec3::X);
        assert!((right_angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }
}
