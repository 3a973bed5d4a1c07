//! Backdrop sphere geometry and the equirectangular mapping.
//!
//! The camera sits at the center, so triangles are wound counter-clockwise
//! as seen from inside and back-face culling keeps exactly the inner
//! surface. Longitude grows toward +X: at heading 0 the viewer's right shows
//! the right-hand side of the photo, which is the mirror image of a sphere
//! textured to be seen from outside.

use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Unit direction for texture coordinates (u right, v down).
#[inline]
pub fn uv_to_direction(uv: Vec2) -> Vec3 {
    let lon = (uv.x - 0.5) * TAU;
    let lat = (0.5 - uv.y) * PI;
    Vec3::new(lon.sin() * lat.cos(), lat.sin(), -lon.cos() * lat.cos())
}

/// Texture coordinates seen along `dir`.
#[inline]
pub fn direction_to_uv(dir: Vec3) -> Vec2 {
    let d = dir.normalize_or_zero();
    let lon = f32::atan2(d.x, -d.z);
    let lat = d.y.clamp(-1.0, 1.0).asin();
    Vec2::new(lon / TAU + 0.5, 0.5 - lat / PI)
}

pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn build(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                let p = uv_to_direction(Vec2::new(u, v)) * radius;
                vertices.push(SphereVertex {
                    position: p.to_array(),
                    uv: [u, v],
                });
            }
        }

        let row = w + 1;
        let at = |iy: u32, ix: u32| iy * row + ix;
        let mut indices = Vec::with_capacity((w * h * 6) as usize);
        for iy in 0..h {
            for ix in 0..w {
                // a b
                // c d   (as seen from inside: u to the right, v downward)
                let a = at(iy, ix);
                let b = at(iy, ix + 1);
                let c = at(iy + 1, ix);
                let d = at(iy + 1, ix + 1);
                // Pole rows collapse one triangle of each quad.
                if iy != h - 1 {
                    indices.extend_from_slice(&[a, c, d]);
                }
                if iy != 0 {
                    indices.extend_from_slice(&[a, d, b]);
                }
            }
        }
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_ahead_is_image_center() {
        let uv = direction_to_uv(Vec3::NEG_Z);
        assert!((uv - Vec2::new(0.5, 0.5)).length() < 1e-5);
    }

    #[test]
    fn right_of_viewer_is_right_of_image() {
        let uv = direction_to_uv(Vec3::X);
        assert!((uv.x - 0.75).abs() < 1e-5);
        let up = direction_to_uv(Vec3::Y);
        assert!(up.y.abs() < 1e-5);
    }

    #[test]
    fn uv_direction_round_trip() {
        for &(u, v) in &[(0.1, 0.2), (0.5, 0.5), (0.9, 0.7), (0.3, 0.95)] {
            let uv = Vec2::new(u, v);
            let back = direction_to_uv(uv_to_direction(uv));
            assert!((back - uv).length() < 1e-4, "{uv:?} -> {back:?}");
        }
    }

    #[test]
    fn vertices_lie_on_radius() {
        let mesh = SphereMesh::build(500.0, 16, 8);
        for v in &mesh.vertices {
            let r = Vec3::from_array(v.position).length();
            assert!((r - 500.0).abs() < 1e-2);
        }
    }
}
