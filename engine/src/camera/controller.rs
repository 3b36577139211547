//! Follow Camera
//!
//! Third-person orbit camera that keeps the local character in view at a
//! fixed distance and elevation. The player only turns it around the
//! vertical axis; its horizontal forward/right vectors are the basis the
//! character controller maps input onto.

use glam::Vec3;

/// Distance from the orbit target (m).
pub const DEFAULT_FOLLOW_DISTANCE: f32 = 10.0;

/// Fixed polar angle measured from +Y (radians).
pub const DEFAULT_POLAR_ANGLE: f32 = std::f32::consts::PI / 2.7;

/// Horizontal movement basis derived from a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// Unit forward on the ground plane
    pub forward: Vec3,
    /// Unit right on the ground plane
    pub right: Vec3,
}

impl CameraBasis {
    /// Basis from any view direction. Falls back to looking down -Z when
    /// the direction is (nearly) vertical.
    pub fn from_view_direction(view: Vec3) -> Self {
        let flat = Vec3::new(view.x, 0.0, view.z);
        let forward = flat.try_normalize().unwrap_or(Vec3::NEG_Z);
        Self {
            forward,
            // forward × Y gives right in this coordinate system
            right: forward.cross(Vec3::Y).normalize(),
        }
    }
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self::from_view_direction(Vec3::NEG_Z)
    }
}

/// Orbit camera pinned to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowCamera {
    /// Horizontal angle (radians); 0 looks toward -Z, +π/2 toward +X
    pub yaw: f32,
    pub polar_angle: f32,
    pub distance: f32,
    target: Vec3,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            polar_angle: DEFAULT_POLAR_ANGLE,
            distance: DEFAULT_FOLLOW_DISTANCE,
            target: Vec3::ZERO,
        }
    }
}

impl FollowCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-centre on the followed entity.
    pub fn follow(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Turn around the target by `delta` radians.
    pub fn rotate(&mut self, delta: f32) {
        self.yaw = (self.yaw + delta).rem_euclid(std::f32::consts::TAU);
    }

    /// Camera eye position.
    pub fn position(&self) -> Vec3 {
        let horizontal = Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos());
        let (sin_p, cos_p) = self.polar_angle.sin_cos();
        self.target - horizontal * (self.distance * sin_p) + Vec3::Y * (self.distance * cos_p)
    }

    /// Unit view direction (eye toward target).
    pub fn view_direction(&self) -> Vec3 {
        (self.target - self.position())
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    pub fn basis(&self) -> CameraBasis {
        CameraBasis::from_view_direction(self.view_direction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_basis_looks_down_negative_z() {
        let basis = CameraBasis::default();
        assert!((basis.forward - Vec3::NEG_Z).length() < 1e-6);
        assert!((basis.right - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_follow_camera_keeps_distance() {
        let mut cam = FollowCamera::new();
        cam.follow(Vec3::new(3.0, 0.0, -2.0));
        let d = cam.position().distance(cam.target());
        assert!((d - DEFAULT_FOLLOW_DISTANCE).abs() < 1e-4);
        assert!(cam.position().y > cam.target().y, "camera sits above the character");
    }

    #[test]
    fn test_rotated_camera_basis() {
        let mut cam = FollowCamera::new();
        cam.rotate(std::f32::consts::FRAC_PI_2);
        let basis = cam.basis();
        assert!((basis.forward - Vec3::X).length() < 1e-4, "yaw +90° looks toward +X");
        assert!((basis.right - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_vertical_view_falls_back() {
        let basis = CameraBasis::from_view_direction(Vec3::NEG_Y);
        assert_eq!(basis.forward, Vec3::NEG_Z);
    }
}
