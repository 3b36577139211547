//! Math types and small helpers shared by physics and gameplay
//!
//! `Vec3`/`Quat` come from glam; the helpers cover the y-up conventions
//! used everywhere else (models face -Z at yaw 0).

pub use glam::{Quat, Vec3};

/// Drop the vertical component.
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Rotation about +Y by `yaw` radians.
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

/// Unit facing direction for a yaw (yaw 0 looks down -Z).
pub fn facing_direction(yaw: f32) -> Vec3 {
    yaw_rotation(yaw) * Vec3::NEG_Z
}

/// Yaw that makes a model look along `dir` (horizontal part only).
pub fn yaw_from_direction(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaw_round_trip_through_direction() {
        for yaw in [0.0_f32, 0.5, 1.5, -2.0, 3.0] {
            let dir = facing_direction(yaw);
            let back = yaw_from_direction(dir);
            assert!(
                (facing_direction(back) - dir).length() < 1e-5,
                "yaw {yaw} should survive a direction round trip"
            );
        }
    }

    #[test]
    fn test_zero_yaw_faces_negative_z() {
        assert!((facing_direction(0.0) - Vec3::NEG_Z).length() < 1e-6);
    }
}
