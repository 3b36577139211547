//! Narrow-phase collision detection
//!
//! Pairwise shape tests used by the world stepper. Every test returns a
//! [`ContactPoint`] whose normal points from the first body toward the
//! second. Pairs separated by less than `margin` are still reported with a
//! negative depth so that resting bodies produce a contact every step.
//!
//! Supported pairs: sphere/sphere, sphere/cuboid, cuboid/cuboid and
//! sphere/cuboid against the ground plane. Cuboids are treated as
//! axis-aligned.

use glam::Vec3;

use super::body::{RigidBody, Shape};

/// Result of a shape-pair test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// World-space contact point (on the surface of the second body)
    pub point: Vec3,
    /// Unit normal pointing from the first body toward the second
    pub normal: Vec3,
    /// Penetration depth (negative when inside the margin but not touching)
    pub depth: f32,
}

impl ContactPoint {
    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Test two bodies for contact.
///
/// # Arguments
///
/// * `a` - First body; the returned normal points away from it
/// * `b` - Second body
/// * `margin` - Separation below which a contact is still reported
///
/// # Returns
///
/// `Some(ContactPoint)` when the shapes touch or are within `margin`.
pub fn collide(a: &RigidBody, b: &RigidBody, margin: f32) -> Option<ContactPoint> {
    match (a.shape, b.shape) {
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            sphere_sphere(a.position, ra, b.position, rb, margin)
        }
        (Shape::Sphere { radius }, Shape::Cuboid { half_extents }) => {
            sphere_cuboid(a.position, radius, b.position, half_extents, margin)
        }
        (Shape::Cuboid { half_extents }, Shape::Sphere { radius }) => {
            sphere_cuboid(b.position, radius, a.position, half_extents, margin)
                .map(ContactPoint::flipped)
        }
        (Shape::Cuboid { half_extents: ha }, Shape::Cuboid { half_extents: hb }) => {
            cuboid_cuboid(a.position, ha, b.position, hb, margin)
        }
        (Shape::Plane, other) => plane_shape(a.position.y, b.position, other, margin),
        (other, Shape::Plane) => {
            plane_shape(b.position.y, a.position, other, margin).map(ContactPoint::flipped)
        }
    }
}

fn sphere_sphere(pa: Vec3, ra: f32, pb: Vec3, rb: f32, margin: f32) -> Option<ContactPoint> {
    let delta = pb - pa;
    let dist = delta.length();
    let depth = ra + rb - dist;
    if depth < -margin {
        return None;
    }
    let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
    Some(ContactPoint {
        point: pb - normal * rb,
        normal,
        depth,
    })
}

/// Sphere first, box second.
fn sphere_cuboid(
    sphere: Vec3,
    radius: f32,
    center: Vec3,
    half: Vec3,
    margin: f32,
) -> Option<ContactPoint> {
    let local = sphere - center;
    let clamped = local.clamp(-half, half);

    if clamped != local {
        // Sphere centre outside the box
        let closest = center + clamped;
        let delta = closest - sphere;
        let dist = delta.length();
        let depth = radius - dist;
        if depth < -margin {
            return None;
        }
        let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
        return Some(ContactPoint {
            point: closest,
            normal,
            depth,
        });
    }

    // Centre inside: leave through the nearest face
    let face_dist = half - local.abs();
    let (axis, dist) = min_axis(face_dist);
    let outward = axis * local.dot(axis).signum();
    Some(ContactPoint {
        point: sphere + outward * dist,
        normal: -outward,
        depth: radius + dist,
    })
}

fn cuboid_cuboid(pa: Vec3, ha: Vec3, pb: Vec3, hb: Vec3, margin: f32) -> Option<ContactPoint> {
    let delta = pb - pa;
    let overlap = (ha + hb) - delta.abs();
    if overlap.min_element() < -margin {
        return None;
    }
    let (axis, depth) = min_axis(overlap);
    let sign = if delta.dot(axis) < 0.0 { -1.0 } else { 1.0 };
    let normal = axis * sign;
    // Midpoint of the overlapping region projected onto b's face
    let lo = (pa - ha).max(pb - hb);
    let hi = (pa + ha).min(pb + hb);
    let mut point = (lo + hi) * 0.5;
    let face = pb - normal * hb;
    point = point * (Vec3::ONE - axis) + face * axis;
    Some(ContactPoint {
        point,
        normal,
        depth,
    })
}

/// Ground plane first, shape second.
fn plane_shape(plane_y: f32, pos: Vec3, shape: Shape, margin: f32) -> Option<ContactPoint> {
    let extent = match shape {
        Shape::Sphere { radius } => radius,
        Shape::Cuboid { half_extents } => half_extents.y,
        Shape::Plane => return None,
    };
    let depth = plane_y - (pos.y - extent);
    if depth < -margin {
        return None;
    }
    Some(ContactPoint {
        point: Vec3::new(pos.x, plane_y, pos.z),
        normal: Vec3::Y,
        depth,
    })
}

fn min_axis(v: Vec3) -> (Vec3, f32) {
    if v.x <= v.y && v.x <= v.z {
        (Vec3::X, v.x)
    } else if v.y <= v.z {
        (Vec3::Y, v.y)
    } else {
        (Vec3::Z, v.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(pos: Vec3, radius: f32) -> RigidBody {
        RigidBody::dynamic(Shape::Sphere { radius }, 1.0).with_position(pos)
    }

    fn cube(pos: Vec3, edge: f32) -> RigidBody {
        RigidBody::dynamic(Shape::cube(edge), 1.0).with_position(pos)
    }

    #[test]
    fn test_sphere_sphere_normal_points_a_to_b() {
        let a = sphere(Vec3::ZERO, 0.5);
        let b = sphere(Vec3::new(0.8, 0.0, 0.0), 0.5);
        let c = collide(&a, &b, 0.0).expect("overlapping spheres");
        assert!((c.normal - Vec3::X).length() < 1e-5);
        assert!((c.depth - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_separated_spheres_no_contact() {
        let a = sphere(Vec3::ZERO, 0.5);
        let b = sphere(Vec3::new(2.0, 0.0, 0.0), 0.5);
        assert!(collide(&a, &b, 0.01).is_none());
    }

    #[test]
    fn test_sphere_against_box_face() {
        let ball = sphere(Vec3::new(0.0, 1.0, -0.8), 0.3);
        let target = cube(Vec3::new(0.0, 1.0, -2.0), 2.0);
        let c = collide(&ball, &target, 0.0).expect("ball touches the front face");
        assert!((c.normal - Vec3::NEG_Z).length() < 1e-5);
        assert!((c.point.z + 1.0).abs() < 1e-5, "contact on the z = -1 face");

        let flipped = collide(&target, &ball, 0.0).expect("same pair reversed");
        assert!((flipped.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_centre_inside_box() {
        let ball = sphere(Vec3::new(0.0, 0.0, 0.9), 0.25);
        let block = cube(Vec3::ZERO, 2.0);
        let c = collide(&ball, &block, 0.0).expect("embedded sphere");
        // Box is pushed away from the sphere, i.e. toward -Z
        assert!((c.normal - Vec3::NEG_Z).length() < 1e-5);
        assert!((c.depth - 0.35).abs() < 1e-5);
    }

    #[test]
    fn test_resting_sphere_on_plane_within_margin() {
        let ground = RigidBody::fixed(Shape::Plane);
        let ball = sphere(Vec3::new(3.0, 0.505, 1.0), 0.5);
        let c = collide(&ground, &ball, 0.01).expect("within margin");
        assert_eq!(c.normal, Vec3::Y);
        assert!(c.depth < 0.0);

        let reversed = collide(&ball, &ground, 0.01).expect("reversed order");
        assert_eq!(reversed.normal, Vec3::NEG_Y);
    }

    #[test]
    fn test_box_box_min_axis() {
        let a = cube(Vec3::ZERO, 1.0);
        let b = cube(Vec3::new(0.0, 0.9, 0.2), 1.0);
        let c = collide(&a, &b, 0.0).expect("stacked boxes overlap");
        assert_eq!(c.normal, Vec3::Y);
        assert!((c.depth - 0.1).abs() < 1e-5);
    }
}
