//! Rigid body definitions
//!
//! Bodies carry their own shape, mass properties, damping, collision filter
//! and surface material. The [`PhysicsWorld`](super::world::PhysicsWorld)
//! owns them and hands out [`BodyHandle`](super::world::BodyHandle)s.

use std::ops::BitOr;

use super::types::{Quat, Vec3};

/// Collision group bit flags.
///
/// Two bodies collide iff each one's group intersects the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionGroups(u32);

impl CollisionGroups {
    pub const NONE: Self = Self(0);
    pub const GROUND: Self = Self(1);
    pub const BREAKABLE: Self = Self(1 << 1);
    pub const PROJECTILE: Self = Self(1 << 2);
    pub const CHARACTER: Self = Self(1 << 3);
    pub const DEBRIS: Self = Self(1 << 4);
    pub const ALL: Self = Self(u32::MAX);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CollisionGroups {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Membership group plus the set of groups this body is willing to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub group: CollisionGroups,
    pub mask: CollisionGroups,
}

impl CollisionFilter {
    pub const fn new(group: CollisionGroups, mask: CollisionGroups) -> Self {
        Self { group, mask }
    }

    /// Symmetric group/mask test.
    pub fn allows(&self, other: &CollisionFilter) -> bool {
        self.group.intersects(other.mask) && other.group.intersects(self.mask)
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(CollisionGroups::ALL, CollisionGroups::ALL)
    }
}

/// How the stepper treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Affected by gravity, impulses and contacts.
    Dynamic,
    /// Moved only by explicit placement or its own velocity; infinite mass.
    Kinematic,
    /// Never moves.
    Static,
}

/// Collision shape.
///
/// Cuboids collide as axis-aligned boxes; their orientation is integrated
/// for visuals only. `Plane` is the infinite horizontal plane through the
/// body's position with its normal along +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
    Plane,
}

impl Shape {
    /// Cube with the given full edge length.
    pub fn cube(edge: f32) -> Self {
        Shape::Cuboid {
            half_extents: Vec3::splat(edge * 0.5),
        }
    }

    /// Radius of a sphere enclosing the shape (infinite for planes).
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Sphere { radius } => radius,
            Shape::Cuboid { half_extents } => half_extents.length(),
            Shape::Plane => f32::INFINITY,
        }
    }
}

/// Surface tag used to look up pairwise friction/restitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceMaterial {
    #[default]
    Default,
    Ground,
    Character,
}

/// A single simulated body.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub shape: Shape,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Fraction of linear velocity lost per second.
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second.
    pub angular_damping: f32,
    pub filter: CollisionFilter,
    pub material: SurfaceMaterial,
    mass: f32,
    inv_mass: f32,
}

impl RigidBody {
    fn with_type(body_type: BodyType, shape: Shape, mass: f32) -> Self {
        let inv_mass = if body_type == BodyType::Dynamic && mass > 0.0 {
            1.0 / mass
        } else {
            0.0
        };
        Self {
            body_type,
            shape,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.01,
            angular_damping: 0.01,
            filter: CollisionFilter::default(),
            material: SurfaceMaterial::Default,
            mass,
            inv_mass,
        }
    }

    /// Dynamic body. A non-positive mass behaves like an immovable body.
    pub fn dynamic(shape: Shape, mass: f32) -> Self {
        Self::with_type(BodyType::Dynamic, shape, mass)
    }

    pub fn kinematic(shape: Shape) -> Self {
        Self::with_type(BodyType::Kinematic, shape, 0.0)
    }

    /// Static (immovable) body.
    pub fn fixed(shape: Shape) -> Self {
        Self::with_type(BodyType::Static, shape, 0.0)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_filter(mut self, group: CollisionGroups, mask: CollisionGroups) -> Self {
        self.filter = CollisionFilter::new(group, mask);
        self
    }

    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Instantaneous change of momentum. No effect on non-dynamic bodies.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.linear_velocity += impulse * self.inv_mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_is_symmetric() {
        let character = CollisionFilter::new(
            CollisionGroups::CHARACTER,
            CollisionGroups::GROUND | CollisionGroups::PROJECTILE,
        );
        let debris = CollisionFilter::new(CollisionGroups::DEBRIS, CollisionGroups::ALL);
        let projectile =
            CollisionFilter::new(CollisionGroups::PROJECTILE, CollisionGroups::CHARACTER);

        assert!(!character.allows(&debris), "character mask excludes debris");
        assert!(!debris.allows(&character));
        assert!(character.allows(&projectile));
        assert!(projectile.allows(&character));
    }

    #[test]
    fn test_static_body_ignores_impulse() {
        let mut body = RigidBody::fixed(Shape::cube(1.0));
        body.apply_impulse(Vec3::new(0.0, 100.0, 0.0));
        assert_eq!(body.linear_velocity, Vec3::ZERO);
        assert_eq!(body.inv_mass(), 0.0);
    }

    #[test]
    fn test_dynamic_impulse_scales_by_mass() {
        let mut body = RigidBody::dynamic(Shape::Sphere { radius: 0.3 }, 5.0);
        body.apply_impulse(Vec3::new(10.0, 0.0, 0.0));
        assert!((body.linear_velocity.x - 2.0).abs() < 1e-6);
    }
}
