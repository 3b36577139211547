//! Physics world and fixed-step integration
//!
//! Owns every rigid body behind generational handles, advances them with a
//! fixed timestep and records the contacts produced by each step. Contacts
//! are only *recorded* here; gameplay reacts to them on the following frame,
//! so no body is ever removed while the stepper is iterating.

use super::body::{BodyType, RigidBody, SurfaceMaterial};
use super::collision::collide;
use super::types::{Quat, Vec3};

/// Default gravity (m/s²), slightly heavier than Earth for a snappier feel.
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -12.82, 0.0);

/// Stable reference to a body. Stale handles resolve to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

/// A contact recorded during the last [`PhysicsWorld::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// World-space contact point
    pub point: Vec3,
    /// Unit normal pointing from `body_a` toward `body_b`
    pub normal: Vec3,
    pub depth: f32,
}

impl Contact {
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// The other participant, if `body` is part of this contact.
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }

    /// Normal pushing `body` away from the other participant.
    ///
    /// A body resting on the ground gets `+Y` regardless of pair order.
    pub fn normal_for(&self, body: BodyHandle) -> Option<Vec3> {
        if self.body_b == body {
            Some(self.normal)
        } else if self.body_a == body {
            Some(-self.normal)
        } else {
            None
        }
    }
}

/// Friction and restitution for a pair of surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

/// Stepper tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Velocity solver passes per step
    pub solver_iterations: usize,
    /// Separation below which contacts are still reported (m)
    pub contact_margin: f32,
    /// Fraction of penetration removed per step
    pub position_correction: f32,
    /// Penetration tolerated without correction (m)
    pub position_slop: f32,
    /// Approach speed below which restitution is ignored (m/s)
    pub restitution_threshold: f32,
    pub default_material: ContactMaterial,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            solver_iterations: 4,
            contact_margin: 0.01,
            position_correction: 0.8,
            position_slop: 0.002,
            restitution_threshold: 1.0,
            default_material: ContactMaterial {
                friction: 0.3,
                restitution: 0.0,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    body: Option<RigidBody>,
}

/// Container and stepper for all rigid bodies.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    config: PhysicsConfig,
    slots: Vec<Slot>,
    free: Vec<u32>,
    contacts: Vec<Contact>,
    materials: Vec<((SurfaceMaterial, SurfaceMaterial), ContactMaterial)>,
    live: usize,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            free: Vec::new(),
            contacts: Vec::new(),
            materials: Vec::new(),
            live: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Register a pairwise contact material (order-independent).
    pub fn set_contact_material(
        &mut self,
        a: SurfaceMaterial,
        b: SurfaceMaterial,
        material: ContactMaterial,
    ) {
        self.materials
            .retain(|((x, y), _)| !((*x == a && *y == b) || (*x == b && *y == a)));
        self.materials.push(((a, b), material));
    }

    /// Material for a surface pair, falling back to the default.
    pub fn contact_material(&self, a: SurfaceMaterial, b: SurfaceMaterial) -> ContactMaterial {
        self.materials
            .iter()
            .find(|((x, y), _)| (*x == a && *y == b) || (*x == b && *y == a))
            .map(|(_, m)| *m)
            .unwrap_or(self.config.default_material)
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Remove a body. Stale or repeated removals return `None`.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(body)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn body_count(&self) -> usize {
        self.live
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    /// Apply an impulse to a dynamic body. Returns `false` for stale handles.
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(body) => {
                body.apply_impulse(impulse);
                true
            }
            None => false,
        }
    }

    /// Teleport a body (used for kinematic placement from network state).
    pub fn set_translation(&mut self, handle: BodyHandle, position: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(body) => {
                body.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(body) => {
                body.linear_velocity = velocity;
                true
            }
            None => false,
        }
    }

    /// Contacts produced by the most recent step.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Remove every body and forget recorded contacts.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.contacts.clear();
        self.live = 0;
    }

    // ============================================================
    // Stepping
    // ============================================================

    /// Advance the simulation by `dt` seconds.
    ///
    /// Order: gravity → integrate positions/orientations → detect contacts →
    /// velocity impulses → positional correction → damping.
    pub fn step(&mut self, dt: f32) {
        self.contacts.clear();
        if dt <= 0.0 {
            return;
        }

        let gravity = self.config.gravity;
        for slot in &mut self.slots {
            let Some(body) = slot.body.as_mut() else {
                continue;
            };
            match body.body_type {
                BodyType::Static => continue,
                BodyType::Dynamic => body.linear_velocity += gravity * dt,
                BodyType::Kinematic => {}
            }
            body.position += body.linear_velocity * dt;
            integrate_orientation(body, dt);
        }

        self.detect_contacts();

        for _ in 0..self.config.solver_iterations {
            for i in 0..self.contacts.len() {
                let contact = self.contacts[i];
                self.resolve_velocity(&contact);
            }
        }
        for i in 0..self.contacts.len() {
            let contact = self.contacts[i];
            self.correct_position(&contact);
        }

        for slot in &mut self.slots {
            if let Some(body) = slot.body.as_mut().filter(|b| b.is_dynamic()) {
                body.linear_velocity *= (1.0 - body.linear_damping).clamp(0.0, 1.0).powf(dt);
                body.angular_velocity *= (1.0 - body.angular_damping).clamp(0.0, 1.0).powf(dt);
            }
        }
    }

    fn detect_contacts(&mut self) {
        let margin = self.config.contact_margin;
        for i in 0..self.slots.len() {
            let Some(a) = self.slots[i].body.as_ref() else {
                continue;
            };
            for j in (i + 1)..self.slots.len() {
                let Some(b) = self.slots[j].body.as_ref() else {
                    continue;
                };
                if !a.is_dynamic() && !b.is_dynamic() {
                    continue;
                }
                if !a.filter.allows(&b.filter) {
                    continue;
                }
                let reach = a.shape.bounding_radius() + b.shape.bounding_radius() + margin;
                if reach.is_finite() && a.position.distance_squared(b.position) > reach * reach {
                    continue;
                }
                if let Some(point) = collide(a, b, margin) {
                    self.contacts.push(Contact {
                        body_a: BodyHandle {
                            index: i as u32,
                            generation: self.slots[i].generation,
                        },
                        body_b: BodyHandle {
                            index: j as u32,
                            generation: self.slots[j].generation,
                        },
                        point: point.point,
                        normal: point.normal,
                        depth: point.depth,
                    });
                }
            }
        }
    }

    fn resolve_velocity(&mut self, contact: &Contact) {
        let Some((a, b)) = self.pair(contact.body_a, contact.body_b) else {
            return;
        };
        let inv_sum = a.inv_mass() + b.inv_mass();
        if inv_sum <= 0.0 {
            return;
        }
        let n = contact.normal;
        let relative = b.linear_velocity - a.linear_velocity;
        let approach = relative.dot(n);
        if approach >= 0.0 {
            return;
        }

        let (ma, mb) = (a.material, b.material);
        let material = self.contact_material(ma, mb);
        let restitution = if -approach > self.config.restitution_threshold {
            material.restitution
        } else {
            0.0
        };
        let jn = -(1.0 + restitution) * approach / inv_sum;

        let tangent_velocity = relative - n * approach;
        let tangent_speed = tangent_velocity.length();
        let friction_impulse = if tangent_speed > 1e-6 {
            let jt = (tangent_speed / inv_sum).min(material.friction * jn);
            -tangent_velocity / tangent_speed * jt
        } else {
            Vec3::ZERO
        };

        let impulse = n * jn + friction_impulse;
        if let Some((a, b)) = self.pair_mut(contact.body_a, contact.body_b) {
            a.linear_velocity -= impulse * a.inv_mass();
            b.linear_velocity += impulse * b.inv_mass();
        }
    }

    fn correct_position(&mut self, contact: &Contact) {
        let excess = contact.depth - self.config.position_slop;
        if excess <= 0.0 {
            return;
        }
        let percent = self.config.position_correction;
        let n = contact.normal;
        if let Some((a, b)) = self.pair_mut(contact.body_a, contact.body_b) {
            let inv_sum = a.inv_mass() + b.inv_mass();
            if inv_sum <= 0.0 {
                return;
            }
            let correction = n * (excess * percent / inv_sum);
            a.position -= correction * a.inv_mass();
            b.position += correction * b.inv_mass();
        }
    }

    fn pair(&self, a: BodyHandle, b: BodyHandle) -> Option<(&RigidBody, &RigidBody)> {
        Some((self.get(a)?, self.get(b)?))
    }

    fn pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Option<(&mut RigidBody, &mut RigidBody)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (lo, hi, swapped) = if a.index < b.index {
            (a.index as usize, b.index as usize, false)
        } else {
            (b.index as usize, a.index as usize, true)
        };
        let (left, right) = self.slots.split_at_mut(hi);
        let first = left[lo].body.as_mut()?;
        let second = right[0].body.as_mut()?;
        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }
}

fn integrate_orientation(body: &mut RigidBody, dt: f32) {
    let w = body.angular_velocity;
    if w.length_squared() < 1e-12 {
        return;
    }
    let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * body.orientation;
    let q = body.orientation;
    body.orientation = Quat::from_xyzw(
        q.x + 0.5 * dt * spin.x,
        q.y + 0.5 * dt * spin.y,
        q.z + 0.5 * dt * spin.z,
        q.w + 0.5 * dt * spin.w,
    )
    .normalize();
}
