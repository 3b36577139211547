//! Pressure button and the cubes it spawns.
//!
//! Stepping on the button presses it for a short moment, then it stays
//! disarmed for a number of frames. Every local press adds one static cube
//! on a ring around the button; cubes replayed from peers stack on top of
//! whatever prop already occupies their column.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use tracing::debug;

use crate::game::config::{ButtonConfig, VisualConfig};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::pending::{DeferredTask, PendingQueue};
use crate::game::state::SimWorld;
use crate::net::CubePayload;
use crate::physics::{CollisionGroups, RigidBody, Shape, SurfaceMaterial};
use crate::render::{NodeDesc, NodeKind};
use crate::time::Millis;

/// Edge length of a spawned cube.
pub const CUBE_SIZE: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
struct Button {
    entity: EntityId,
    pressed: bool,
    /// Frames left before the button can be pressed again
    rearm: u32,
}

#[derive(Debug, Clone, Copy)]
struct Cube {
    entity: EntityId,
    position: Vec3,
    /// Current visual y-scale while growing
    grow: Option<f32>,
}

/// Owns the button and all spawned cubes.
pub struct PropSystem {
    config: ButtonConfig,
    visual: VisualConfig,
    button: Option<Button>,
    cubes: Vec<Cube>,
}

impl PropSystem {
    pub fn new(config: ButtonConfig, visual: VisualConfig) -> Self {
        Self {
            config,
            visual,
            button: None,
            cubes: Vec::new(),
        }
    }

    /// Place the static button body and its visual.
    pub fn spawn_button(&mut self, world: &mut SimWorld) -> EntityId {
        let half = Vec3::new(self.config.radius, self.config.height * 0.5, self.config.radius);
        let body = RigidBody::fixed(Shape::Cuboid { half_extents: half })
            .with_position(self.config.position)
            .with_filter(CollisionGroups::GROUND, CollisionGroups::ALL)
            .with_material(SurfaceMaterial::Ground);
        let node = NodeDesc::new(NodeKind::Cylinder {
            radius: self.config.radius,
            height: self.config.height,
        })
        .at(self.config.position)
        .colored(self.visual.button_color);

        let (entity, _) = world.spawn(EntityKind::Button, body, Some(node));
        self.button = Some(Button {
            entity,
            pressed: false,
            rearm: 0,
        });
        entity
    }

    /// Per-frame check for a character standing on the button.
    ///
    /// Also counts down the re-arm frames. Returns `true` on a new press.
    pub fn detect_press(&mut self, character: Vec3) -> bool {
        let Some(button) = self.button.as_mut() else {
            return false;
        };
        let center = self.config.position;
        let dist_xz = Vec3::new(character.x - center.x, 0.0, character.z - center.z).length();
        let above = (character.y - (center.y + 0.5)).abs() < self.config.trigger_height;

        let pressed = dist_xz < self.config.radius && above && !button.pressed && button.rearm == 0;
        button.rearm = button.rearm.saturating_sub(1);
        pressed
    }

    /// Push the button down and schedule its release.
    ///
    /// Returns `false` if it is already down.
    pub fn press(&mut self, world: &mut SimWorld, now: Millis, queue: &mut PendingQueue) -> bool {
        let Some(button) = self.button.as_mut() else {
            return false;
        };
        if button.pressed {
            return false;
        }
        button.pressed = true;
        self.set_button_scale(world, self.visual.button_pressed_scale);
        queue.schedule(now + self.config.release_ms, DeferredTask::ReleaseButton);
        true
    }

    /// Pop the button back up and start the re-arm countdown.
    pub fn release(&mut self, world: &mut SimWorld) {
        let Some(button) = self.button.as_mut() else {
            return;
        };
        button.pressed = false;
        button.rearm = self.config.rearm_frames;
        self.set_button_scale(world, 1.0);
    }

    fn set_button_scale(&self, world: &mut SimWorld, y: f32) {
        let visual = self
            .button
            .and_then(|b| world.entities.get(b.entity))
            .and_then(|r| r.visual);
        if let Some(visual) = visual {
            world.scene.set_scale(visual, Vec3::new(1.0, y, 1.0));
        }
    }

    /// Pick a free spot on the ring around the button.
    ///
    /// Falls back to the last candidate when every attempt collides.
    pub fn choose_cube_spot(&self, rng: &mut impl Rng) -> CubePayload {
        let center = self.config.position;
        let mut candidate = self.ring_point(rng, center);

        for _ in 0..self.config.cube_placement_attempts {
            if self.spot_is_free(candidate, center) {
                break;
            }
            candidate = self.ring_point(rng, center);
        }
        CubePayload {
            x: candidate.x,
            z: candidate.z,
        }
    }

    fn ring_point(&self, rng: &mut impl Rng, center: Vec3) -> Vec3 {
        let angle = rng.random::<f32>() * TAU;
        let span = self.config.cube_ring_max - self.config.cube_ring_min;
        let distance = self.config.cube_ring_min + rng.random::<f32>() * span;
        Vec3::new(
            center.x + angle.cos() * distance,
            0.0,
            center.z + angle.sin() * distance,
        )
    }

    fn spot_is_free(&self, spot: Vec3, button: Vec3) -> bool {
        let near = |p: Vec3, limit: f32| (p.x - spot.x).abs() < limit && (p.z - spot.z).abs() < limit;
        let keep_out = self.config.cube_keep_out;
        !self
            .cubes
            .iter()
            .any(|c| near(c.position, self.config.cube_clearance))
            && !near(button, keep_out)
            && !near(Vec3::ZERO, keep_out)
    }

    /// Add a static cube at `(x, z)`, stacked on top of any prop in that column.
    pub fn add_cube(&mut self, world: &mut SimWorld, spot: CubePayload) -> EntityId {
        let tolerance = self.config.stack_tolerance;
        let top = self
            .cubes
            .iter()
            .filter(|c| (c.position.x - spot.x).abs() < tolerance && (c.position.z - spot.z).abs() < tolerance)
            .map(|c| c.position.y)
            .fold(None, |acc: Option<f32>, y| Some(acc.map_or(y, |a| a.max(y))));
        let y = match top {
            Some(top) => top + CUBE_SIZE,
            None => CUBE_SIZE * 0.5,
        };
        let position = Vec3::new(spot.x, y, spot.z);

        let body = RigidBody::fixed(Shape::cube(CUBE_SIZE))
            .with_position(position)
            .with_filter(CollisionGroups::GROUND, CollisionGroups::ALL)
            .with_material(SurfaceMaterial::Ground);
        let start = self.visual.cube_grow_start;
        let node = NodeDesc::new(NodeKind::Cuboid {
            size: Vec3::splat(CUBE_SIZE),
        })
        .at(position)
        .scaled(Vec3::new(1.0, start, 1.0))
        .colored(self.visual.cube_color);

        let (entity, _) = world.spawn(EntityKind::StaticProp, body, Some(node));
        self.cubes.push(Cube {
            entity,
            position,
            grow: Some(start),
        });
        debug!(x = spot.x, y, z = spot.z, "cube added");
        entity
    }

    /// Advance the grow-out-of-the-ground animation by one frame.
    pub fn animate(&mut self, world: &mut SimWorld) {
        let step = self.visual.cube_grow_step;
        for cube in &mut self.cubes {
            let Some(scale) = cube.grow else {
                continue;
            };
            let next = scale + step;
            let (scale, done) = if next >= 1.0 { (1.0, true) } else { (next, false) };
            cube.grow = (!done).then_some(scale);
            if let Some(visual) = world.entities.get(cube.entity).and_then(|r| r.visual) {
                world.scene.set_scale(visual, Vec3::new(1.0, scale, 1.0));
            }
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.button.is_some_and(|b| b.pressed)
    }

    pub fn cube_count(&self) -> usize {
        self.cubes.len()
    }

    pub fn cube_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.cubes.iter().map(|c| c.position)
    }

    pub fn clear(&mut self, world: &mut SimWorld) {
        for cube in self.cubes.drain(..) {
            world.despawn(cube.entity);
        }
        if let Some(button) = self.button.take() {
            world.despawn(button.entity);
        }
    }
}
