//! Debris generation
//!
//! Turns a broken target into a burst of small fragments. Planning is a
//! pure function of the RNG so the system can spawn bodies afterwards.

use glam::Vec3;
use rand::Rng;

use super::config::DestructionConfig;

/// Visual shape of a fragment. Both collide as cubes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentShape {
    Tetrahedron,
    Cube,
}

/// One planned debris fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebrisFragment {
    pub position: Vec3,
    pub shape: FragmentShape,
    /// Edge length
    pub size: f32,
    /// Impulse applied right after spawning
    pub impulse: Vec3,
    pub angular_velocity: Vec3,
}

/// Edge length of a fragment for a target of `target_size`.
pub fn fragment_size(target_size: f32) -> f32 {
    target_size / 6.0
}

/// Plan the debris burst for a target centred at `center` hit at `impact`.
///
/// Fragments scatter within ±2 fragment edges of the centre and are pushed
/// away from the impact point with an extra upward kick.
pub fn plan_debris(
    rng: &mut impl Rng,
    center: Vec3,
    impact: Vec3,
    config: &DestructionConfig,
) -> Vec<DebrisFragment> {
    let size = fragment_size(config.target_size);
    let mut fragments = Vec::with_capacity(config.debris_count);

    for _ in 0..config.debris_count {
        let offset = Vec3::new(
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
        ) * (size * 4.0);
        let position = center + offset;

        let shape = if rng.random_bool(0.5) {
            FragmentShape::Tetrahedron
        } else {
            FragmentShape::Cube
        };

        let away = (position - impact).try_normalize().unwrap_or(Vec3::Y);
        let mut impulse = away * config.explosion_force;
        impulse.y += config.upward_impulse + rng.random::<f32>() * config.upward_jitter;

        let angular_velocity = Vec3::new(
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
        ) * config.spin;

        fragments.push(DebrisFragment {
            position,
            shape,
            size,
            impulse,
            angular_velocity,
        });
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::LabConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_plan_debris_count_and_bounds() {
        let config = LabConfig::default().destruction;
        let mut rng = StdRng::seed_from_u64(3);
        let center = Vec3::new(0.0, 1.0, -2.0);
        let fragments = plan_debris(&mut rng, center, Vec3::new(0.0, 1.0, -1.0), &config);

        assert_eq!(fragments.len(), 20);
        let size = fragment_size(config.target_size);
        for f in &fragments {
            let d = (f.position - center).abs();
            assert!(d.max_element() <= size * 2.0 + 1e-5, "fragment too far: {d:?}");
            assert!(f.impulse.y >= config.upward_impulse - config.explosion_force);
            assert!(f.angular_velocity.abs().max_element() <= config.spin * 0.5 + 1e-5);
        }
    }

    #[test]
    fn test_debris_pushed_away_from_impact() {
        let config = LabConfig::default().destruction;
        let mut rng = StdRng::seed_from_u64(11);
        let center = Vec3::ZERO;
        let impact = Vec3::new(0.0, 0.0, 5.0);
        let fragments = plan_debris(&mut rng, center, impact, &config);
        for f in fragments {
            assert!(f.impulse.z < 0.0, "impact at +z pushes fragments toward -z");
        }
    }
}
