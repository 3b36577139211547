//! Visual Configuration
//!
//! How simulated entities are presented: colours, label placement, the
//! feet offset for character models and animation playback speed. Nothing
//! here affects the simulation.

use glam::Vec3;

/// Presentation settings for the lab scene.
#[derive(Clone, Debug)]
pub struct VisualConfig {
    /// Offset from a character body's centre to its model origin (feet)
    pub character_offset: Vec3,
    /// Height of the floating name label above a remote character
    pub label_height: f32,
    /// Animation mixer playback speed
    pub animation_time_scale: f32,

    // Colours (linear RGB)
    pub ground_color: [f32; 3],
    pub projectile_color: [f32; 3],
    pub target_color: [f32; 3],
    pub debris_color: [f32; 3],
    pub button_color: [f32; 3],
    pub cube_color: [f32; 3],

    /// Initial y-scale of a freshly spawned cube
    pub cube_grow_start: f32,
    /// y-scale added per frame until the cube reaches full height
    pub cube_grow_step: f32,
    /// y-scale of a pressed button
    pub button_pressed_scale: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            character_offset: Vec3::new(0.0, -0.5, 0.0),
            label_height: 2.0,
            animation_time_scale: 1.5,
            ground_color: [0.53, 0.81, 0.92],
            projectile_color: [1.0, 0.0, 0.0],
            target_color: [0.0, 1.0, 0.0],
            debris_color: [0.0, 1.0, 0.0],
            button_color: [1.0, 0.0, 0.0],
            cube_color: [0.8, 0.6, 0.4],
            cube_grow_start: 0.1,
            cube_grow_step: 0.1,
            button_pressed_scale: 0.5,
        }
    }
}
