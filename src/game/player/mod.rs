//! The player entity: capsule body, tunables, and the spawn command.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{
    game::{
        GameLayer,
        animations::AnimationSignals,
        input::PlayerActions,
        locomotion::{LocomotionMode, LocomotionState, TimerBank, slide::SlideEffects},
    },
    screens::Screen,
};

// Standing capsule dimensions.
pub const PLAYER_HEIGHT: f32 = 1.8;
pub const PLAYER_RADIUS: f32 = 0.4;

/// Player marker component.
#[derive(Component)]
pub struct Player;

/// Marker for the child entity carrying the player's capsule collider.
///
/// The collider lives on a child so the slide shape animator can move the
/// capsule center independently of the body transform.
#[derive(Component)]
pub struct ColliderAttachment;

/// Marker for the player's cosmetic mesh child. Optional: locomotion still
/// works without it, the slide visual offset just has nothing to move.
#[derive(Component)]
pub struct VisualModel;

/// Flat numeric tunables for the locomotion controller.
///
/// Supplied once at spawn and treated as immutable for the run's duration.
/// `gravity` and `wall_run_gravity` are negative magnitudes.
#[derive(Component, Debug, Clone, Copy)]
pub struct LocomotionConfig {
    /// Forward speed while running (m/s).
    pub run_speed: f32,
    /// Strafe speed applied to the lateral input axis (m/s).
    pub side_speed: f32,
    /// Forward speed while sliding (m/s).
    pub slide_speed: f32,
    /// Horizontal speed along the wall while wall-running (m/s).
    pub wall_run_speed: f32,
    /// Translation speed of the climb sequencer (m/s).
    pub climb_speed: f32,
    /// Apex height of a ground jump (m).
    pub jump_height: f32,
    /// Gravity while not wall-running (negative, m/s^2).
    pub gravity: f32,
    /// Reduced gravity while wall-running (negative, m/s^2).
    pub wall_run_gravity: f32,
    /// Magnitude of the wall-jump launch velocity (m/s).
    pub wall_jump_force: f32,
    /// Suppression window after a wall-jump (s).
    pub wall_jump_cooldown: f32,
    /// Grace window after leaving the ground during which jump/slide still
    /// count as grounded (s).
    pub coyote_time: f32,
    /// Duration of one slide (s).
    pub slide_duration: f32,
    /// Maximum continuous wall-run duration before a forced stop (s).
    pub max_wall_run_time: f32,
    /// Downward probe reach below the feet (m).
    pub ground_check_distance: f32,
    /// Sideways probe reach for wall detection (m).
    pub wall_check_distance: f32,
    /// Clearance above a climbed wall's top (m).
    pub climb_clearance: f32,
    /// Small negative vertical velocity held while grounded to keep the
    /// capsule pressed against the ground (m/s).
    pub ground_stick_velocity: f32,
    /// Capsule height while sliding (m).
    pub slide_height: f32,
    /// Duration of the capsule height/center interpolation (s).
    pub shape_lerp_duration: f32,
    /// Delay before the cosmetic visual offset starts easing (s).
    pub visual_offset_delay: f32,
    /// Duration of the cosmetic visual offset easing (s).
    pub visual_offset_duration: f32,
    /// Local-space offset of the visual mesh while sliding.
    pub visual_slide_offset: Vec3,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            run_speed: 8.0,
            side_speed: 6.0,
            slide_speed: 12.0,
            wall_run_speed: 7.0,
            climb_speed: 3.0,
            jump_height: 2.0,
            gravity: -19.62,
            wall_run_gravity: -4.0,
            wall_jump_force: 12.0,
            wall_jump_cooldown: 0.4,
            coyote_time: 0.15,
            slide_duration: 1.0,
            max_wall_run_time: 1.5,
            ground_check_distance: 0.3,
            wall_check_distance: 0.8,
            climb_clearance: 0.5,
            ground_stick_velocity: -2.0,
            slide_height: 0.9,
            shape_lerp_duration: 0.1,
            visual_offset_delay: 0.08,
            visual_offset_duration: 0.25,
            visual_slide_offset: Vec3::new(0.0, -0.35, 0.0),
        }
    }
}

/// A configuration problem severe enough to abort the spawn.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("gravity must be a negative magnitude, got {0}")]
    NonNegativeGravity(f32),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("slide height {slide} must be lower than the standing height {standing}")]
    SlideNotLower { slide: f32, standing: f32 },
}

impl LocomotionConfig {
    /// Checks the tunables once at initialization. An invalid config would
    /// produce NaN jump impulses or zero-length climbs, so it is fatal.
    pub fn validate(&self, standing_height: f32) -> Result<(), ConfigError> {
        if self.gravity >= 0.0 {
            return Err(ConfigError::NonNegativeGravity(self.gravity));
        }
        if self.wall_run_gravity >= 0.0 {
            return Err(ConfigError::NonNegativeGravity(self.wall_run_gravity));
        }
        for (name, value) in [
            ("run_speed", self.run_speed),
            ("slide_speed", self.slide_speed),
            ("wall_run_speed", self.wall_run_speed),
            ("climb_speed", self.climb_speed),
            ("jump_height", self.jump_height),
            ("wall_jump_force", self.wall_jump_force),
            ("slide_duration", self.slide_duration),
            ("max_wall_run_time", self.max_wall_run_time),
            ("ground_check_distance", self.ground_check_distance),
            ("wall_check_distance", self.wall_check_distance),
            ("shape_lerp_duration", self.shape_lerp_duration),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.slide_height >= standing_height {
            return Err(ConfigError::SlideNotLower {
                slide: self.slide_height,
                standing: standing_height,
            });
        }
        Ok(())
    }
}

/// The physical capsule's current shape plus the snapshots the slide shape
/// animator interpolates between.
#[derive(Component, Debug, Clone, Copy)]
pub struct CapsuleShape {
    pub radius: f32,
    /// Current full capsule height.
    pub height: f32,
    /// Current vertical offset of the collider from the body origin.
    pub center: f32,
    /// Snapshot taken once at spawn.
    pub original_height: f32,
    pub original_center: f32,
    /// Slide targets. The center drops so the capsule's feet stay planted
    /// while the height shrinks.
    pub slide_height: f32,
    pub slide_center: f32,
}

impl CapsuleShape {
    pub fn new(radius: f32, height: f32, slide_height: f32) -> Self {
        Self {
            radius,
            height,
            center: 0.0,
            original_height: height,
            original_center: 0.0,
            slide_height,
            slide_center: -(height - slide_height) / 2.0,
        }
    }

    /// Builds the avian collider for the current shape. The capsule's
    /// cylindrical segment excludes the two end caps.
    pub fn collider(&self) -> Collider {
        let segment = (self.height - 2.0 * self.radius).max(0.05);
        Collider::capsule(self.radius, segment)
    }

    /// Vertical offset of the capsule's lowest point from the body origin.
    pub fn feet_offset(&self) -> f32 {
        self.center - self.height / 2.0
    }
}

/// Command that spawns the player with the default tunables.
pub struct SpawnPlayer {
    pub position: Vec3,
}

impl Command for SpawnPlayer {
    fn apply(self, world: &mut World) {
        let _ = world.run_system_cached_with(spawn_player, self);
    }
}

fn spawn_player(
    In(spawn): In<SpawnPlayer>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let config = LocomotionConfig::default();
    if let Err(err) = config.validate(PLAYER_HEIGHT) {
        error!("refusing to spawn player: {err}");
        return;
    }
    let shape = CapsuleShape::new(PLAYER_RADIUS, PLAYER_HEIGHT, config.slide_height);

    commands
        .spawn((
            Name::new("Player"),
            Player,
            config,
            shape,
            PlayerActions::default(),
            LocomotionMode::default(),
            LocomotionState::default(),
            TimerBank::default(),
            SlideEffects::default(),
            AnimationSignals::default(),
            DespawnOnExit(Screen::Gameplay),
            Transform::from_translation(spawn.position),
            Visibility::Visible,
        ))
        .insert((
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            // The state machine integrates gravity itself.
            GravityScale(0.0),
            LinearVelocity::default(),
            Friction::new(0.0),
        ))
        .with_children(|parent| {
            parent.spawn((
                Name::new("Capsule Collider"),
                ColliderAttachment,
                shape.collider(),
                Transform::from_xyz(0.0, shape.center, 0.0),
                // Trigger is in the filter so sensor volumes see the capsule
                // enter; Sensor on their side keeps the contact response-free.
                CollisionLayers::new(
                    GameLayer::Player,
                    [
                        GameLayer::Default,
                        GameLayer::World,
                        GameLayer::WallRun,
                        GameLayer::Trigger,
                    ],
                ),
            ));
            parent.spawn((
                Name::new("Visual Model"),
                VisualModel,
                Mesh3d(meshes.add(Capsule3d::new(
                    PLAYER_RADIUS * 0.95,
                    PLAYER_HEIGHT - 2.0 * PLAYER_RADIUS,
                ))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.85, 0.4, 0.2),
                    perceptual_roughness: 0.6,
                    ..default()
                })),
                Transform::default(),
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(LocomotionConfig::default().validate(PLAYER_HEIGHT).is_ok());
    }

    #[test]
    fn positive_gravity_is_rejected() {
        let config = LocomotionConfig {
            gravity: 9.81,
            ..default()
        };
        assert!(matches!(
            config.validate(PLAYER_HEIGHT),
            Err(ConfigError::NonNegativeGravity(_))
        ));
    }

    #[test]
    fn zero_speed_is_rejected_by_name() {
        let config = LocomotionConfig {
            wall_run_speed: 0.0,
            ..default()
        };
        match config.validate(PLAYER_HEIGHT) {
            Err(ConfigError::NonPositive { name, .. }) => assert_eq!(name, "wall_run_speed"),
            other => panic!("expected NonPositive, got {other:?}"),
        }
    }

    #[test]
    fn slide_height_must_shrink_the_capsule() {
        let config = LocomotionConfig {
            slide_height: PLAYER_HEIGHT,
            ..default()
        };
        assert!(matches!(
            config.validate(PLAYER_HEIGHT),
            Err(ConfigError::SlideNotLower { .. })
        ));
    }

    #[test]
    fn slide_center_keeps_the_feet_planted() {
        let shape = CapsuleShape::new(PLAYER_RADIUS, 1.8, 0.9);
        // Feet at -0.9 standing; the slide snapshot lands them there too.
        let standing_feet = shape.center - shape.height / 2.0;
        let slide_feet = shape.slide_center - shape.slide_height / 2.0;
        assert!((standing_feet - slide_feet).abs() < 1e-6);
    }
}
