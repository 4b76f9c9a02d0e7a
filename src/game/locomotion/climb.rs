//! Climb sequencer: a one-shot timed translation from the trigger position
//! to the top of a climbable volume.
//!
//! While a climb is active the rigid body is kinematic, so the collision-
//! aware move primitive is out of the loop and the transform is driven
//! directly. The segment is non-interruptible: everything it needs is
//! recorded at trigger time.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::game::{
    input::PlayerActions,
    locomotion::{
        LocomotionMode, LocomotionState, TimerBank,
        slide::{SlideEffects, SlideTarget},
    },
    player::{ColliderAttachment, LocomotionConfig, Player},
};

/// Marker for sensor volumes that start a climb. The tag may sit on the
/// volume itself or on its parent.
#[derive(Component, Debug, Clone, Copy)]
pub struct Climbable;

/// One climb's recorded segment: start and end in world space, and the
/// duration derived from the climb speed.
#[derive(Component, Debug, Clone, Copy)]
pub struct ClimbSegment {
    start: Vec3,
    end: Vec3,
    duration: f32,
    elapsed: f32,
}

impl ClimbSegment {
    /// Records a segment from the character's current position to a point
    /// directly above it, `clearance` over the climbed volume's top. X and Z
    /// are preserved so the climb never teleports sideways.
    pub fn new(start: Vec3, wall_top: f32, clearance: f32, climb_speed: f32) -> Self {
        let end = Vec3::new(start.x, wall_top + clearance, start.z);
        let duration = start.distance(end) / climb_speed.max(f32::EPSILON);
        Self {
            start,
            end,
            duration,
            elapsed: 0.0,
        }
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Advances the translation by `dt`. The final sample snaps to the exact
    /// end position.
    pub fn step(&mut self, dt: f32) -> (Vec3, bool) {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            (self.end, true)
        } else {
            (self.start.lerp(self.end, self.elapsed / self.duration), false)
        }
    }
}

/// Puts the state machine into `Climbing`. An active slide is unwound first
/// (the shape restore is requested and its countdown disarmed), an active
/// wall-run budget is reset, and any latched input edges are discarded so a
/// press from before the climb cannot fire after it.
fn begin_climb(
    mode: &mut LocomotionMode,
    state: &mut LocomotionState,
    timers: &mut TimerBank,
    effects: &mut SlideEffects,
    actions: &mut PlayerActions,
) {
    if *mode == LocomotionMode::Sliding {
        timers.cancel_slide();
        effects.request(SlideTarget::Original);
    }
    actions.take_jump();
    actions.take_slide();
    *mode = LocomotionMode::Climbing;
    timers.reset_wall_run();
    state.velocity = Vec3::ZERO;
}

/// Starts a climb when the player's capsule *enters* a climbable sensor
/// volume. Entry is edge-triggered via collision start messages, so one
/// continuous overlap yields exactly one climb; staying inside the volume
/// after the segment completes does not retrigger it.
///
/// Climb pre-empts every other mode, including an active wall-run or slide.
pub(super) fn detect_climb_triggers(
    mut commands: Commands,
    mut collisions: MessageReader<CollisionStart>,
    mut players: Query<
        (
            &Transform,
            &LocomotionConfig,
            &mut PlayerActions,
            &mut LocomotionMode,
            &mut LocomotionState,
            &mut TimerBank,
            &mut SlideEffects,
            &mut LinearVelocity,
        ),
        (With<Player>, Without<ClimbSegment>),
    >,
    attachments: Query<&ChildOf, With<ColliderAttachment>>,
    climbables: Query<(), With<Climbable>>,
    parents: Query<&ChildOf>,
    aabbs: Query<&ColliderAabb>,
) {
    for event in collisions.read() {
        // The capsule collider lives on a child; resolve the pair into the
        // owning player and the volume it entered.
        let (body, volume) = if let Ok(child_of) = attachments.get(event.collider1) {
            (child_of.parent(), event.collider2)
        } else if let Ok(child_of) = attachments.get(event.collider2) {
            (child_of.parent(), event.collider1)
        } else {
            continue;
        };

        let tagged = climbables.contains(volume)
            || parents
                .get(volume)
                .is_ok_and(|child_of| climbables.contains(child_of.parent()));
        if !tagged {
            continue;
        }

        let Ok((
            transform,
            config,
            mut actions,
            mut mode,
            mut state,
            mut timers,
            mut effects,
            mut velocity,
        )) = players.get_mut(body)
        else {
            continue;
        };

        // A climbable without a bounding volume has no top to climb to.
        let Ok(aabb) = aabbs.get(volume) else {
            warn!("climbable volume {volume} has no collider AABB, ignoring climb trigger");
            continue;
        };

        let segment = ClimbSegment::new(
            transform.translation,
            aabb.max.y,
            config.climb_clearance,
            config.climb_speed,
        );
        info!(
            "starting climb to {} over {:.2}s",
            segment.end(),
            segment.duration()
        );

        begin_climb(&mut mode, &mut state, &mut timers, &mut effects, &mut actions);
        velocity.0 = Vec3::ZERO;
        // Kinematic body: direct transform control, collision-aware
        // movement disabled until the climb completes.
        commands.entity(body).insert((segment, RigidBody::Kinematic));
    }
}

/// Advances active climbs. Runs before the locomotion step, which skips
/// climbing players entirely; input edges latched mid-climb are discarded
/// here so they cannot fire on the first step after the climb.
pub(super) fn advance_climb(
    mut commands: Commands,
    time: Res<Time>,
    mut players: Query<
        (
            Entity,
            &mut Transform,
            &mut ClimbSegment,
            &mut LocomotionMode,
            &mut PlayerActions,
            &mut LinearVelocity,
        ),
        With<Player>,
    >,
) {
    let dt = time.delta_secs();
    for (entity, mut transform, mut segment, mut mode, mut actions, mut velocity) in &mut players {
        actions.take_jump();
        actions.take_slide();
        velocity.0 = Vec3::ZERO;
        let (position, done) = segment.step(dt);
        transform.translation = position;

        if done {
            // The ground probe settles Grounded/Airborne next step.
            *mode = LocomotionMode::Airborne;
            commands
                .entity(entity)
                .remove::<ClimbSegment>()
                .insert(RigidBody::Dynamic);
            debug!("climb finished at {position}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::{CapsuleShape, PLAYER_HEIGHT, PLAYER_RADIUS};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn end_position_is_wall_top_plus_clearance() {
        let start = Vec3::new(3.0, 1.0, -2.0);
        let segment = ClimbSegment::new(start, 4.0, 0.5, 3.0);
        assert_eq!(segment.end(), Vec3::new(3.0, 4.5, -2.0));
    }

    #[test]
    fn duration_is_distance_over_speed() {
        let start = Vec3::new(0.0, 1.0, 0.0);
        let segment = ClimbSegment::new(start, 4.0, 0.5, 3.5);
        // Distance 3.5 at speed 3.5 takes one second.
        assert!((segment.duration() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn translation_is_linear_and_snaps_to_the_exact_end() {
        let start = Vec3::new(1.0, 0.0, 1.0);
        let mut segment = ClimbSegment::new(start, 2.5, 0.5, 3.0);
        let duration = segment.duration();

        let (halfway, done) = segment.step(duration / 2.0);
        assert!(!done);
        assert!((halfway.y - 1.5).abs() < 1e-4);
        assert_eq!(halfway.x, 1.0);
        assert_eq!(halfway.z, 1.0);

        let (end, done) = segment.step(duration);
        assert!(done);
        assert_eq!(end, segment.end());
    }

    #[test]
    fn zero_distance_climb_completes_on_the_first_step() {
        // Already above the wall top: the segment has zero length.
        let start = Vec3::new(0.0, 4.5, 0.0);
        let mut segment = ClimbSegment::new(start, 4.0, 0.5, 3.0);
        let (position, done) = segment.step(DT);
        assert!(done);
        assert_eq!(position, start);
    }

    #[test]
    fn progress_is_monotonic_in_height() {
        let mut segment = ClimbSegment::new(Vec3::ZERO, 5.0, 0.5, 3.0);
        let mut last_y = 0.0;
        loop {
            let (position, done) = segment.step(DT);
            assert!(position.y >= last_y);
            last_y = position.y;
            if done {
                break;
            }
        }
        assert_eq!(last_y, 5.5);
    }

    #[test]
    fn climb_entry_unwinds_an_active_slide() {
        let mut mode = LocomotionMode::Sliding;
        let mut state = LocomotionState {
            velocity: Vec3::new(0.0, -2.0, -12.0),
            ..default()
        };
        let mut timers = TimerBank::default();
        timers.arm_slide(1.0);
        let mut effects = SlideEffects::default();
        effects.request(SlideTarget::Slide);
        let mut actions = PlayerActions::default();

        begin_climb(&mut mode, &mut state, &mut timers, &mut effects, &mut actions);

        assert_eq!(mode, LocomotionMode::Climbing);
        assert_eq!(state.velocity, Vec3::ZERO);
        // The capsule restore supersedes the in-flight slide shrink, and the
        // countdown is disarmed so it cannot fire after the climb.
        assert_eq!(effects.pending_target(), Some(SlideTarget::Original));
        assert!(timers.tick_slide(DT));
    }

    #[test]
    fn climb_entry_discards_latched_input_edges() {
        let mut mode = LocomotionMode::Grounded;
        let mut state = LocomotionState::default();
        let mut timers = TimerBank::default();
        let mut effects = SlideEffects::default();
        let mut actions = PlayerActions {
            jump_pressed: true,
            slide_pressed: true,
            axis: 0.0,
        };

        begin_climb(&mut mode, &mut state, &mut timers, &mut effects, &mut actions);

        assert!(!actions.take_jump());
        assert!(!actions.take_slide());
        // Not sliding, so no restore is requested.
        assert_eq!(effects.pending_target(), None);
    }

    #[test]
    fn one_overlap_entry_yields_exactly_one_climb() {
        let mut app = App::new();
        app.add_message::<CollisionStart>();
        app.add_systems(Update, detect_climb_triggers);

        let volume = app
            .world_mut()
            .spawn((
                Climbable,
                ColliderAabb {
                    min: Vec3::new(-4.0, 0.0, -1.0),
                    max: Vec3::new(4.0, 4.0, 0.0),
                },
            ))
            .id();
        let config = LocomotionConfig::default();
        let body = app
            .world_mut()
            .spawn((
                Player,
                Transform::from_xyz(0.0, 0.9, -0.5),
                config,
                CapsuleShape::new(PLAYER_RADIUS, PLAYER_HEIGHT, config.slide_height),
                PlayerActions::default(),
                LocomotionMode::Grounded,
                LocomotionState::default(),
                TimerBank::default(),
                SlideEffects::default(),
                LinearVelocity::default(),
            ))
            .id();
        let capsule = app.world_mut().spawn((ColliderAttachment, ChildOf(body))).id();

        // One physical entry produces one start message and one climb.
        app.world_mut().write_message(CollisionStart {
            collider1: capsule,
            collider2: volume,
            body1: Some(body),
            body2: None,
        });
        app.update();
        assert!(app.world().get::<ClimbSegment>(body).is_some());

        // The overlap persists but no new entry occurs: after the climb
        // completes, repeated updates must not start another one.
        app.world_mut().entity_mut(body).remove::<ClimbSegment>();
        for _ in 0..10 {
            app.update();
            assert!(app.world().get::<ClimbSegment>(body).is_none());
        }
    }
}
