//! The parkour locomotion state machine.
//!
//! Runs entirely in `FixedUpdate`. Each step probes the environment, feeds
//! the probe results and the latched input edges into [`advance`], and writes
//! the resulting velocity to the physics body. `advance` itself is a pure
//! function over plain data, so every transition rule is testable without a
//! physics world.

pub mod climb;
pub mod motion;
pub mod probes;
pub mod slide;
pub mod timers;

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::game::{
    GameLayer,
    input::PlayerActions,
    player::{CapsuleShape, LocomotionConfig, Player},
};
use climb::ClimbSegment;
use probes::WallContact;
use slide::{SlideEffects, SlideTarget};

pub use timers::TimerBank;

/// A ground probe hit only counts while the character is not moving upward
/// faster than this, so the first airborne steps of a jump are never
/// re-grounded by a ray that still reaches the floor.
const GROUND_VELOCITY_EPSILON: f32 = 0.1;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        (
            climb::detect_climb_triggers,
            climb::advance_climb,
            locomotion_step,
            slide::step_slide_effects,
        )
            .chain()
            .in_set(LocomotionSystems),
    );
}

/// Label for the fixed-step locomotion chain, for systems that must observe
/// the settled state of a step.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocomotionSystems;

/// The mutually exclusive movement modes. Orthogonal conditions such as an
/// in-flight jump live in [`LocomotionState`] instead, so no mode ever needs
/// a combinatorial variant.
#[derive(Component, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocomotionMode {
    Grounded,
    /// Spawn default. The ground probe settles it on the first step.
    #[default]
    Airborne,
    Sliding,
    WallRunning,
    Climbing,
}

/// Carried velocity and the orthogonal flags the mode enum deliberately
/// leaves out.
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct LocomotionState {
    /// Velocity carried across steps. The vertical component is the
    /// integrated gravity channel; the horizontal components only matter
    /// while wall-running or during a wall-jump launch.
    pub velocity: Vec3,
    /// Set on takeoff, cleared on landing. Blocks repeat jumps while the
    /// ground probe still reaches the floor.
    pub jump_in_progress: bool,
    /// Set by a wall-jump, cleared when its cooldown elapses. While set, the
    /// launch velocity is preserved and walls refuse to stick.
    pub just_wall_jumped: bool,
    /// Which side the current (or last) wall-run's wall is on.
    pub wall_on_right: bool,
}

/// Everything one step of the state machine observes.
pub struct StepContext {
    pub dt: f32,
    /// Raw ground probe result, before the rising-velocity exclusion.
    pub grounded: bool,
    pub walls: WallContact,
    pub jump_pressed: bool,
    pub slide_pressed: bool,
    /// Lateral input axis in [-1, 1].
    pub axis: f32,
    pub forward: Vec3,
    pub right: Vec3,
}

/// What one step decided, for the physics write and the effect triggers.
#[derive(Default, Debug, Clone, Copy)]
pub struct StepOutput {
    pub velocity: Vec3,
    pub jumped: bool,
    pub wall_jumped: bool,
    pub slide_started: bool,
    pub slide_ended: bool,
}

/// Advances the state machine by one fixed step.
///
/// Ordering matters and is fixed: wall-jump resolves before wall-run
/// stickiness so the launch is never overwritten, ground handling resolves
/// before the jump edge so a landing re-arms the jump on the same step, and
/// the slide edge resolves last against the composed velocity.
pub fn advance(
    mode: &mut LocomotionMode,
    state: &mut LocomotionState,
    timers: &mut TimerBank,
    config: &LocomotionConfig,
    ctx: &StepContext,
) -> StepOutput {
    let mut out = StepOutput::default();

    if state.just_wall_jumped && timers.tick_wall_jump_cooldown(ctx.dt, config.wall_jump_cooldown) {
        state.just_wall_jumped = false;
    }

    let grounded = ctx.grounded && state.velocity.y <= GROUND_VELOCITY_EPSILON;

    // Wall-jump: a jump edge while wall-running launches up and away.
    if ctx.jump_pressed && *mode == LocomotionMode::WallRunning && !state.just_wall_jumped {
        let normal = motion::wall_outward_normal(ctx.right, state.wall_on_right);
        state.velocity = motion::wall_jump_velocity(normal, ctx.forward, config.wall_jump_force);
        state.just_wall_jumped = true;
        state.jump_in_progress = true;
        timers.reset_wall_jump_cooldown();
        timers.reset_wall_run();
        *mode = LocomotionMode::Airborne;
        out.wall_jumped = true;
    }

    // Wall-run stickiness: attach on wall contact, unless a wall-jump's
    // suppression window is still open.
    if matches!(*mode, LocomotionMode::Grounded | LocomotionMode::Airborne)
        && !state.just_wall_jumped
        && ctx.walls.any()
    {
        *mode = LocomotionMode::WallRunning;
        state.wall_on_right = ctx.walls.right;
        state.jump_in_progress = false;
        timers.reset_wall_run();
    }

    if *mode == LocomotionMode::WallRunning && !out.wall_jumped {
        let side_contact = if state.wall_on_right {
            ctx.walls.right
        } else {
            ctx.walls.left
        };
        if !side_contact {
            *mode = LocomotionMode::Airborne;
            timers.reset_wall_run();
        } else if timers.tick_wall_run(ctx.dt, config.max_wall_run_time) {
            // Forced stop on the step the budget is exceeded.
            *mode = LocomotionMode::Airborne;
            timers.reset_wall_run();
        } else {
            let normal = motion::wall_outward_normal(ctx.right, state.wall_on_right);
            let along = motion::wall_forward(normal, ctx.forward);
            let vertical =
                motion::integrate_gravity(state.velocity.y, config.wall_run_gravity, ctx.dt);
            state.velocity = along * config.wall_run_speed + Vec3::Y * vertical;
        }
    }

    if grounded {
        if *mode == LocomotionMode::Airborne {
            *mode = LocomotionMode::Grounded;
        }
        timers.reset_coyote(config.coyote_time);
        state.jump_in_progress = false;
    } else {
        timers.tick_coyote(ctx.dt);
        if *mode == LocomotionMode::Grounded {
            *mode = LocomotionMode::Airborne;
        }
    }

    // Ground jump, with the coyote window standing in for the ground.
    if ctx.jump_pressed
        && !out.wall_jumped
        && !state.jump_in_progress
        && (grounded || timers.coyote_active())
    {
        if *mode == LocomotionMode::Sliding {
            out.slide_ended = true;
        }
        *mode = LocomotionMode::Airborne;
        state.velocity.y = motion::jump_impulse(config.jump_height, config.gravity);
        state.jump_in_progress = true;
        timers.consume_coyote();
        out.jumped = true;
    }

    // Gravity. Wall-running integrates its reduced gravity above, and a jump
    // or wall-jump keeps its full launch velocity for this step.
    if *mode != LocomotionMode::WallRunning && !out.jumped && !out.wall_jumped {
        state.velocity.y = motion::integrate_gravity(state.velocity.y, config.gravity, ctx.dt);
        if grounded {
            // Converges to the stick value while grounded, so landing never
            // carries accumulated fall speed into the next ledge drop.
            state.velocity.y = state.velocity.y.max(config.ground_stick_velocity);
        }
    }

    // Compose the step's velocity. Wall-running and a live wall-jump launch
    // own all three axes; everything else is forward speed plus strafe.
    out.velocity = if *mode == LocomotionMode::WallRunning || state.just_wall_jumped {
        state.velocity
    } else {
        let planar = if *mode == LocomotionMode::Sliding {
            config.slide_speed
        } else {
            config.run_speed
        };
        ctx.forward * planar
            + ctx.right * (ctx.axis * config.side_speed)
            + Vec3::Y * state.velocity.y
    };

    // Slide edge and countdown.
    if *mode == LocomotionMode::Sliding {
        if timers.tick_slide(ctx.dt) {
            *mode = if grounded {
                LocomotionMode::Grounded
            } else {
                LocomotionMode::Airborne
            };
            state.velocity.y = config.ground_stick_velocity;
            out.slide_ended = true;
        }
    } else if ctx.slide_pressed
        && matches!(*mode, LocomotionMode::Grounded | LocomotionMode::Airborne)
        && (grounded || timers.coyote_active())
    {
        *mode = LocomotionMode::Sliding;
        timers.arm_slide(config.slide_duration);
        timers.consume_coyote();
        state.velocity.y = config.ground_stick_velocity;
        out.slide_started = true;
    }

    out
}

/// One fixed step for every non-climbing player: probe, advance, write.
fn locomotion_step(
    time: Res<Time>,
    spatial_query: SpatialQuery,
    mut players: Query<
        (
            Entity,
            &Transform,
            &Children,
            &LocomotionConfig,
            &CapsuleShape,
            &mut PlayerActions,
            &mut LocomotionMode,
            &mut LocomotionState,
            &mut TimerBank,
            &mut SlideEffects,
            &mut LinearVelocity,
        ),
        (With<Player>, Without<ClimbSegment>),
    >,
) {
    let dt = time.delta_secs();
    for (
        entity,
        transform,
        children,
        config,
        shape,
        mut actions,
        mut mode,
        mut state,
        mut timers,
        mut effects,
        mut velocity,
    ) in &mut players
    {
        // Probes must not hit the player's own capsule.
        let mut excluded = vec![entity];
        excluded.extend(children.iter());
        let ground_filter = SpatialQueryFilter::from_mask([
            GameLayer::Default,
            GameLayer::World,
            GameLayer::WallRun,
        ])
        .with_excluded_entities(excluded.clone());
        let wall_filter =
            SpatialQueryFilter::from_mask([GameLayer::WallRun]).with_excluded_entities(excluded);

        let ctx = StepContext {
            dt,
            grounded: probes::check_grounded(
                &spatial_query,
                transform,
                shape,
                config.ground_check_distance,
                &ground_filter,
            ),
            walls: probes::check_walls(
                &spatial_query,
                transform,
                config.wall_check_distance,
                &wall_filter,
            ),
            jump_pressed: actions.take_jump(),
            slide_pressed: actions.take_slide(),
            axis: actions.axis,
            forward: transform.forward().as_vec3(),
            right: transform.right().as_vec3(),
        };

        let out = advance(&mut mode, &mut state, &mut timers, config, &ctx);
        velocity.0 = out.velocity;

        if out.jumped {
            debug!("jump, vertical velocity {:.3}", state.velocity.y);
        }
        if out.wall_jumped {
            debug!("wall-jump off the {} wall", if state.wall_on_right { "right" } else { "left" });
        }
        if out.slide_started {
            debug!("slide started");
            effects.request(SlideTarget::Slide);
        }
        if out.slide_ended {
            debug!("slide ended");
            effects.request(SlideTarget::Original);
        }
    }
}
