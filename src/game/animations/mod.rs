//! Animation signals derived from the settled locomotion state.
//!
//! No animation graph lives here; the component is the read-only surface a
//! rig or sound layer would bind against.

use avian3d::prelude::LinearVelocity;
use bevy::prelude::*;

use crate::game::{
    locomotion::{LocomotionMode, LocomotionState, LocomotionSystems},
    player::Player,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(FixedUpdate, update_signals.after(LocomotionSystems));
}

/// Booleans and a scalar speed describing what the character is doing.
///
/// Climbing overrides everything else: the body is kinematic and its
/// velocity meaningless, so only `is_climbing` is set and `speed` is zero.
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct AnimationSignals {
    pub is_jumping: bool,
    pub is_sliding: bool,
    pub is_climbing: bool,
    /// Horizontal speed in m/s.
    pub speed: f32,
}

fn update_signals(
    mut players: Query<
        (
            &LocomotionMode,
            &LocomotionState,
            &LinearVelocity,
            &mut AnimationSignals,
        ),
        With<Player>,
    >,
) {
    for (mode, state, velocity, mut signals) in &mut players {
        let previous = *signals;
        *signals = match mode {
            LocomotionMode::Climbing => AnimationSignals {
                is_climbing: true,
                ..default()
            },
            _ => AnimationSignals {
                is_jumping: state.jump_in_progress,
                is_sliding: *mode == LocomotionMode::Sliding,
                is_climbing: false,
                speed: velocity.0.with_y(0.0).length(),
            },
        };

        if (signals.is_jumping, signals.is_sliding, signals.is_climbing)
            != (previous.is_jumping, previous.is_sliding, previous.is_climbing)
        {
            debug!(
                "animation signals: jumping={} sliding={} climbing={}",
                signals.is_jumping, signals.is_sliding, signals.is_climbing
            );
        }
    }
}
