//! Gameplay: the player, its locomotion state machine, and the test level.

mod animations;
mod camera_controller;
mod input;
mod locomotion;
mod player;
mod scene;

use avian3d::prelude::PhysicsLayer;
use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        input::plugin,
        locomotion::plugin,
        animations::plugin,
        scene::plugin,
        camera_controller::plugin,
    ));
}

/// Collision layers used by the locomotion controller.
///
/// Wall probes only consider `WallRun` geometry, the ground probe considers
/// all solid world geometry, and climb volumes live on the `Trigger` layer
/// as sensors.
#[derive(PhysicsLayer, Default, Debug, Clone, Copy)]
pub enum GameLayer {
    #[default]
    Default,
    Player,
    World,
    WallRun,
    Trigger,
}
