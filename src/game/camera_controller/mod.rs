//! Chase camera: follows the player from behind with exponential smoothing.

use bevy::prelude::*;

use crate::{game::player::Player, screens::Screen};

/// Camera position relative to the player, in the player's local frame.
const FOLLOW_OFFSET: Vec3 = Vec3::new(0.0, 3.0, 7.0);
/// Aim point above the player's feet.
const LOOK_HEIGHT: f32 = 1.2;
/// Smoothing rate; higher snaps faster.
const FOLLOW_RATE: f32 = 5.0;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        follow_player.run_if(in_state(Screen::Gameplay)),
    );
}

fn follow_player(
    time: Res<Time>,
    players: Query<&Transform, With<Player>>,
    mut cameras: Query<&mut Transform, (With<Camera3d>, Without<Player>)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let target = player.translation + player.rotation * FOLLOW_OFFSET;
    // Framerate-independent exponential approach.
    let alpha = 1.0 - (-FOLLOW_RATE * time.delta_secs()).exp();

    for mut camera in &mut cameras {
        camera.translation = camera.translation.lerp(target, alpha);
        camera.look_at(player.translation + Vec3::Y * LOOK_HEIGHT, Vec3::Y);
    }
}
