//! Records keyboard input into abstract per-player actions.

use bevy::prelude::*;

use crate::AppSystems;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        record_player_actions.in_set(AppSystems::RecordInput),
    );
}

/// Abstract actions consumed by the locomotion state machine.
///
/// `jump_pressed` and `slide_pressed` are edge-triggered: latched here on the
/// frame the key goes down and cleared by the fixed-step consumer, so each
/// physical press produces exactly one reaction regardless of the ratio of
/// render frames to simulation steps.
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct PlayerActions {
    pub jump_pressed: bool,
    pub slide_pressed: bool,
    /// Continuous strafe axis in [-1, 1] (positive = character right).
    pub axis: f32,
}

impl PlayerActions {
    /// Consume the latched jump edge.
    pub fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_pressed)
    }

    /// Consume the latched slide edge.
    pub fn take_slide(&mut self) -> bool {
        std::mem::take(&mut self.slide_pressed)
    }
}

fn record_player_actions(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut PlayerActions>,
) {
    for mut actions in &mut query {
        if keyboard.just_pressed(KeyCode::Space) {
            actions.jump_pressed = true;
        }
        if keyboard.just_pressed(KeyCode::KeyC) || keyboard.just_pressed(KeyCode::ControlLeft) {
            actions.slide_pressed = true;
        }

        let mut axis = 0.0;
        if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
            axis -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
            axis += 1.0;
        }
        actions.axis = axis;
    }
}
