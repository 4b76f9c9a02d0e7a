//! Development tools for the game. This plugin is only enabled in dev builds.

use avian3d::prelude::{PhysicsDebugPlugin, PhysicsGizmos};
use bevy::{dev_tools::states::log_transitions, prelude::*};

use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(PhysicsDebugPlugin::default());
    // Log `Screen` state transitions.
    app.add_systems(Update, (log_transitions::<Screen>, toggle_physics_debug));
}

fn toggle_physics_debug(keys: Res<ButtonInput<KeyCode>>, mut store: ResMut<GizmoConfigStore>) {
    if keys.just_pressed(KeyCode::F3) {
        let (config, _) = store.config_mut::<PhysicsGizmos>();
        config.enabled = !config.enabled;
        info!(
            "Physics debug rendering: {}",
            if config.enabled { "ON" } else { "OFF" }
        );
    }
}
