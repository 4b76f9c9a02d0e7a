//! The test level: a gymnasium exercising every locomotion move, plus the
//! out-of-bounds respawn.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{
    game::{
        GameLayer,
        locomotion::{
            LocomotionMode, LocomotionState, LocomotionSystems, TimerBank, climb::Climbable,
        },
        player::{Player, SpawnPlayer},
    },
    screens::Screen,
};

/// Falling below this resets the player to the spawn point.
const KILL_HEIGHT: f32 = -25.0;
const SPAWN_POINT: Vec3 = Vec3::new(0.0, 2.0, 0.0);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), spawn_level);
    app.add_systems(
        FixedUpdate,
        respawn_fallen_players.after(LocomotionSystems),
    );
}

fn spawn_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("spawning gymnasium level");

    let ground_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.3, 0.5, 0.3),
        perceptual_roughness: 0.9,
        ..default()
    });
    let wall_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.7, 0.3, 0.3),
        ..default()
    });
    let platform_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.3, 0.3, 0.7),
        ..default()
    });

    // Ground slab.
    spawn_block(
        &mut commands,
        &mut meshes,
        ground_material,
        Vec3::new(0.0, -0.25, -15.0),
        Vec3::new(60.0, 0.5, 60.0),
        GameLayer::World,
        "Ground",
    );

    // Jump platforms at increasing heights.
    spawn_block(
        &mut commands,
        &mut meshes,
        platform_material.clone(),
        Vec3::new(-6.0, 0.5, -8.0),
        Vec3::new(4.0, 1.0, 4.0),
        GameLayer::World,
        "Low Platform",
    );
    spawn_block(
        &mut commands,
        &mut meshes,
        platform_material.clone(),
        Vec3::new(-6.0, 1.0, -14.0),
        Vec3::new(4.0, 2.0, 4.0),
        GameLayer::World,
        "High Platform",
    );

    // Slide gate: a bar with a gap only the shrunk capsule fits under.
    spawn_block(
        &mut commands,
        &mut meshes,
        wall_material.clone(),
        Vec3::new(0.0, 1.45, -8.0),
        Vec3::new(4.0, 0.5, 1.0),
        GameLayer::World,
        "Slide Gate",
    );

    // Wall-run corridor: two parallel runnable walls.
    for (x, label) in [(-3.0, "Corridor Wall Left"), (3.0, "Corridor Wall Right")] {
        spawn_block(
            &mut commands,
            &mut meshes,
            wall_material.clone(),
            Vec3::new(x, 2.0, -24.0),
            Vec3::new(0.5, 4.0, 12.0),
            GameLayer::WallRun,
            label,
        );
    }

    // Climb wall with its trigger volume in front, leading to a roof deck.
    spawn_block(
        &mut commands,
        &mut meshes,
        wall_material,
        Vec3::new(0.0, 2.0, -36.0),
        Vec3::new(8.0, 4.0, 0.5),
        GameLayer::World,
        "Climb Wall",
    );
    commands.spawn((
        Name::new("Climb Trigger"),
        Climbable,
        Sensor,
        CollisionEventsEnabled,
        Collider::cuboid(8.0, 4.0, 1.0),
        CollisionLayers::new([GameLayer::Trigger], [GameLayer::Player]),
        Transform::from_xyz(0.0, 2.0, -35.2),
        DespawnOnExit(Screen::Gameplay),
    ));
    spawn_block(
        &mut commands,
        &mut meshes,
        platform_material,
        Vec3::new(0.0, 3.75, -40.0),
        Vec3::new(8.0, 0.5, 8.0),
        GameLayer::World,
        "Roof Deck",
    );

    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.0)),
        DespawnOnExit(Screen::Gameplay),
    ));

    commands.queue(SpawnPlayer {
        position: SPAWN_POINT,
    });
}

fn spawn_block(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    material: Handle<StandardMaterial>,
    position: Vec3,
    size: Vec3,
    layer: GameLayer,
    label: &str,
) {
    commands.spawn((
        Name::new(label.to_string()),
        Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
        MeshMaterial3d(material),
        Transform::from_translation(position),
        RigidBody::Static,
        Collider::cuboid(size.x, size.y, size.z),
        CollisionLayers::new([layer], LayerMask::ALL),
        DespawnOnExit(Screen::Gameplay),
    ));
}

/// Resets any player that fell out of the level. Climbing players never fall,
/// so the kinematic swap does not need undoing here.
fn respawn_fallen_players(
    mut players: Query<
        (
            &mut Transform,
            &mut LocomotionMode,
            &mut LocomotionState,
            &mut TimerBank,
            &mut LinearVelocity,
        ),
        With<Player>,
    >,
) {
    for (mut transform, mut mode, mut state, mut timers, mut velocity) in &mut players {
        if transform.translation.y > KILL_HEIGHT {
            continue;
        }
        warn!("player fell out of the level, respawning");
        transform.translation = SPAWN_POINT;
        *mode = LocomotionMode::Airborne;
        *state = LocomotionState::default();
        *timers = TimerBank::default();
        velocity.0 = Vec3::ZERO;
    }
}
