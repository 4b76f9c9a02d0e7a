//! The title screen that appears on startup.

use bevy::prelude::*;

use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Title), spawn_title_screen);
    app.add_systems(
        Update,
        enter_gameplay_on_confirm.run_if(in_state(Screen::Title)),
    );
}

fn spawn_title_screen(mut commands: Commands) {
    commands.spawn((
        Name::new("Title Screen"),
        DespawnOnExit(Screen::Title),
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            row_gap: Val::Px(16.0),
            ..default()
        },
        children![
            (
                Text::new("Parkour Locomotion"),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ),
            (
                Text::new("A/D strafe - Space jump - C slide\nPress Enter to start"),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::srgb(0.7, 0.7, 0.7)),
            ),
        ],
    ));
}

fn enter_gameplay_on_confirm(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut next_screen: ResMut<NextState<Screen>>,
) {
    if keyboard.just_pressed(KeyCode::Enter) || keyboard.just_pressed(KeyCode::Space) {
        next_screen.set(Screen::Gameplay);
    }
}
