// Top-down player avatar with keyboard movement.
use bevy::prelude::*;

use crate::LadderSet;
use crate::config::LadderConfig;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player)
            .add_systems(Update, player_movement.in_set(LadderSet::Presence));
    }
}

#[derive(Component)]
pub struct Player;

/// Movement is blocked while a stage transition runs or while the player is
/// focused on a minigame. The two locks are independent.
#[derive(Component, Default, Debug)]
pub struct PlayerControl {
    pub transition_lock: bool,
    pub focus_lock: bool,
}

impl PlayerControl {
    pub fn can_move(&self) -> bool {
        !self.transition_lock && !self.focus_lock
    }
}

const PLAYER_SIZE: f32 = 1.0;
const PLAYER_COLOR: Color = Color::srgb(0.95, 0.75, 0.3);

fn spawn_player(mut commands: Commands, config: Res<LadderConfig>) {
    let start = config.spawn_point(0).unwrap_or_default();
    commands.spawn((
        Player,
        PlayerControl::default(),
        Sprite::from_color(PLAYER_COLOR, Vec2::splat(PLAYER_SIZE)),
        Transform::from_translation(start.extend(config.player_depth)),
    ));
}

/// Reads WASD/arrow keys into a direction, normalized so diagonals aren't faster.
pub fn movement_input(keyboard: &ButtonInput<KeyCode>) -> Vec2 {
    let mut input = Vec2::ZERO;
    if keyboard.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        input.y += 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        input.y -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        input.x += 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        input.x -= 1.0;
    }
    input.normalize_or_zero()
}

fn player_movement(
    keyboard: Res<ButtonInput<KeyCode>>,
    config: Res<LadderConfig>,
    time: Res<Time>,
    mut query: Query<(&mut Transform, &PlayerControl), With<Player>>,
) {
    let Ok((mut transform, control)) = query.single_mut() else {
        return;
    };
    if !control.can_move() {
        return;
    }

    let movement = movement_input(&keyboard) * config.player_speed * time.delta_secs();
    transform.translation += movement.extend(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_input_is_normalized() {
        let mut keyboard = ButtonInput::<KeyCode>::default();
        keyboard.press(KeyCode::KeyW);
        keyboard.press(KeyCode::KeyD);
        let input = movement_input(&keyboard);
        assert!((input.length() - 1.0).abs() < 1e-5);
        assert!(input.x > 0.0 && input.y > 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut keyboard = ButtonInput::<KeyCode>::default();
        keyboard.press(KeyCode::ArrowLeft);
        keyboard.press(KeyCode::ArrowRight);
        assert_eq!(movement_input(&keyboard), Vec2::ZERO);
    }

    #[test]
    fn either_lock_blocks_movement() {
        let mut control = PlayerControl::default();
        assert!(control.can_move());
        control.focus_lock = true;
        assert!(!control.can_move());
        control.focus_lock = false;
        control.transition_lock = true;
        assert!(!control.can_move());
    }
}
