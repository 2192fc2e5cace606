// Minigame zones: player presence and the explicit focus toggle.
use bevy::prelude::*;

use crate::LadderSet;
use crate::minigame::MinigameController;
use crate::player::{Player, PlayerControl};
use crate::stage::{StageCamera, StageChanged};

pub struct ZonePlugin;

impl Plugin for ZonePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<FocusToggled>()
            .add_systems(
                Update,
                (
                    detect_player_presence,
                    read_focus_key,
                    apply_focus_toggles,
                    exit_zones_on_stage_change,
                )
                    .chain()
                    .in_set(LadderSet::Presence),
            )
            .add_systems(Update, sync_zone_views.in_set(LadderSet::Presentation));
    }
}

const FOCUS_KEY: KeyCode = KeyCode::Space;

/// The player pressed the focus key.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct FocusToggled;

/// Trigger volume around a minigame.
///
/// Being inside the volume and being focused on the minigame are separate:
/// focus is only entered or left through `toggle`, and only from inside.
#[derive(Component, Debug)]
pub struct MinigameZone {
    pub half_extents: Vec2,
    /// Camera that shows this minigame while focused.
    pub camera: Option<Entity>,
    /// Raw overlap with the player, kept even while the trigger is off.
    in_volume: bool,
    in_minigame: bool,
    trigger_enabled: bool,
}

impl MinigameZone {
    pub fn new(half_extents: Vec2) -> Self {
        Self {
            half_extents,
            camera: None,
            in_volume: false,
            in_minigame: false,
            trigger_enabled: true,
        }
    }

    pub fn with_camera(mut self, camera: Entity) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Presence as the trigger sees it: false while the trigger is off.
    pub fn player_inside(&self) -> bool {
        self.in_volume && self.trigger_enabled
    }

    /// Whether the player stands in the volume, trigger or not.
    pub fn player_in_volume(&self) -> bool {
        self.in_volume
    }

    pub fn in_minigame(&self) -> bool {
        self.in_minigame
    }

    #[cfg(test)]
    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled
    }

    pub fn contains(&self, centre: Vec2, point: Vec2) -> bool {
        let offset = (point - centre).abs();
        offset.x <= self.half_extents.x && offset.y <= self.half_extents.y
    }

    /// Returns true when `player_inside` changed.
    pub fn set_player_inside(&mut self, inside: bool) -> bool {
        let before = self.player_inside();
        self.in_volume = inside;
        self.player_inside() != before
    }

    /// Enters focus if out of it, leaves it otherwise. Returns true if the
    /// focus state changed.
    pub fn toggle(&mut self) -> bool {
        if !self.player_inside() || !self.trigger_enabled {
            return false;
        }
        if self.in_minigame {
            self.exit()
        } else {
            self.enter()
        }
    }

    pub fn enter(&mut self) -> bool {
        if self.in_minigame {
            return false;
        }
        self.in_minigame = true;
        true
    }

    pub fn exit(&mut self) -> bool {
        if !self.in_minigame {
            return false;
        }
        self.in_minigame = false;
        true
    }

    /// A disabled trigger reports nobody inside, like a disabled collider.
    /// The player is seen again as soon as it is re-enabled.
    pub fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = enabled;
    }
}

fn detect_player_presence(
    player: Query<&Transform, With<Player>>,
    mut zones: Query<(Entity, &Transform, &mut MinigameZone), Without<Player>>,
) {
    let Ok(player) = player.single() else {
        return;
    };
    let point = player.translation.truncate();

    for (entity, transform, mut zone) in &mut zones {
        let inside = zone.contains(transform.translation.truncate(), point);
        if zone.set_player_inside(inside) {
            debug!("ZONE: player inside {entity}: {}", zone.player_inside());
        }
    }
}

fn read_focus_key(keyboard: Res<ButtonInput<KeyCode>>, mut toggles: MessageWriter<FocusToggled>) {
    if keyboard.just_pressed(FOCUS_KEY) {
        toggles.write(FocusToggled);
    }
}

/// Zones whose minigame is on another stage cannot be focused.
fn apply_focus_toggles(
    mut toggles: MessageReader<FocusToggled>,
    mut zones: Query<(Entity, &mut MinigameZone, Option<&MinigameController>)>,
) {
    for _ in toggles.read() {
        for (entity, mut zone, controller) in &mut zones {
            if controller.is_some_and(|controller| !controller.is_active()) {
                continue;
            }
            if zone.toggle() {
                info!("ZONE: {entity} in minigame: {}", zone.in_minigame());
            }
        }
    }
}

/// A stage jump never leaves a minigame view open.
fn exit_zones_on_stage_change(
    mut changes: MessageReader<StageChanged>,
    mut zones: Query<(Entity, &mut MinigameZone)>,
) {
    if changes.read().count() == 0 {
        return;
    }
    for (entity, mut zone) in &mut zones {
        if zone.exit() {
            info!("ZONE: {entity} exited due to stage change");
        }
    }
}

/// Swaps camera roles and locks movement while any zone is focused.
fn sync_zone_views(
    zones: Query<&MinigameZone>,
    mut cameras: Query<(Entity, &mut Camera, Has<StageCamera>)>,
    mut player: Query<&mut PlayerControl, With<Player>>,
) {
    let focused = zones.iter().find(|zone| zone.in_minigame());

    if let Ok(mut control) = player.single_mut() {
        control.focus_lock = focused.is_some();
    }

    let focus_camera = focused.and_then(|zone| zone.camera);
    for (entity, mut camera, is_stage_camera) in &mut cameras {
        let active = if is_stage_camera {
            focus_camera.is_none()
        } else if zones.iter().any(|zone| zone.camera == Some(entity)) {
            focus_camera == Some(entity)
        } else {
            continue;
        };
        if camera.is_active != active {
            camera.is_active = active;
            camera.order = if active { 1 } else { 0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> MinigameZone {
        MinigameZone::new(Vec2::new(2.0, 1.0))
    }

    #[test]
    fn toggle_requires_presence() {
        let mut zone = zone();
        assert!(!zone.toggle());
        assert!(!zone.in_minigame());

        zone.set_player_inside(true);
        assert!(zone.toggle());
        assert!(zone.in_minigame());
        assert!(zone.toggle());
        assert!(!zone.in_minigame());
    }

    #[test]
    fn exit_is_a_no_op_when_not_focused() {
        let mut zone = zone();
        assert!(!zone.exit());
        zone.enter();
        assert!(zone.exit());
        assert!(!zone.exit());
    }

    #[test]
    fn disabled_trigger_ignores_presence_and_toggles() {
        let mut zone = zone();
        zone.set_player_inside(true);
        zone.set_trigger_enabled(false);
        assert!(!zone.player_inside());
        assert!(!zone.set_player_inside(true));
        assert!(!zone.toggle());

        zone.set_trigger_enabled(true);
        assert!(zone.player_inside());
        assert!(zone.toggle());
    }

    #[test]
    fn volume_presence_survives_a_disabled_trigger() {
        let mut zone = zone();
        zone.set_player_inside(true);
        zone.set_trigger_enabled(false);
        assert!(zone.player_in_volume());
        assert!(!zone.player_inside());

        assert!(!zone.set_player_inside(false));
        assert!(!zone.player_in_volume());
    }

    #[test]
    fn contains_uses_half_extents() {
        let zone = zone();
        let centre = Vec2::new(10.0, 10.0);
        assert!(zone.contains(centre, Vec2::new(12.0, 9.0)));
        assert!(!zone.contains(centre, Vec2::new(12.5, 10.0)));
        assert!(!zone.contains(centre, Vec2::new(10.0, 11.5)));
    }
}
