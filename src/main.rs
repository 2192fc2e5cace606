// Main
mod config;
mod hud;
mod level;
mod minigame;
mod player;
mod progress;
mod stage;
mod tasks;
mod transition;
mod workload;
mod zone;


use bevy::prelude::*;
use config::LadderConfig;
use hud::HudPlugin;
use level::LevelPlugin;
use minigame::MinigamePlugin;
use player::PlayerPlugin;
use progress::ProgressPlugin;
use stage::StagePlugin;
use tasks::TasksPlugin;
use transition::TransitionPlugin;
use workload::WorkloadPlugin;
use zone::ZonePlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins((LadderPlugin, PlayerPlugin, LevelPlugin, HudPlugin))
        .run();
}

/// Per-frame ordering of the ladder systems.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LadderSet {
    Progress,
    Stage,
    Transition,
    Presence,
    Minigames,
    Presentation,
}

/// The coordination core: progress, stages, transitions, zones and minigames.
/// Needs no window or renderer.
pub struct LadderPlugin;

impl Plugin for LadderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LadderConfig>()
            .configure_sets(
                Update,
                (
                    LadderSet::Progress,
                    LadderSet::Stage,
                    LadderSet::Transition,
                    LadderSet::Presence,
                    LadderSet::Minigames,
                    LadderSet::Presentation,
                )
                    .chain(),
            )
            .add_plugins((
                ProgressPlugin,
                StagePlugin,
                TransitionPlugin,
                ZonePlugin,
                MinigamePlugin,
                TasksPlugin,
                WorkloadPlugin,
            ));
    }
}
