// Tuning shared by the ladder systems.
use bevy::prelude::*;
use strum::{EnumIter, IntoStaticStr};

/// Stage layout, transition timing and player tuning.
#[derive(Resource, Clone, Debug)]
pub struct LadderConfig {
    /// Minimum progress for each stage, bottom to top.
    pub stage_thresholds: Vec<f32>,
    /// Camera height for each stage, paired by index with the thresholds.
    pub stage_heights: Vec<f32>,
    /// Where the player lands after a transition into each stage.
    pub spawn_points: Vec<Vec2>,
    pub camera_speed: f32,
    pub fade_duration: f32,
    pub transition_hold: f32,
    pub player_speed: f32,
    /// Fixed z for the player so sprite sorting stays stable after a teleport.
    pub player_depth: f32,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            stage_thresholds: vec![0.0, 0.33, 0.66],
            stage_heights: vec![5.0, 20.0, 35.0],
            spawn_points: vec![
                Vec2::new(-6.0, 2.0),
                Vec2::new(-6.0, 17.0),
                Vec2::new(-6.0, 32.0),
            ],
            camera_speed: 5.0,
            fade_duration: 1.0,
            transition_hold: 2.0,
            player_speed: 5.0,
            player_depth: 0.0,
        }
    }
}

impl LadderConfig {
    pub fn spawn_point(&self, stage: usize) -> Option<Vec2> {
        self.spawn_points.get(stage).copied()
    }
}

/// Drain and reward tuning for one minigame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinigameTuning {
    /// Drain while the minigame is active but the player hasn't engaged.
    pub idle_drain: f32,
    /// Drain while the player is focused on the minigame.
    pub engaged_drain: f32,
    pub gain: f32,
    /// Applied on a wrong answer; negative.
    pub penalty: f32,
    /// Seconds after a success during which the zone stays closed.
    pub cooldown: f32,
}

impl MinigameTuning {
    /// For minigames whose drain and gain come from their workload.
    pub const WORKLOAD: Self = Self {
        idle_drain: 0.0,
        engaged_drain: 0.0,
        gain: 0.0,
        penalty: 0.0,
        cooldown: 0.0,
    };
}

impl Default for MinigameTuning {
    fn default() -> Self {
        Self {
            idle_drain: 0.01,
            engaged_drain: 0.05,
            gain: 0.1,
            penalty: -0.05,
            cooldown: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum MinigameKind {
    Counting,
    Pricing,
    Peeling,
    Dishes,
}

impl MinigameKind {
    /// The stage this minigame lives on.
    pub fn level_index(self) -> usize {
        match self {
            MinigameKind::Counting => 0,
            MinigameKind::Pricing => 1,
            MinigameKind::Peeling => 2,
            MinigameKind::Dishes => 2,
        }
    }

    pub fn tuning(self) -> MinigameTuning {
        match self {
            MinigameKind::Counting => MinigameTuning::default(),
            MinigameKind::Pricing => MinigameTuning {
                cooldown: 10.0,
                ..default()
            },
            MinigameKind::Peeling | MinigameKind::Dishes => MinigameTuning::WORKLOAD,
        }
    }

    /// Centre of the minigame's trigger zone.
    pub fn zone_position(self, config: &LadderConfig) -> Vec2 {
        let height = config
            .stage_heights
            .get(self.level_index())
            .copied()
            .unwrap_or_default();
        let x = match self {
            MinigameKind::Dishes => 6.0,
            _ => 2.0,
        };
        Vec2::new(x, height - 3.0)
    }
}
