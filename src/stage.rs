// Stage gate: which floor of the ladder is current, and the camera that follows it.
use bevy::log::warn_once;
use bevy::prelude::*;

use crate::LadderSet;
use crate::config::LadderConfig;
use crate::progress::Progress;
use crate::transition::TransitionSequencer;

pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<StageChanged>()
            .add_systems(Startup, init_stage_gate)
            .add_systems(
                Update,
                (evaluate_stage, follow_stage_camera)
                    .chain()
                    .in_set(LadderSet::Stage),
            );
    }
}

/// Broadcast once per stage change, after `StageGate::current` already
/// holds the new stage.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageChanged {
    pub from: usize,
    pub to: usize,
}

/// Marks the camera that climbs to the current stage's height.
#[derive(Component)]
pub struct StageCamera;

#[derive(Resource, Debug, Clone)]
pub struct StageGate {
    current: usize,
    target: Option<usize>,
    thresholds: Vec<f32>,
    heights: Vec<f32>,
}

impl StageGate {
    pub fn new(thresholds: Vec<f32>, heights: Vec<f32>) -> Self {
        Self {
            current: 0,
            target: None,
            thresholds,
            heights,
        }
    }

    pub fn from_config(config: &LadderConfig) -> Self {
        Self::new(config.stage_thresholds.clone(), config.stage_heights.clone())
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub(crate) fn set_current(&mut self, stage: usize) {
        self.current = stage;
    }

    pub fn is_consistent(&self) -> bool {
        !self.heights.is_empty() && self.thresholds.len() == self.heights.len()
    }

    /// Highest stage whose threshold is at or below `value`.
    ///
    /// Thresholds are scanned bottom to top and the scan stops at the first
    /// one above `value`. Returns `None` when thresholds and heights are
    /// mismatched.
    pub fn resolve(&self, value: f32) -> Option<usize> {
        if !self.is_consistent() {
            return None;
        }
        let mut stage = 0;
        for (index, threshold) in self.thresholds.iter().enumerate() {
            if value >= *threshold {
                stage = index;
            } else {
                break;
            }
        }
        Some(stage)
    }

    pub fn height(&self, stage: usize) -> Option<f32> {
        self.heights.get(stage).copied()
    }
}

fn init_stage_gate(
    mut commands: Commands,
    config: Res<LadderConfig>,
    existing: Option<Res<StageGate>>,
) {
    if existing.is_some() {
        return;
    }
    commands.insert_resource(StageGate::from_config(&config));
}

/// Resolves the target stage and starts a transition when it differs from
/// the current one. A change that arrives mid-transition is picked up again
/// on the first frame after that transition finishes.
fn evaluate_stage(
    progress: Res<Progress>,
    gate: Option<ResMut<StageGate>>,
    mut sequencer: ResMut<TransitionSequencer>,
) {
    let Some(mut gate) = gate else {
        return;
    };
    let Some(target) = gate.resolve(progress.value()) else {
        warn_once!("Stage thresholds and heights differ in length; stage gate disabled");
        return;
    };
    gate.target = Some(target);

    if target != gate.current && sequencer.begin(gate.current, target) {
        info!("STAGE: {} -> {} at progress {:.2}", gate.current, target, progress.value());
    }
}

/// Steps `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

fn follow_stage_camera(
    gate: Option<Res<StageGate>>,
    config: Res<LadderConfig>,
    time: Res<Time>,
    mut camera: Query<&mut Transform, With<StageCamera>>,
) {
    let Some(gate) = gate else {
        return;
    };
    let Some(target_y) = gate.target.and_then(|stage| gate.height(stage)) else {
        return;
    };
    let Ok(mut transform) = camera.single_mut() else {
        return;
    };

    transform.translation.y = move_towards(
        transform.translation.y,
        target_y,
        config.camera_speed * time.delta_secs(),
    );
}
