// Minigame activation: which minigame is live, what it drains, and what a result does.
use bevy::prelude::*;

use crate::LadderSet;
use crate::config::MinigameTuning;
use crate::progress::Progress;
use crate::stage::{StageChanged, StageGate};
use crate::tasks::MinigameTask;
use crate::zone::MinigameZone;

pub struct MinigamePlugin;

impl Plugin for MinigamePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<MinigameOutcome>().add_systems(
            Update,
            (
                activate_new_minigames,
                activate_on_stage_change,
                sync_engagement,
                resolve_outcomes,
                tick_cooldowns,
            )
                .chain()
                .in_set(LadderSet::Minigames),
        );
    }
}

/// Result of one attempt at a minigame's task.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinigameOutcome {
    pub minigame: Entity,
    pub success: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControllerState {
    Inactive,
    /// On the current stage, waiting for the player.
    Idle,
    /// The player is focused on this minigame.
    Engaged,
    Cooldown {
        remaining: f32,
    },
}

/// What the caller still has to do after an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeResponse {
    Ignored,
    /// Task solved. The zone closes; `cooldown` says whether it stays closed.
    Completed { cooldown: bool },
    /// Wrong answer: new task, stay focused.
    Retry,
}

/// Drives one minigame's lifecycle and its entry in the progress drain
/// registry. `id` is always the minigame's own entity.
#[derive(Component, Debug)]
pub struct MinigameController {
    pub level_index: usize,
    pub tuning: MinigameTuning,
    state: ControllerState,
}

impl MinigameController {
    pub fn new(level_index: usize, tuning: MinigameTuning) -> Self {
        Self {
            level_index,
            tuning,
            state: ControllerState::Inactive,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != ControllerState::Inactive
    }

    pub fn in_minigame(&self) -> bool {
        self.state == ControllerState::Engaged
    }

    pub fn on_cooldown(&self) -> bool {
        self.cooldown_remaining().is_some()
    }

    pub fn cooldown_remaining(&self) -> Option<f32> {
        match self.state {
            ControllerState::Cooldown { remaining } => Some(remaining),
            _ => None,
        }
    }

    fn set_drain(id: Entity, rate: f32, progress: &mut Progress) {
        if rate > 0.0 {
            progress.start_draining(id, rate);
        } else {
            progress.stop_draining(id);
        }
    }

    fn become_idle(&mut self, id: Entity, progress: &mut Progress) {
        self.state = ControllerState::Idle;
        Self::set_drain(id, self.tuning.idle_drain, progress);
    }

    /// Returns true if the controller was inactive.
    pub fn activate(&mut self, id: Entity, progress: &mut Progress) -> bool {
        if self.is_active() {
            return false;
        }
        self.become_idle(id, progress);
        true
    }

    /// Returns true if the controller was active. Cancels any cooldown.
    pub fn deactivate(&mut self, id: Entity, progress: &mut Progress) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = ControllerState::Inactive;
        progress.stop_draining(id);
        true
    }

    pub fn engage(&mut self, id: Entity, progress: &mut Progress) -> bool {
        if self.state != ControllerState::Idle {
            return false;
        }
        self.state = ControllerState::Engaged;
        Self::set_drain(id, self.tuning.engaged_drain, progress);
        true
    }

    pub fn disengage(&mut self, id: Entity, progress: &mut Progress) -> bool {
        if self.state != ControllerState::Engaged {
            return false;
        }
        self.become_idle(id, progress);
        true
    }

    pub fn report_outcome(
        &mut self,
        id: Entity,
        success: bool,
        progress: &mut Progress,
    ) -> OutcomeResponse {
        if self.state != ControllerState::Engaged {
            return OutcomeResponse::Ignored;
        }
        if !success {
            progress.add_progress(id, self.tuning.penalty);
            return OutcomeResponse::Retry;
        }

        progress.add_progress(id, self.tuning.gain);
        progress.stop_draining(id);
        if self.tuning.cooldown > 0.0 {
            self.state = ControllerState::Cooldown {
                remaining: self.tuning.cooldown,
            };
            OutcomeResponse::Completed { cooldown: true }
        } else {
            self.become_idle(id, progress);
            OutcomeResponse::Completed { cooldown: false }
        }
    }

    /// Counts the cooldown down. Returns true on the frame it expires.
    pub fn tick_cooldown(&mut self, id: Entity, dt: f32, progress: &mut Progress) -> bool {
        let ControllerState::Cooldown { remaining } = self.state else {
            return false;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.state = ControllerState::Cooldown { remaining };
            return false;
        }
        self.become_idle(id, progress);
        true
    }
}

/// Minigames spawned onto the current stage start active without waiting
/// for a stage change.
fn activate_new_minigames(
    gate: Option<Res<StageGate>>,
    mut progress: ResMut<Progress>,
    mut minigames: Query<
        (Entity, &mut MinigameController, Option<&mut MinigameTask>),
        Added<MinigameController>,
    >,
) {
    let Some(gate) = gate else {
        return;
    };
    for (entity, mut controller, task) in &mut minigames {
        if controller.level_index == gate.current() && controller.activate(entity, &mut progress) {
            if let Some(mut task) = task {
                task.on_activate();
            }
            info!("MINIGAME: {entity} active on stage {}", gate.current());
        }
    }
}

/// Activates the minigame on the new stage and tears down every other one.
fn activate_on_stage_change(
    mut changes: MessageReader<StageChanged>,
    mut progress: ResMut<Progress>,
    mut minigames: Query<(
        Entity,
        &mut MinigameController,
        Option<&mut MinigameZone>,
        Option<&mut MinigameTask>,
    )>,
) {
    let Some(change) = changes.read().last().copied() else {
        return;
    };
    debug!("MINIGAME: reacting to stage {} -> {}", change.from, change.to);
    let stage = change.to;

    for (entity, mut controller, zone, task) in &mut minigames {
        if controller.level_index == stage {
            if controller.activate(entity, &mut progress) {
                if let Some(mut task) = task {
                    task.on_activate();
                }
                info!("MINIGAME: {entity} active on stage {stage}");
            }
        } else if controller.deactivate(entity, &mut progress) {
            if let Some(mut zone) = zone {
                zone.exit();
                zone.set_trigger_enabled(true);
            }
            info!("MINIGAME: {entity} deactivated");
        }
    }
}

/// Follows the zone's focus state: focus engages an idle minigame with a
/// fresh task, losing focus returns it to idle.
fn sync_engagement(
    mut progress: ResMut<Progress>,
    mut minigames: Query<(
        Entity,
        &mut MinigameController,
        &MinigameZone,
        Option<&mut MinigameTask>,
    )>,
) {
    for (entity, mut controller, zone, task) in &mut minigames {
        if zone.in_minigame() {
            if controller.engage(entity, &mut progress) {
                if let Some(mut task) = task {
                    task.regenerate(&mut rand::rng());
                }
                info!("MINIGAME: {entity} engaged");
            }
        } else if controller.disengage(entity, &mut progress) {
            info!("MINIGAME: {entity} left without finishing");
        }
    }
}

pub(crate) fn resolve_outcomes(
    mut outcomes: MessageReader<MinigameOutcome>,
    mut progress: ResMut<Progress>,
    mut minigames: Query<(
        &mut MinigameController,
        Option<&mut MinigameZone>,
        Option<&mut MinigameTask>,
    )>,
) {
    for outcome in outcomes.read() {
        let Ok((mut controller, zone, task)) = minigames.get_mut(outcome.minigame) else {
            continue;
        };
        match controller.report_outcome(outcome.minigame, outcome.success, &mut progress) {
            OutcomeResponse::Ignored => {}
            OutcomeResponse::Completed { cooldown } => {
                info!("MINIGAME: {} completed", outcome.minigame);
                if let Some(mut zone) = zone {
                    zone.exit();
                    if cooldown {
                        zone.set_trigger_enabled(false);
                    }
                }
            }
            OutcomeResponse::Retry => {
                info!("MINIGAME: {} wrong answer, new task", outcome.minigame);
                if let Some(mut task) = task {
                    task.regenerate(&mut rand::rng());
                }
            }
        }
    }
}

pub(crate) fn tick_cooldowns(
    time: Res<Time>,
    mut progress: ResMut<Progress>,
    mut minigames: Query<(Entity, &mut MinigameController, Option<&mut MinigameZone>)>,
) {
    let dt = time.delta_secs();
    for (entity, mut controller, zone) in &mut minigames {
        if controller.tick_cooldown(entity, dt, &mut progress) {
            debug!("MINIGAME: {entity} cooldown over");
            if let Some(mut zone) = zone {
                zone.set_trigger_enabled(true);
            }
        }
    }
}
