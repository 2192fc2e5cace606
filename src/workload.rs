// Minigames whose drain follows a pile of work instead of the player's focus:
// a rack of dirty plates and batches of potatoes.
use std::ops::RangeInclusive;

use bevy::prelude::*;
use rand::Rng;

use crate::LadderSet;
use crate::minigame::{MinigameController, resolve_outcomes, tick_cooldowns};
use crate::progress::Progress;
use crate::tasks::{MinigameTask, SubmitAnswer};

pub struct WorkloadPlugin;

impl Plugin for WorkloadPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                perform_work.before(resolve_outcomes),
                drive_workloads.after(tick_cooldowns),
            )
                .in_set(LadderSet::Minigames),
        );
    }
}

pub const MAX_PLATES: usize = 8;
const PLATE_DELAY: RangeInclusive<f32> = 10.0..=30.0;
/// Drain while the rack is full.
pub const BACKLOG_DRAIN: f32 = 0.05;
pub const PLATE_GAIN: f32 = 0.1;

pub const BATCH_SIZE: usize = 5;
pub const NEXT_BATCH_DELAY: f32 = 20.0;
/// Drain while a batch sits unpeeled.
pub const BATCH_DRAIN: f32 = 0.03;
pub const BATCH_GAIN: f32 = 0.2;

/// Dirty plates pile up on a random timer; the minigame only hurts once the
/// rack is full.
#[derive(Debug, Clone)]
pub struct DishRack {
    plates: usize,
    next_plate_in: f32,
}

impl DishRack {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            plates: 0,
            next_plate_in: rng.random_range(PLATE_DELAY),
        }
    }

    #[cfg(test)]
    pub fn with_plates(plates: usize, next_plate_in: f32) -> Self {
        Self {
            plates: plates.min(MAX_PLATES),
            next_plate_in,
        }
    }

    pub fn plates(&self) -> usize {
        self.plates
    }

    pub fn is_full(&self) -> bool {
        self.plates >= MAX_PLATES
    }

    /// Runs the plate timer. Returns true when a plate arrived this frame.
    /// The timer is frozen while the rack is full.
    pub fn tick(&mut self, dt: f32, rng: &mut impl Rng) -> bool {
        if self.is_full() {
            return false;
        }
        self.next_plate_in -= dt;
        if self.next_plate_in > 0.0 {
            return false;
        }
        self.plates += 1;
        self.next_plate_in = rng.random_range(PLATE_DELAY);
        true
    }

    /// Takes one plate off the rack. False when there was nothing to clean.
    pub fn clean(&mut self) -> bool {
        if self.plates == 0 {
            return false;
        }
        self.plates -= 1;
        true
    }

    pub fn drain_rate(&self) -> f32 {
        if self.is_full() { BACKLOG_DRAIN } else { 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peel {
    Nothing,
    Peeled { left: usize },
    BatchDone,
}

/// Potatoes come in batches. A countdown separates batches and also runs
/// before the first one.
#[derive(Debug, Clone)]
pub struct PeelingBatch {
    left: usize,
    countdown: Option<f32>,
}

impl Default for PeelingBatch {
    fn default() -> Self {
        Self {
            left: 0,
            countdown: Some(NEXT_BATCH_DELAY),
        }
    }
}

impl PeelingBatch {
    /// Throws away whatever was on the board and waits for a fresh batch.
    pub fn restart(&mut self) {
        *self = Self::default();
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn countdown(&self) -> Option<f32> {
        self.countdown
    }

    /// Returns true when a new batch arrived this frame.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.countdown else {
            return false;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.countdown = Some(remaining);
            return false;
        }
        self.countdown = None;
        self.left = BATCH_SIZE;
        true
    }

    pub fn peel(&mut self) -> Peel {
        if self.left == 0 {
            return Peel::Nothing;
        }
        self.left -= 1;
        if self.left > 0 {
            return Peel::Peeled { left: self.left };
        }
        self.countdown = Some(NEXT_BATCH_DELAY);
        Peel::BatchDone
    }

    pub fn drain_rate(&self) -> f32 {
        if self.left > 0 { BATCH_DRAIN } else { 0.0 }
    }
}

/// A submission on a workload minigame is one unit of work: a plate
/// scrubbed or a potato peeled.
fn perform_work(
    mut answers: MessageReader<SubmitAnswer>,
    mut progress: ResMut<Progress>,
    mut minigames: Query<(&MinigameController, &mut MinigameTask)>,
) {
    for answer in answers.read() {
        let Ok((controller, mut task)) = minigames.get_mut(answer.minigame) else {
            continue;
        };
        if !controller.in_minigame() {
            continue;
        }
        let gain = match &mut *task {
            MinigameTask::Dishes(rack) => rack.clean().then_some(PLATE_GAIN),
            MinigameTask::Peeling(batch) => match batch.peel() {
                Peel::BatchDone => Some(BATCH_GAIN),
                Peel::Peeled { left } => {
                    debug!("WORK: {} potatoes left", left);
                    None
                }
                Peel::Nothing => None,
            },
            _ => continue,
        };
        if let Some(gain) = gain {
            progress.add_progress(answer.minigame, gain);
            info!("WORK: {} finished a job", answer.minigame);
        }
    }
}

/// Advances every active workload and makes its drain the minigame's
/// registered rate. Runs after the controller systems so it has the last
/// word on the minigame's drain entry each frame.
fn drive_workloads(
    time: Res<Time>,
    mut progress: ResMut<Progress>,
    mut minigames: Query<(Entity, &MinigameController, &mut MinigameTask)>,
) {
    let dt = time.delta_secs();
    let mut rng = rand::rng();

    for (entity, controller, mut task) in &mut minigames {
        if !controller.is_active() {
            continue;
        }
        let rate = match &mut *task {
            MinigameTask::Dishes(rack) => {
                if rack.tick(dt, &mut rng) {
                    debug!("WORK: plate added, {} on the rack", rack.plates());
                }
                rack.drain_rate()
            }
            MinigameTask::Peeling(batch) => {
                if batch.tick(dt) {
                    debug!("WORK: new batch of {}", batch.left());
                }
                batch.drain_rate()
            }
            _ => continue,
        };
        if rate > 0.0 {
            progress.start_draining(entity, rate);
        } else {
            progress.stop_draining(entity);
        }
    }
}
