// The shared progress bar and the registry of everything draining it.
use std::collections::HashMap;

use bevy::prelude::*;

use crate::LadderSet;

pub struct ProgressPlugin;

impl Plugin for ProgressPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Progress>()
            .add_systems(Update, drain_progress.in_set(LadderSet::Progress));
    }
}

/// Game-wide progress in `[0, 1]`.
///
/// Any number of requesters can drain it at once. Each one owns its own
/// entry in the registry, so stopping one requester never cancels another.
#[derive(Resource, Debug, Default)]
pub struct Progress {
    value: f32,
    drainers: HashMap<Entity, f32>,
}

impl Progress {
    pub fn with_value(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            ..default()
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Registers or replaces the drain rate for `requester`.
    pub fn start_draining(&mut self, requester: Entity, rate: f32) {
        let rate = rate.max(0.0);
        if self.drainers.insert(requester, rate).is_none() {
            debug!("Progress: {requester} started draining at {rate}");
        }
    }

    pub fn stop_draining(&mut self, requester: Entity) {
        if self.drainers.remove(&requester).is_some() {
            debug!("Progress: {requester} stopped draining");
        }
    }

    /// Adds a one-shot gain (or penalty when `delta` is negative).
    pub fn add_progress(&mut self, requester: Entity, delta: f32) {
        self.value = (self.value + delta).clamp(0.0, 1.0);
        debug!(
            "Progress: {requester} added {delta}, now {:.3}",
            self.value
        );
    }

    /// Applies one frame of every registered drain.
    pub fn tick(&mut self, dt: f32) {
        if self.drainers.is_empty() {
            return;
        }
        self.value = (self.value - dt * self.total_drain_rate()).clamp(0.0, 1.0);
    }

    pub fn total_drain_rate(&self) -> f32 {
        self.drainers.values().sum()
    }

    #[cfg(test)]
    pub fn drain_rate(&self, requester: Entity) -> Option<f32> {
        self.drainers.get(&requester).copied()
    }

    #[cfg(test)]
    pub fn is_draining(&self, requester: Entity) -> bool {
        self.drainers.contains_key(&requester)
    }

    #[cfg(test)]
    pub fn drainer_count(&self) -> usize {
        self.drainers.len()
    }
}

fn drain_progress(mut progress: ResMut<Progress>, time: Res<Time>) {
    progress.tick(time.delta_secs());
}
