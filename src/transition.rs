// Stage transitions: notify, fade to black, hold, teleport the player, fade back in.

use bevy::prelude::*;
use strum::IntoStaticStr;

use crate::LadderSet;
use crate::config::LadderConfig;
use crate::player::{Player, PlayerControl};
use crate::stage::{StageChanged, StageGate};

pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TransitionSequencer>()
            .add_systems(Update, advance_transition.in_set(LadderSet::Transition));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum TransitionPhase {
    NotStarted,
    Notifying,
    FadingOut,
    Waiting,
    Teleporting,
    FadingIn,
    Done,
}

/// Side effects requested by the sequencer for the systems to carry out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionEffect {
    Notify { from: usize, to: usize },
    LockInput,
    Overlay(f32),
    Teleport(usize),
    UnlockInput,
}

#[derive(Clone, Copy, Debug)]
pub struct TransitionTimings {
    pub fade_duration: f32,
    pub hold: f32,
    pub has_overlay: bool,
}

impl TransitionTimings {
    fn skips_fade(&self) -> bool {
        !self.has_overlay
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StageTransition {
    pub from: usize,
    pub to: usize,
    phase: TransitionPhase,
    elapsed: f32,
    fade_start: f32,
}

impl StageTransition {
    fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            phase: TransitionPhase::NotStarted,
            elapsed: 0.0,
            fade_start: 0.0,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    fn enter(&mut self, phase: TransitionPhase) {
        let label: &'static str = phase.into();
        debug!("TRANSITION: {} -> {} entering {label}", self.from, self.to);
        self.phase = phase;
        self.elapsed = 0.0;
    }

    /// One frame of a fade towards `target`. Returns true once the overlay
    /// has reached it.
    fn fade_step(
        &mut self,
        alpha: &mut f32,
        target: f32,
        dt: f32,
        duration: f32,
        effects: &mut Vec<TransitionEffect>,
    ) -> bool {
        self.elapsed += dt;
        let t = if duration > 0.0 {
            (self.elapsed / duration).min(1.0)
        } else {
            1.0
        };
        *alpha = self.fade_start + (target - self.fade_start) * t;
        effects.push(TransitionEffect::Overlay(*alpha));
        t >= 1.0
    }
}

/// Runs at most one stage transition at a time, one step per frame.
#[derive(Resource, Debug, Default)]
pub struct TransitionSequencer {
    active: Option<StageTransition>,
    overlay_alpha: f32,
}

impl TransitionSequencer {
    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&StageTransition> {
        self.active.as_ref()
    }

    #[cfg(test)]
    pub fn overlay_alpha(&self) -> f32 {
        self.overlay_alpha
    }

    /// Starts a transition unless one is already in flight.
    pub fn begin(&mut self, from: usize, to: usize) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(StageTransition::new(from, to));
        true
    }

    /// Advances the in-flight transition by one frame.
    ///
    /// Instant phases chain within the frame; each timed phase takes the
    /// frame's `dt` at most once, so a fade never shares a frame's time with
    /// the hold that follows it.
    pub fn advance(&mut self, dt: f32, timings: &TransitionTimings) -> Vec<TransitionEffect> {
        let mut effects = Vec::new();
        let Self {
            active,
            overlay_alpha,
        } = self;
        let Some(transition) = active.as_mut() else {
            return effects;
        };

        let mut budget = Some(dt);
        let finished = loop {
            match transition.phase {
                TransitionPhase::NotStarted => transition.enter(TransitionPhase::Notifying),
                TransitionPhase::Notifying => {
                    effects.push(TransitionEffect::Notify {
                        from: transition.from,
                        to: transition.to,
                    });
                    effects.push(TransitionEffect::LockInput);
                    transition.fade_start = *overlay_alpha;
                    transition.enter(TransitionPhase::FadingOut);
                }
                TransitionPhase::FadingOut => {
                    if timings.skips_fade() {
                        transition.enter(TransitionPhase::Waiting);
                        continue;
                    }
                    let Some(step) = budget.take() else {
                        break false;
                    };
                    if transition.fade_step(
                        overlay_alpha,
                        1.0,
                        step,
                        timings.fade_duration,
                        &mut effects,
                    ) {
                        transition.enter(TransitionPhase::Waiting);
                    }
                }
                TransitionPhase::Waiting => {
                    let Some(step) = budget.take() else {
                        break false;
                    };
                    transition.elapsed += step;
                    if transition.elapsed >= timings.hold {
                        transition.enter(TransitionPhase::Teleporting);
                    }
                }
                TransitionPhase::Teleporting => {
                    effects.push(TransitionEffect::Teleport(transition.to));
                    transition.fade_start = *overlay_alpha;
                    transition.enter(TransitionPhase::FadingIn);
                }
                TransitionPhase::FadingIn => {
                    if timings.skips_fade() {
                        transition.enter(TransitionPhase::Done);
                        continue;
                    }
                    let Some(step) = budget.take() else {
                        break false;
                    };
                    if transition.fade_step(
                        overlay_alpha,
                        0.0,
                        step,
                        timings.fade_duration,
                        &mut effects,
                    ) {
                        transition.enter(TransitionPhase::Done);
                    }
                }
                TransitionPhase::Done => {
                    effects.push(TransitionEffect::UnlockInput);
                    break true;
                }
            }
        };

        if finished {
            *active = None;
        }
        effects
    }
}

/// Full-screen black overlay the fades drive. Fades are skipped without one.
#[derive(Component)]
pub struct FadeOverlay;

fn advance_transition(
    mut sequencer: ResMut<TransitionSequencer>,
    gate: Option<ResMut<StageGate>>,
    config: Res<LadderConfig>,
    time: Res<Time>,
    mut stage_changed: MessageWriter<StageChanged>,
    mut overlays: Query<&mut BackgroundColor, With<FadeOverlay>>,
    mut player: Query<(&mut Transform, &mut PlayerControl), With<Player>>,
) {
    let Some(mut gate) = gate else {
        return;
    };
    if !sequencer.is_transitioning() {
        return;
    }

    let timings = TransitionTimings {
        fade_duration: config.fade_duration,
        hold: config.transition_hold,
        has_overlay: !overlays.is_empty(),
    };

    for effect in sequencer.advance(time.delta_secs(), &timings) {
        match effect {
            TransitionEffect::Notify { from, to } => {
                gate.set_current(to);
                stage_changed.write(StageChanged { from, to });
                info!("STAGE: now on stage {to}");
            }
            TransitionEffect::LockInput => {
                if let Ok((_, mut control)) = player.single_mut() {
                    control.transition_lock = true;
                }
            }
            TransitionEffect::UnlockInput => {
                if let Ok((_, mut control)) = player.single_mut() {
                    control.transition_lock = false;
                }
            }
            TransitionEffect::Overlay(alpha) => {
                for mut background in &mut overlays {
                    background.0 = Color::srgba(0.0, 0.0, 0.0, alpha);
                }
            }
            TransitionEffect::Teleport(stage) => {
                let Some(point) = config.spawn_point(stage) else {
                    continue;
                };
                if let Ok((mut transform, _)) = player.single_mut() {
                    transform.translation = point.extend(config.player_depth);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMINGS: TransitionTimings = TransitionTimings {
        fade_duration: 1.0,
        hold: 2.0,
        has_overlay: true,
    };

    fn phase(sequencer: &TransitionSequencer) -> Option<TransitionPhase> {
        sequencer.current().map(StageTransition::phase)
    }

    #[test]
    fn full_sequence_runs_in_order() {
        let mut sequencer = TransitionSequencer::default();
        assert!(sequencer.begin(0, 1));

        let first = sequencer.advance(0.5, &TIMINGS);
        assert_eq!(first[0], TransitionEffect::Notify { from: 0, to: 1 });
        assert_eq!(first[1], TransitionEffect::LockInput);
        assert_eq!(first[2], TransitionEffect::Overlay(0.5));
        assert_eq!(phase(&sequencer), Some(TransitionPhase::FadingOut));

        sequencer.advance(0.5, &TIMINGS);
        assert_eq!(sequencer.overlay_alpha(), 1.0);
        assert_eq!(phase(&sequencer), Some(TransitionPhase::Waiting));

        for _ in 0..3 {
            assert!(sequencer.advance(0.5, &TIMINGS).is_empty());
        }
        let teleport = sequencer.advance(0.5, &TIMINGS);
        assert_eq!(teleport, vec![TransitionEffect::Teleport(1)]);
        assert_eq!(phase(&sequencer), Some(TransitionPhase::FadingIn));

        sequencer.advance(0.5, &TIMINGS);
        let last = sequencer.advance(0.5, &TIMINGS);
        assert_eq!(
            last,
            vec![TransitionEffect::Overlay(0.0), TransitionEffect::UnlockInput]
        );
        assert!(!sequencer.is_transitioning());
    }

    #[test]
    fn second_begin_is_dropped_while_in_flight() {
        let mut sequencer = TransitionSequencer::default();
        assert!(sequencer.begin(0, 1));
        sequencer.advance(0.1, &TIMINGS);
        assert!(!sequencer.begin(1, 2));
        assert_eq!(sequencer.current().map(|t| t.to), Some(1));
    }

    #[test]
    fn without_overlay_fades_are_skipped() {
        let timings = TransitionTimings {
            has_overlay: false,
            ..TIMINGS
        };
        let mut sequencer = TransitionSequencer::default();
        sequencer.begin(2, 0);

        let first = sequencer.advance(1.0, &timings);
        assert_eq!(
            first,
            vec![
                TransitionEffect::Notify { from: 2, to: 0 },
                TransitionEffect::LockInput,
            ]
        );
        assert_eq!(phase(&sequencer), Some(TransitionPhase::Waiting));

        let second = sequencer.advance(1.0, &timings);
        assert_eq!(
            second,
            vec![TransitionEffect::Teleport(0), TransitionEffect::UnlockInput]
        );
        assert!(!sequencer.is_transitioning());
        assert_eq!(sequencer.overlay_alpha(), 0.0);
    }

    #[test]
    fn idle_sequencer_does_nothing() {
        let mut sequencer = TransitionSequencer::default();
        assert!(sequencer.advance(1.0, &TIMINGS).is_empty());
    }
}
