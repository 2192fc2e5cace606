// Screen-space UI: the progress bar, the task panel with its answer entry,
// and the fade overlay.

use bevy::prelude::*;

use crate::LadderSet;
use crate::minigame::MinigameController;
use crate::progress::Progress;
use crate::tasks::{COUNTING_INGREDIENTS, MinigameTask, SubmitAnswer};
use crate::transition::FadeOverlay;
use crate::workload::MAX_PLATES;
use crate::zone::MinigameZone;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnswerEntry>()
            .add_systems(
                Startup,
                (spawn_progress_bar, spawn_task_panel, spawn_fade_overlay),
            )
            .add_systems(Update, type_answer.in_set(LadderSet::Presence))
            .add_systems(
                Update,
                (update_progress_bar, update_task_panel).in_set(LadderSet::Presentation),
            );
    }
}

const BAR_HEIGHT: f32 = 18.0;
const BAR_MARGIN: f32 = 12.0;
const TRACK_COLOR: Color = Color::srgba(0.1, 0.1, 0.1, 0.8);
const FILL_COLOR: Color = Color::srgb(0.35, 0.8, 0.4);

#[derive(Component)]
struct ProgressFill;

fn spawn_progress_bar(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Px(BAR_HEIGHT),
                position_type: PositionType::Absolute,
                top: Val::Px(BAR_MARGIN),
                padding: UiRect::horizontal(Val::Px(BAR_MARGIN)),
                ..default()
            },
            GlobalZIndex(50),
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Node {
                        width: Val::Percent(100.0),
                        height: Val::Percent(100.0),
                        border: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3)),
                    BackgroundColor(TRACK_COLOR),
                ))
                .with_children(|track| {
                    track.spawn((
                        ProgressFill,
                        Node {
                            width: Val::Percent(0.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(FILL_COLOR),
                    ));
                });
        });
}

fn spawn_fade_overlay(mut commands: Commands) {
    commands.spawn((
        FadeOverlay,
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            position_type: PositionType::Absolute,
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.0)),
        GlobalZIndex(100),
    ));
}

fn update_progress_bar(progress: Res<Progress>, mut fill: Query<&mut Node, With<ProgressFill>>) {
    if !progress.is_changed() {
        return;
    }
    for mut node in &mut fill {
        node.width = Val::Percent(progress.value() * 100.0);
    }
}

#[derive(Component)]
struct TaskPanel;

fn spawn_task_panel(mut commands: Commands) {
    commands.spawn((
        TaskPanel,
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(BAR_MARGIN),
            bottom: Val::Px(BAR_MARGIN),
            ..default()
        },
        GlobalZIndex(50),
    ));
}

/// What the panel shows for one minigame, or `None` when it has nothing to say.
fn describe_minigame(
    controller: &MinigameController,
    zone: &MinigameZone,
    task: &MinigameTask,
    entry: &AnswerEntry,
) -> Option<String> {
    if let Some(remaining) = controller.cooldown_remaining() {
        return zone
            .player_in_volume()
            .then(|| format!("Next order in {}s", remaining.ceil() as u32));
    }
    if !controller.in_minigame() {
        return (controller.is_active() && zone.player_inside())
            .then(|| "Press Space to start".to_string());
    }

    let mut lines = Vec::new();
    match task {
        MinigameTask::Counting(task) => {
            let pile: Vec<&str> = task
                .layout()
                .iter()
                .filter_map(|&index| COUNTING_INGREDIENTS.get(index).copied())
                .collect();
            lines.push(format!("On the counter: {}", pile.join(", ")));
            for (index, name) in COUNTING_INGREDIENTS.iter().enumerate() {
                lines.push(format!("{name}: {}", entry.field_line(index)));
            }
        }
        MinigameTask::Pricing(task) => {
            lines.push(format!("Price the {}", task.dish()));
            for ingredient in task.ingredients() {
                let price = task.price(ingredient).unwrap_or_default();
                lines.push(format!("  {ingredient}: {price:.1}"));
            }
            lines.push(format!("Total: {}", entry.field_line(0)));
        }
        MinigameTask::Dishes(rack) => {
            lines.push(format!("Plates waiting: {}/{MAX_PLATES}", rack.plates()));
            lines.push("Press Enter to scrub one".to_string());
        }
        MinigameTask::Peeling(batch) => match batch.countdown() {
            Some(remaining) => {
                lines.push(format!("Next batch in {}s", remaining.ceil() as u32));
            }
            None => {
                lines.push(format!("Potatoes left: {}", batch.left()));
                lines.push("Press Enter to peel one".to_string());
            }
        },
    }
    Some(lines.join("\n"))
}

fn update_task_panel(
    minigames: Query<(&MinigameController, &MinigameZone, &MinigameTask)>,
    entry: Res<AnswerEntry>,
    mut panel: Query<&mut Text, With<TaskPanel>>,
) {
    let Ok(mut text) = panel.single_mut() else {
        return;
    };
    let content = minigames
        .iter()
        .find_map(|(controller, zone, task)| describe_minigame(controller, zone, task, &entry))
        .unwrap_or_default();
    if text.0 != content {
        text.0 = content;
    }
}

/// Keyboard entry for the focused minigame's answer fields.
#[derive(Resource, Default, Debug)]
pub struct AnswerEntry {
    minigame: Option<Entity>,
    fields: Vec<String>,
    cursor: usize,
}

/// Result of one key press on the entry.
#[derive(Debug, PartialEq, Eq)]
pub enum EntryKey {
    Edited,
    Submit,
    Ignored,
}

impl AnswerEntry {
    /// Points the entry at `minigame`, clearing it if the focus moved.
    pub fn focus(&mut self, minigame: Option<Entity>, field_count: usize) {
        if self.minigame != minigame || self.fields.len() != field_count {
            self.minigame = minigame;
            self.fields = vec![String::new(); field_count];
            self.cursor = 0;
        }
    }

    pub fn press(&mut self, key: KeyCode) -> EntryKey {
        if matches!(key, KeyCode::Enter | KeyCode::NumpadEnter) {
            return EntryKey::Submit;
        }
        let count = self.fields.len();
        let Some(field) = self.fields.get_mut(self.cursor) else {
            return EntryKey::Ignored;
        };
        match key {
            KeyCode::Tab => self.cursor = (self.cursor + 1) % count,
            KeyCode::Backspace => {
                field.pop();
            }
            _ => match key_char(key) {
                Some(c) => field.push(c),
                None => return EntryKey::Ignored,
            },
        }
        EntryKey::Edited
    }

    /// Hands back the typed fields and starts over.
    pub fn take(&mut self) -> Vec<String> {
        self.cursor = 0;
        let count = self.fields.len();
        std::mem::replace(&mut self.fields, vec![String::new(); count])
    }

    fn field_line(&self, index: usize) -> String {
        let value = self.fields.get(index).map(String::as_str).unwrap_or("");
        if index == self.cursor {
            format!("{value}_")
        } else {
            value.to_string()
        }
    }
}

fn key_char(key: KeyCode) -> Option<char> {
    let c = match key {
        KeyCode::Digit0 | KeyCode::Numpad0 => '0',
        KeyCode::Digit1 | KeyCode::Numpad1 => '1',
        KeyCode::Digit2 | KeyCode::Numpad2 => '2',
        KeyCode::Digit3 | KeyCode::Numpad3 => '3',
        KeyCode::Digit4 | KeyCode::Numpad4 => '4',
        KeyCode::Digit5 | KeyCode::Numpad5 => '5',
        KeyCode::Digit6 | KeyCode::Numpad6 => '6',
        KeyCode::Digit7 | KeyCode::Numpad7 => '7',
        KeyCode::Digit8 | KeyCode::Numpad8 => '8',
        KeyCode::Digit9 | KeyCode::Numpad9 => '9',
        KeyCode::Period | KeyCode::NumpadDecimal => '.',
        _ => return None,
    };
    Some(c)
}

fn type_answer(
    keyboard: Res<ButtonInput<KeyCode>>,
    minigames: Query<(Entity, &MinigameController, &MinigameTask)>,
    mut entry: ResMut<AnswerEntry>,
    mut answers: MessageWriter<SubmitAnswer>,
) {
    let focused = minigames
        .iter()
        .find(|(_, controller, _)| controller.in_minigame());
    let Some((minigame, _, task)) = focused else {
        entry.focus(None, 0);
        return;
    };
    let field_count = match task {
        MinigameTask::Counting(_) => COUNTING_INGREDIENTS.len(),
        MinigameTask::Pricing(_) => 1,
        MinigameTask::Dishes(_) | MinigameTask::Peeling(_) => 0,
    };
    entry.focus(Some(minigame), field_count);

    for key in keyboard.get_just_pressed() {
        if entry.press(*key) != EntryKey::Submit {
            continue;
        }
        answers.write(SubmitAnswer {
            minigame,
            fields: entry.take(),
        });
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinigameTuning;
    use crate::progress::Progress;
    use crate::tasks::CountingTask;

    fn typed(entry: &mut AnswerEntry, keys: &[KeyCode]) -> Vec<EntryKey> {
        keys.iter().map(|key| entry.press(*key)).collect()
    }

    #[test]
    fn typing_fills_fields_and_tab_moves_between_them() {
        let mut entry = AnswerEntry::default();
        entry.focus(Some(Entity::PLACEHOLDER), 2);
        typed(
            &mut entry,
            &[KeyCode::Digit1, KeyCode::Digit2, KeyCode::Backspace, KeyCode::Tab],
        );
        typed(&mut entry, &[KeyCode::Numpad3, KeyCode::Period, KeyCode::Digit5]);

        assert_eq!(entry.press(KeyCode::Enter), EntryKey::Submit);
        assert_eq!(entry.take(), vec!["1".to_string(), "3.5".to_string()]);
        assert_eq!(entry.field_line(0), "_");
    }

    #[test]
    fn letters_are_ignored_and_refocus_clears_the_entry() {
        let mut entry = AnswerEntry::default();
        entry.focus(Some(Entity::PLACEHOLDER), 1);
        assert_eq!(entry.press(KeyCode::KeyQ), EntryKey::Ignored);
        entry.press(KeyCode::Digit7);

        entry.focus(Some(Entity::PLACEHOLDER), 1);
        assert_eq!(entry.field_line(0), "7_");
        entry.focus(None, 0);
        assert_eq!(entry.press(KeyCode::Digit7), EntryKey::Ignored);
        assert_eq!(entry.press(KeyCode::Enter), EntryKey::Submit);
    }

    #[test]
    fn countdown_shows_while_standing_in_a_closed_zone() {
        let id = Entity::PLACEHOLDER;
        let mut progress = Progress::default();
        let mut controller = MinigameController::new(
            0,
            MinigameTuning {
                cooldown: 10.0,
                ..default()
            },
        );
        controller.activate(id, &mut progress);
        controller.engage(id, &mut progress);
        controller.report_outcome(id, true, &mut progress);

        let mut zone = MinigameZone::new(Vec2::ONE);
        zone.set_player_inside(true);
        zone.exit();
        zone.set_trigger_enabled(false);
        zone.set_player_inside(true);

        let task = MinigameTask::Counting(CountingTask::default());
        let entry = AnswerEntry::default();
        assert_eq!(
            describe_minigame(&controller, &zone, &task, &entry),
            Some("Next order in 10s".to_string())
        );

        zone.set_player_inside(false);
        assert_eq!(describe_minigame(&controller, &zone, &task, &entry), None);
    }
}
