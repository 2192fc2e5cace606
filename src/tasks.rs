// Built-in minigame tasks and the answer check that turns a submission into an outcome.
use std::collections::HashMap;

use bevy::prelude::*;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::LadderSet;
use crate::minigame::{MinigameController, MinigameOutcome};
use crate::workload::{DishRack, PeelingBatch};

pub struct TasksPlugin;

impl Plugin for TasksPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SubmitAnswer>().add_systems(
            Update,
            check_answers
                .in_set(LadderSet::Minigames)
                .before(crate::minigame::resolve_outcomes),
        );
    }
}

/// Text the player typed into the minigame's input fields.
#[derive(Message, Clone, Debug)]
pub struct SubmitAnswer {
    pub minigame: Entity,
    pub fields: Vec<String>,
}

#[derive(Component, Debug, Clone)]
pub enum MinigameTask {
    Counting(CountingTask),
    Pricing(PricingTask),
    /// Each submission scrubs one plate.
    Dishes(DishRack),
    /// Each submission peels one potato.
    Peeling(PeelingBatch),
}

impl MinigameTask {
    pub fn regenerate(&mut self, rng: &mut impl Rng) {
        match self {
            MinigameTask::Counting(task) => *task = CountingTask::generate(rng),
            MinigameTask::Pricing(task) => *task = PricingTask::generate(rng),
            MinigameTask::Dishes(_) | MinigameTask::Peeling(_) => {}
        }
    }

    /// Called when the minigame's stage becomes current.
    pub fn on_activate(&mut self) {
        if let MinigameTask::Peeling(batch) = self {
            batch.restart();
        }
    }

    /// `None` for workload tasks, which have nothing to get right.
    pub fn check(&self, fields: &[String]) -> Option<bool> {
        match self {
            MinigameTask::Counting(task) => Some(task.check(fields)),
            MinigameTask::Pricing(task) => Some(task.check(fields)),
            MinigameTask::Dishes(_) | MinigameTask::Peeling(_) => None,
        }
    }
}

pub const COUNTING_INGREDIENTS: [&str; 4] = ["Tomato", "Onion", "Carrot", "Potato"];
const MIN_ITEMS: usize = 4;
const MAX_ITEMS: usize = 10;

/// A random pile of ingredients the player has to count.
#[derive(Debug, Clone, Default)]
pub struct CountingTask {
    /// Ingredient index of every item laid out, in layout order.
    layout: Vec<usize>,
    counts: [u32; COUNTING_INGREDIENTS.len()],
}

impl CountingTask {
    pub fn generate(rng: &mut impl Rng) -> Self {
        let item_count = rng.random_range(MIN_ITEMS..=MAX_ITEMS);
        let layout: Vec<usize> = (0..item_count)
            .map(|_| rng.random_range(0..COUNTING_INGREDIENTS.len()))
            .collect();
        Self::from_layout(layout)
    }

    pub fn from_layout(layout: Vec<usize>) -> Self {
        let mut counts = [0; COUNTING_INGREDIENTS.len()];
        for &ingredient in &layout {
            if let Some(count) = counts.get_mut(ingredient) {
                *count += 1;
            }
        }
        Self { layout, counts }
    }

    pub fn layout(&self) -> &[usize] {
        &self.layout
    }

    #[cfg(test)]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Field `i` is the count for ingredient `i`. Blank or missing fields
    /// mean zero; anything that isn't a number is wrong.
    pub fn check(&self, fields: &[String]) -> bool {
        self.counts.iter().enumerate().all(|(index, &correct)| {
            let input = fields.get(index).map(|field| field.trim()).unwrap_or("");
            if input.is_empty() {
                return correct == 0;
            }
            input.parse::<u32>().is_ok_and(|count| count == correct)
        })
    }
}

pub static PANTRY: [&str; 15] = [
    "Tomato",
    "Onion",
    "Carrot",
    "Potato",
    "Garlic",
    "Chicken Breast",
    "Beef Steak",
    "Salmon Fillet",
    "Apple",
    "Banana",
    "Lettuce",
    "Cucumber",
    "Flour",
    "Sugar",
    "Salt",
];

struct Dish {
    name: &'static str,
    required: &'static [&'static str],
}

static DISHES: [Dish; 4] = [
    Dish {
        name: "Garden Salad",
        required: &["Lettuce", "Tomato", "Cucumber"],
    },
    Dish {
        name: "Steak Frites",
        required: &["Beef Steak", "Potato", "Salt"],
    },
    Dish {
        name: "Roast Chicken",
        required: &["Chicken Breast", "Garlic", "Onion"],
    },
    Dish {
        name: "Apple Pie",
        required: &["Apple", "Flour", "Sugar"],
    },
];

const MAX_EXTRAS: usize = 2;
const PRICE_TOLERANCE: f32 = 0.01;

fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Price a dish from the ingredient prices on the sticky notes.
#[derive(Debug, Clone)]
pub struct PricingTask {
    dish: &'static str,
    ingredients: Vec<&'static str>,
    prices: HashMap<&'static str, f32>,
    total: f32,
}

impl PricingTask {
    pub fn generate(rng: &mut impl Rng) -> Self {
        let prices: HashMap<&'static str, f32> = PANTRY
            .iter()
            .map(|&ingredient| (ingredient, round_tenth(rng.random_range(1.0..10.0))))
            .collect();

        let dish = DISHES.choose(rng).unwrap_or(&DISHES[0]);
        let mut ingredients: Vec<&'static str> = dish.required.to_vec();
        for _ in 0..rng.random_range(0..=MAX_EXTRAS) {
            if let Some(&extra) = PANTRY.choose(rng) {
                if !ingredients.contains(&extra) {
                    ingredients.push(extra);
                }
            }
        }
        ingredients.shuffle(rng);

        let total = round_tenth(
            ingredients
                .iter()
                .map(|ingredient| prices.get(ingredient).copied().unwrap_or_default())
                .sum(),
        );
        debug!("PRICING: {} totals {total}", dish.name);

        Self {
            dish: dish.name,
            ingredients,
            prices,
            total,
        }
    }

    pub fn dish(&self) -> &str {
        self.dish
    }

    pub fn ingredients(&self) -> &[&'static str] {
        &self.ingredients
    }

    pub fn price(&self, ingredient: &str) -> Option<f32> {
        self.prices.get(ingredient).copied()
    }

    #[cfg(test)]
    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn check(&self, fields: &[String]) -> bool {
        fields
            .first()
            .and_then(|field| field.trim().parse::<f32>().ok())
            .is_some_and(|answer| (answer - self.total).abs() < PRICE_TOLERANCE)
    }
}

fn check_answers(
    mut answers: MessageReader<SubmitAnswer>,
    minigames: Query<(&MinigameController, &MinigameTask)>,
    mut outcomes: MessageWriter<MinigameOutcome>,
) {
    for answer in answers.read() {
        let Ok((controller, task)) = minigames.get(answer.minigame) else {
            continue;
        };
        if !controller.in_minigame() {
            debug!("TASK: answer for {} ignored, not engaged", answer.minigame);
            continue;
        }
        if let Some(success) = task.check(&answer.fields) {
            outcomes.write(MinigameOutcome {
                minigame: answer.minigame,
                success,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn counting_layout_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let task = CountingTask::generate(&mut rng);
            assert!((MIN_ITEMS..=MAX_ITEMS).contains(&task.layout().len()));
            let total: u32 = task.counts().iter().sum();
            assert_eq!(total as usize, task.layout().len());
        }
    }

    #[test]
    fn counting_blank_field_means_zero() {
        let task = CountingTask::from_layout(vec![0, 0, 2, 2, 2]);
        assert!(task.check(&fields(&["2", "", " 3 ", "0"])));
        assert!(task.check(&fields(&["2", "0", "3"])));
        assert!(!task.check(&fields(&["2", "", "", ""])));
    }

    #[test]
    fn counting_garbage_is_a_wrong_answer() {
        let task = CountingTask::from_layout(vec![1]);
        assert!(!task.check(&fields(&["", "one", "", ""])));
        assert!(!task.check(&fields(&["", "-1", "", ""])));
        assert!(task.check(&fields(&["", "1", "", ""])));
    }

    #[test]
    fn pricing_total_matches_listed_prices() {
        let mut rng = StdRng::seed_from_u64(3);
        let task = PricingTask::generate(&mut rng);
        let sum: f32 = task
            .ingredients()
            .iter()
            .filter_map(|ingredient| task.price(ingredient))
            .sum();
        assert!((round_tenth(sum) - task.total()).abs() < 1e-4);
        assert!(task.ingredients().len() >= 3);
    }

    #[test]
    fn pricing_accepts_within_tolerance_only() {
        let mut rng = StdRng::seed_from_u64(11);
        let task = PricingTask::generate(&mut rng);
        let exact = format!("{:.1}", task.total());
        assert!(task.check(&[exact]));
        assert!(!task.check(&[format!("{:.1}", task.total() + 0.5)]));
        assert!(!task.check(&fields(&["twelve"])));
        assert!(!task.check(&[]));
    }

    #[test]
    fn workload_tasks_have_no_check() {
        let peeling = MinigameTask::Peeling(PeelingBatch::default());
        assert_eq!(peeling.check(&fields(&["1"])), None);
    }

    #[test]
    fn activation_restarts_the_peeling_countdown() {
        let mut batch = PeelingBatch::default();
        batch.tick(crate::workload::NEXT_BATCH_DELAY);
        let mut task = MinigameTask::Peeling(batch);
        task.on_activate();
        match task {
            MinigameTask::Peeling(batch) => {
                assert_eq!(batch.left(), 0);
                assert!(batch.countdown().is_some());
            }
            other => panic!("unexpected task {other:?}"),
        }
    }
}
