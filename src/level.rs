// Lays out the ladder: floors, the stage camera and one zone per minigame.
use bevy::prelude::*;
use strum::IntoEnumIterator;

use crate::config::{LadderConfig, MinigameKind};
use crate::minigame::MinigameController;
use crate::stage::StageCamera;
use crate::tasks::{CountingTask, MinigameTask, PricingTask};
use crate::workload::{DishRack, PeelingBatch};
use crate::zone::MinigameZone;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::srgb(0.12, 0.1, 0.14)))
            .add_systems(Startup, (spawn_stage_camera, spawn_floors, spawn_minigames));
    }
}

/// World units visible per screen pixel.
const CAMERA_SCALE: f32 = 0.04;
const FLOOR_SIZE: Vec2 = Vec2::new(24.0, 12.0);
const ZONE_HALF_EXTENTS: Vec2 = Vec2::new(1.5, 1.5);

fn camera_projection() -> Projection {
    Projection::from(OrthographicProjection {
        scale: CAMERA_SCALE,
        ..OrthographicProjection::default_2d()
    })
}

fn spawn_stage_camera(mut commands: Commands, config: Res<LadderConfig>) {
    let start_y = config.stage_heights.first().copied().unwrap_or_default();
    commands.spawn((
        StageCamera,
        Camera2d,
        Camera {
            order: 1,
            ..default()
        },
        camera_projection(),
        Transform::from_xyz(0.0, start_y, 0.0),
    ));
}

fn spawn_floors(mut commands: Commands, config: Res<LadderConfig>) {
    for (index, height) in config.stage_heights.iter().enumerate() {
        let shade = 0.2 + 0.1 * index as f32;
        commands.spawn((
            Name::new(format!("Floor {index}")),
            Sprite::from_color(Color::srgb(shade, shade * 0.9, shade * 0.8), FLOOR_SIZE),
            Transform::from_xyz(0.0, *height - 2.0, -1.0),
        ));
    }
}

fn spawn_minigames(mut commands: Commands, config: Res<LadderConfig>) {
    let mut rng = rand::rng();

    for kind in MinigameKind::iter() {
        let position = kind.zone_position(&config);
        let label: &'static str = kind.into();

        let camera = commands
            .spawn((
                Name::new(format!("{label} camera")),
                Camera2d,
                Camera {
                    is_active: false,
                    order: 0,
                    ..default()
                },
                camera_projection(),
                Transform::from_xyz(position.x, position.y, 0.0),
            ))
            .id();

        let task = match kind {
            MinigameKind::Counting => MinigameTask::Counting(CountingTask::generate(&mut rng)),
            MinigameKind::Pricing => MinigameTask::Pricing(PricingTask::generate(&mut rng)),
            MinigameKind::Peeling => MinigameTask::Peeling(PeelingBatch::default()),
            MinigameKind::Dishes => MinigameTask::Dishes(DishRack::new(&mut rng)),
        };

        commands.spawn((
            Name::new(label),
            MinigameController::new(kind.level_index(), kind.tuning()),
            MinigameZone::new(ZONE_HALF_EXTENTS).with_camera(camera),
            task,
            Sprite::from_color(Color::srgba(0.9, 0.9, 1.0, 0.25), ZONE_HALF_EXTENTS * 2.0),
            Transform::from_translation(position.extend(-0.5)),
        ));
    }
}
