use labpanic_core::sim::{FallingObject, ObjectKind, PlayArea};
use labpanic_core::{Game, GameEvent, Phase, PointerState};

const FRAME_MS: f64 = 1_000.0 / 60.0;
const MAX_FRAMES: usize = 60 * 60 * 20;

/// Presses on the lowest visible object within `reach` each frame. With
/// `spare_hazards` the bot leaves hazardous objects alone.
fn bot_pointer(objects: &[FallingObject], reach: f32, spare_hazards: bool) -> PointerState {
    objects
        .iter()
        .filter(|object| object.y >= 0.0 && object.y <= reach)
        .filter(|object| !(spare_hazards && object.kind == ObjectKind::Hazardous))
        .max_by(|a, b| a.y.total_cmp(&b.y))
        .map(|object| PointerState::pressed_at(object.x, object.y))
        .unwrap_or_else(PointerState::released)
}

struct RunSummary {
    frames: usize,
    final_score: Option<u32>,
    events: Vec<GameEvent>,
    rng_state: u32,
}

fn play(seed: u32, reach: f32) -> (Game, RunSummary) {
    play_with(seed, reach, false)
}

fn play_with(seed: u32, reach: f32, spare_hazards: bool) -> (Game, RunSummary) {
    let mut game = Game::new(seed, PlayArea::new(480.0, 640.0));
    game.start();

    let mut events = Vec::new();
    let mut frames = 0;
    while game.phase() == Phase::Playing && frames < MAX_FRAMES {
        let pointer = bot_pointer(game.objects(), reach, spare_hazards);
        events.extend(game.step(FRAME_MS, pointer));
        frames += 1;
    }

    let final_score = events.iter().find_map(|event| match event {
        GameEvent::GameOver { final_score } => Some(*final_score),
        _ => None,
    });
    let rng_state = game.rng_state();
    (
        game,
        RunSummary {
            frames,
            final_score,
            events,
            rng_state,
        },
    )
}

#[test]
fn idle_player_loses_to_hazards() {
    let (game, summary) = play(2024, -1.0);

    assert_eq!(game.phase(), Phase::Over);
    assert_eq!(game.lives(), 0);
    assert_eq!(summary.final_score, Some(0));
    let lives_lost = summary
        .events
        .iter()
        .filter(|event| matches!(event, GameEvent::LifeLost { .. }))
        .count();
    assert_eq!(lives_lost, 3);
    assert!(summary.frames < MAX_FRAMES);
}

#[test]
fn same_seed_replays_identically() {
    let (first_game, first) = play(77, 500.0);
    let (second_game, second) = play(77, 500.0);

    assert_eq!(first.frames, second.frames);
    assert_eq!(first.events, second.events);
    assert_eq!(first.rng_state, second.rng_state);
    assert_eq!(first_game.snapshot(), second_game.snapshot());
}

#[test]
fn active_player_outscores_idle_player() {
    let (_, idle) = play(9, -1.0);
    let (game, active) = play(9, 600.0);

    let hits = active
        .events
        .iter()
        .filter(|event| matches!(event, GameEvent::ObjectHit { .. }))
        .count();
    assert!(hits > 0);
    assert!(game.score() > 0);
    assert!(active.frames >= idle.frames);
}

#[test]
fn game_over_is_reported_once_with_the_final_score() {
    let (game, summary) = play_with(31337, 600.0, true);
    assert_eq!(game.phase(), Phase::Over);

    let overs: Vec<u32> = summary
        .events
        .iter()
        .filter_map(|event| match event {
            GameEvent::GameOver { final_score } => Some(*final_score),
            _ => None,
        })
        .collect();
    assert_eq!(overs, vec![game.score()]);
    assert!(matches!(summary.events.last(), Some(GameEvent::GameOver { .. })));
}

#[test]
fn hazard_residue_and_scores_follow_kind() {
    let (_, summary) = play(5150, 600.0);
    for event in &summary.events {
        if let GameEvent::ObjectHit { kind, points, .. } = event {
            let expected = match kind {
                ObjectKind::Benign => 10,
                ObjectKind::Hazardous => 5,
                ObjectKind::Powerup => 0,
            };
            assert_eq!(*points, expected);
        }
    }
}

#[test]
fn snapshot_serializes_for_renderers() {
    let mut game = Game::new(1, PlayArea::new(320.0, 480.0));
    game.start();
    for _ in 0..150 {
        game.step(FRAME_MS, PointerState::released());
    }

    let json = serde_json::to_value(game.snapshot()).expect("snapshot serializes");
    assert_eq!(json["phase"], "playing");
    assert_eq!(json["lives"], 3);
    assert_eq!(json["display_score"], 0);
    assert!(json["powerup"].is_null());
    assert!(json["objects"].as_array().is_some_and(|objects| !objects.is_empty()));
    assert!(json["objects"][0]["kind"].is_string());

    let event = serde_json::to_value(GameEvent::LifeLost { lives: 2 }).expect("event serializes");
    assert_eq!(event["type"], "life_lost");
    assert_eq!(event["lives"], 2);
}
