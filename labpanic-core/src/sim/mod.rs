use serde::Serialize;

use crate::constants::{
    BURST_PARTICLE_COUNT, CLEAR_BOARD_DURATION_MS, GROUND_RESIDUE_LIFETIME_MS, HAZARDOUS_BAND,
    MAX_TICK_MS, OBJECT_CULL_OVERSHOOT, OBJECT_RADIUS, OBJECT_ROTATION_SPEED_MAX,
    OBJECT_SPAWN_Y, PARTICLE_DECAY_PER_TICK, PARTICLE_GRAVITY_PER_TICK, PARTICLE_SPEED_MIN,
    PARTICLE_SPEED_SPREAD, POWERUP_BAND, SCORE_BENIGN, SCORE_HAZARDOUS, SCORE_MULTIPLIER,
    SCORE_MULTIPLIER_DURATION_MS, SLOW_TIME_DURATION_MS, STARTING_LIVES,
};
use crate::rng::SeededRng;

mod difficulty;
pub mod driver;
mod game;
mod powerup;

pub use difficulty::{
    difficulty_factor, difficulty_level, max_objects, object_speed, spawn_interval_ms, Difficulty,
};
pub use game::Game;
pub use powerup::{PowerupKind, PowerupState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menu,
    Playing,
    Paused,
    Over,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Benign,
    Hazardous,
    Powerup,
}

impl ObjectKind {
    /// Points credited when the object is destroyed by a hit or a board clear.
    #[inline]
    pub fn points(self) -> u32 {
        match self {
            Self::Benign => SCORE_BENIGN,
            Self::Hazardous => SCORE_HAZARDOUS,
            Self::Powerup => 0,
        }
    }

    /// Maps a uniform draw in `[0, 1)` onto the three spawn bands.
    #[inline]
    pub fn from_draw(draw: f32) -> Self {
        if draw < POWERUP_BAND {
            Self::Powerup
        } else if draw < HAZARDOUS_BAND {
            Self::Hazardous
        } else {
            Self::Benign
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FallingObject {
    pub id: u32,
    pub kind: ObjectKind,
    pub x: f32,
    pub y: f32,
    /// Downward speed in px/s, fixed at spawn time.
    pub speed: f32,
    pub radius: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Normalized remaining life; the particle is culled at or below zero.
    pub life: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroundResidue {
    pub x: f32,
    pub remaining_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
}

impl PlayArea {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Objects need a full diameter of horizontal room to spawn.
    #[inline]
    fn can_spawn(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > OBJECT_RADIUS * 2.0
    }

    #[inline]
    fn lower_bound(&self) -> f32 {
        self.height + OBJECT_CULL_OVERSHOOT
    }
}

/// Pointer or touch state sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub pressed: bool,
}

impl PointerState {
    pub fn pressed_at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            pressed: true,
        }
    }

    pub fn released() -> Self {
        Self::default()
    }
}

/// Something that happened during a tick, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    ObjectSpawned { id: u32, kind: ObjectKind },
    ObjectHit { id: u32, kind: ObjectKind, points: u32 },
    BoardCleared { objects: usize, points: u32 },
    PowerupActivated { kind: PowerupKind },
    PowerupExpired { kind: PowerupKind },
    LifeLost { lives: u32 },
    GameOver { final_score: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PowerupSnapshot {
    pub kind: PowerupKind,
    pub remaining_ms: f64,
    pub remaining_secs: u32,
}

/// Read-only view of the world handed to a renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub phase: Phase,
    pub score: u32,
    pub display_score: u32,
    pub lives: u32,
    pub elapsed_ms: f64,
    pub difficulty: Difficulty,
    pub powerup: Option<PowerupSnapshot>,
    pub play_area: PlayArea,
    pub objects: Vec<FallingObject>,
    pub particles: Vec<Particle>,
    pub residues: Vec<GroundResidue>,
}

/// Clamps a raw frame delta into `[0, MAX_TICK_MS]`. Non-finite deltas become 0.
#[inline]
pub fn clamp_tick_ms(delta_ms: f64) -> f64 {
    if delta_ms.is_finite() {
        delta_ms.clamp(0.0, MAX_TICK_MS)
    } else {
        0.0
    }
}
