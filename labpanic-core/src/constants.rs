// Tuning constants for Lab Panic.
// Times are milliseconds, distances are play-area pixels.

// Difficulty progression
pub const LEVEL_PERIOD_MS: f64 = 30_000.0;
pub const DIFFICULTY_BASE: f32 = 1.0;
pub const DIFFICULTY_STEP_PER_LEVEL: f32 = 0.5;
pub const SPAWN_INTERVAL_START_MS: f64 = 2_000.0;
pub const SPAWN_INTERVAL_STEP_MS: f64 = 300.0;
pub const SPAWN_INTERVAL_MIN_MS: f64 = 500.0;
pub const MAX_OBJECTS_START: usize = 3;
pub const MAX_OBJECTS_CAP: usize = 6;
// One extra concurrent object every N levels.
pub const MAX_OBJECTS_LEVELS_PER_STEP: u32 = 2;

// Falling objects
pub const OBJECT_RADIUS: f32 = 25.0;
pub const OBJECT_BASE_SPEED: f32 = 100.0; // px/s
pub const OBJECT_SPEED_SCALE: f32 = 50.0; // px/s per difficulty unit
pub const OBJECT_SPAWN_Y: f32 = -50.0;
// Objects are culled once they fall this far below the play area.
pub const OBJECT_CULL_OVERSHOOT: f32 = 50.0;
pub const OBJECT_ROTATION_SPEED_MAX: f32 = 1.0; // rad/s, symmetric

// Kind bands for the spawn draw, as cumulative thresholds on U[0,1).
pub const POWERUP_BAND: f32 = 0.05;
pub const HAZARDOUS_BAND: f32 = 0.30;

// Scoring and lives
pub const SCORE_BENIGN: u32 = 10;
pub const SCORE_HAZARDOUS: u32 = 5;
pub const STARTING_LIVES: u32 = 3;
pub const SCORE_MULTIPLIER: u32 = 2;

// Particles. Speeds are px/s; gravity and decay are applied once per tick.
pub const BURST_PARTICLE_COUNT: usize = 8;
pub const PARTICLE_SPEED_MIN: f32 = 120.0; // 2 px/frame at 60 fps
pub const PARTICLE_SPEED_SPREAD: f32 = 180.0; // 3 px/frame at 60 fps
pub const PARTICLE_GRAVITY_PER_TICK: f32 = 6.0;
pub const PARTICLE_DECAY_PER_TICK: f32 = 0.02;

// Ground residue left where a hazardous object lands.
pub const GROUND_RESIDUE_LIFETIME_MS: f64 = 3_000.0;

// Power-up durations
pub const SLOW_TIME_DURATION_MS: f64 = 5_000.0;
pub const CLEAR_BOARD_DURATION_MS: f64 = 1_000.0;
pub const SCORE_MULTIPLIER_DURATION_MS: f64 = 10_000.0;

// Frame pacing
pub const MAX_TICK_MS: f64 = 100.0;
