//! Difficulty curve. Every value is a pure function of elapsed play time and
//! is recomputed each tick, so pausing and resuming cannot skew it.

use serde::Serialize;

use crate::constants::{
    DIFFICULTY_BASE, DIFFICULTY_STEP_PER_LEVEL, LEVEL_PERIOD_MS, MAX_OBJECTS_CAP,
    MAX_OBJECTS_LEVELS_PER_STEP, MAX_OBJECTS_START, OBJECT_BASE_SPEED, OBJECT_SPEED_SCALE,
    SPAWN_INTERVAL_MIN_MS, SPAWN_INTERVAL_START_MS, SPAWN_INTERVAL_STEP_MS,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Difficulty {
    pub level: u32,
    pub factor: f32,
    pub spawn_interval_ms: f64,
    pub max_objects: usize,
}

impl Difficulty {
    pub fn at(elapsed_ms: f64) -> Self {
        let level = difficulty_level(elapsed_ms);
        Self {
            level,
            factor: difficulty_factor(level),
            spawn_interval_ms: spawn_interval_ms(level),
            max_objects: max_objects(level),
        }
    }

    #[inline]
    pub fn object_speed(&self) -> f32 {
        object_speed(self.factor)
    }
}

/// `floor(elapsed / 30s)`. Negative or non-finite time counts as level 0.
#[inline]
pub fn difficulty_level(elapsed_ms: f64) -> u32 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0;
    }
    let level = (elapsed_ms / LEVEL_PERIOD_MS).floor();
    if level >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        level as u32
    }
}

#[inline]
pub fn difficulty_factor(level: u32) -> f32 {
    DIFFICULTY_BASE + level as f32 * DIFFICULTY_STEP_PER_LEVEL
}

#[inline]
pub fn spawn_interval_ms(level: u32) -> f64 {
    (SPAWN_INTERVAL_START_MS - f64::from(level) * SPAWN_INTERVAL_STEP_MS).max(SPAWN_INTERVAL_MIN_MS)
}

#[inline]
pub fn max_objects(level: u32) -> usize {
    let extra = (level / MAX_OBJECTS_LEVELS_PER_STEP) as usize;
    MAX_OBJECTS_START.saturating_add(extra).min(MAX_OBJECTS_CAP)
}

#[inline]
pub fn object_speed(factor: f32) -> f32 {
    OBJECT_BASE_SPEED + factor * OBJECT_SPEED_SCALE
}
