//! Xorshift32 PRNG used for every random draw in the simulation.
//!
//! Spawn kind, spawn position, power-up kind, rotation speed and particle
//! burst speed all come from one stream, so a seed plus a sequence of tick
//! inputs fully determines a run.

#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.state
    }

    pub fn next_int(&mut self, max: u32) -> u32 {
        debug_assert!(max > 0);
        self.next() % max
    }

    /// Uniform f32 in `[0, 1)`. Uses the top 24 bits so every value is exact.
    pub fn next_unit(&mut self) -> f32 {
        (self.next() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform f32 in `[min, max_exclusive)`.
    pub fn next_range_f32(&mut self, min: f32, max_exclusive: f32) -> f32 {
        min + self.next_unit() * (max_exclusive - min)
    }
}
