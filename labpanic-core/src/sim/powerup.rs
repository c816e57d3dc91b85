use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    SlowTime,
    ClearBoard,
    ScoreMultiplier,
}

impl PowerupKind {
    pub const ALL: [Self; 3] = [Self::SlowTime, Self::ClearBoard, Self::ScoreMultiplier];

    #[inline]
    pub fn duration_ms(self) -> f64 {
        match self {
            Self::SlowTime => SLOW_TIME_DURATION_MS,
            Self::ClearBoard => CLEAR_BOARD_DURATION_MS,
            Self::ScoreMultiplier => SCORE_MULTIPLIER_DURATION_MS,
        }
    }

    pub(super) fn draw(rng: &mut SeededRng) -> Self {
        Self::ALL[rng.next_int(Self::ALL.len() as u32) as usize]
    }
}

/// At most one effect is active. A new activation replaces the current one.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PowerupState {
    active: Option<(PowerupKind, f64)>,
}

impl PowerupState {
    pub fn activate(&mut self, kind: PowerupKind) {
        self.active = Some((kind, kind.duration_ms()));
    }

    /// Counts the timer down and returns the kind that expired on this tick.
    pub fn tick(&mut self, dt_ms: f64) -> Option<PowerupKind> {
        let (kind, remaining) = self.active.as_mut()?;
        *remaining -= dt_ms;
        if *remaining <= 0.0 {
            let expired = *kind;
            self.active = None;
            return Some(expired);
        }
        None
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    #[inline]
    pub fn active(&self) -> Option<PowerupKind> {
        self.active.map(|(kind, _)| kind)
    }

    #[inline]
    pub fn remaining_ms(&self) -> f64 {
        self.active.map_or(0.0, |(_, remaining)| remaining)
    }

    /// Whole seconds left, rounded up, for countdown displays.
    #[inline]
    pub fn remaining_secs_ceil(&self) -> u32 {
        (self.remaining_ms() / 1_000.0).ceil().max(0.0) as u32
    }

    /// Multiplier applied to the displayed score only.
    #[inline]
    pub fn score_multiplier(&self) -> u32 {
        if self.active() == Some(PowerupKind::ScoreMultiplier) {
            SCORE_MULTIPLIER
        } else {
            1
        }
    }

    pub(super) fn snapshot(&self) -> Option<PowerupSnapshot> {
        self.active.map(|(kind, remaining_ms)| PowerupSnapshot {
            kind,
            remaining_ms,
            remaining_secs: self.remaining_secs_ceil(),
        })
    }
}
