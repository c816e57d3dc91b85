//! Submission rules shared by the game client and the score server.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

pub const MAX_PLAYER_NAME_LEN: usize = 12;
pub const MAX_SCORE: u32 = 1_000_000_000;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 25;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
pub const MAX_LISTED_WEEKS: usize = 52;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mobile,
    Desktop,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

impl FromStr for Platform {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(Self::Mobile),
            "desktop" => Ok(Self::Desktop),
            _ => Err(ScoreError::InvalidPlatform),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Weekly,
    Alltime,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Alltime => "alltime",
        }
    }
}

impl FromStr for Scope {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "alltime" => Ok(Self::Alltime),
            _ => Err(ScoreError::InvalidScope),
        }
    }
}

/// Accepts 1..=12 characters drawn from `[A-Za-z0-9 _-]`.
pub fn validate_player_name(name: &str) -> Result<(), ScoreError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_PLAYER_NAME_LEN {
        return Err(ScoreError::InvalidName);
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-';
    if !name.chars().all(allowed) {
        return Err(ScoreError::InvalidName);
    }
    Ok(())
}

/// Accepts `0..=MAX_SCORE` and narrows to `u32`.
pub fn validate_score(score: i64) -> Result<u32, ScoreError> {
    if !(0..=i64::from(MAX_SCORE)).contains(&score) {
        return Err(ScoreError::InvalidScore);
    }
    Ok(score as u32)
}

/// Missing or zero limits fall back to the default; the rest clamp to `1..=100`.
pub fn clamp_leaderboard_limit(limit: Option<i64>) -> usize {
    match limit {
        None | Some(0) => DEFAULT_LEADERBOARD_LIMIT,
        Some(value) => value.clamp(1, MAX_LEADERBOARD_LIMIT as i64) as usize,
    }
}

/// Reads an optionally signed integer from the start of `raw`, ignoring
/// leading whitespace and anything after the digits: `"10abc"` is 10,
/// `"5.5"` is 5. `None` when no digit leads.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let mut value: i64 = 0;
    for digit in digits {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }
    if !seen {
        return None;
    }
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_name_rules() {
        assert_eq!(validate_player_name("Ann_Lee-01"), Ok(()));
        assert_eq!(validate_player_name("Jo Smith"), Ok(()));
        assert_eq!(validate_player_name("abcdefghijkl"), Ok(()));
        assert_eq!(validate_player_name(""), Err(ScoreError::InvalidName));
        assert_eq!(
            validate_player_name("abcdefghijklm"),
            Err(ScoreError::InvalidName)
        );
        assert_eq!(validate_player_name("Bad!Name"), Err(ScoreError::InvalidName));
        assert_eq!(validate_player_name("tab\tname"), Err(ScoreError::InvalidName));
        assert_eq!(validate_player_name("Zoë"), Err(ScoreError::InvalidName));
    }

    #[test]
    fn score_bounds_are_inclusive() {
        assert_eq!(validate_score(0), Ok(0));
        assert_eq!(validate_score(1_000_000_000), Ok(1_000_000_000));
        assert_eq!(validate_score(-1), Err(ScoreError::InvalidScore));
        assert_eq!(validate_score(1_000_000_001), Err(ScoreError::InvalidScore));
    }

    #[test]
    fn platform_and_scope_parse() {
        assert_eq!("mobile".parse::<Platform>(), Ok(Platform::Mobile));
        assert_eq!("desktop".parse::<Platform>(), Ok(Platform::Desktop));
        assert_eq!("tablet".parse::<Platform>(), Err(ScoreError::InvalidPlatform));
        assert_eq!("weekly".parse::<Scope>(), Ok(Scope::Weekly));
        assert_eq!("alltime".parse::<Scope>(), Ok(Scope::Alltime));
        assert_eq!("daily".parse::<Scope>(), Err(ScoreError::InvalidScope));
    }

    #[test]
    fn leaderboard_limit_clamps() {
        assert_eq!(clamp_leaderboard_limit(None), 25);
        assert_eq!(clamp_leaderboard_limit(Some(0)), 25);
        assert_eq!(clamp_leaderboard_limit(Some(-5)), 1);
        assert_eq!(clamp_leaderboard_limit(Some(10)), 10);
        assert_eq!(clamp_leaderboard_limit(Some(500)), 100);
    }

    #[test]
    fn leading_int_stops_at_first_non_digit() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("5.5"), Some(5));
        assert_eq!(parse_leading_int("10abc"), Some(10));
        assert_eq!(parse_leading_int("  -3x"), Some(-3));
        assert_eq!(parse_leading_int("+8"), Some(8));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), Some(i64::MAX));
    }
}
