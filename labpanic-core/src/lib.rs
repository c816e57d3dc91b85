pub mod constants;
pub mod error;
pub mod leaderboard;
pub mod rng;
pub mod rules;
pub mod sim;

pub use error::ScoreError;
pub use rules::{validate_player_name, validate_score, Platform, Scope};
pub use sim::{Game, GameEvent, Phase, PointerState, WorldSnapshot};
