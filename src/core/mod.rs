pub mod game_log;
pub mod player;
pub mod query;
pub mod stats_response;

pub use game_log::GameLogRow;
pub use player::PlayerIdentity;
pub use query::{QuerySignature, Season, SeasonType};
pub use stats_response::{DataOrigin, GameLogResponse};
