use serde::{Deserialize, Serialize, Serializer};

/// One game's boxscore line, projected to the stable output schema.
///
/// Field names on the wire follow the upstream column names so cached and
/// fresh responses serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameLogRow {
    /// Game date (YYYY-MM-DD)
    #[serde(rename = "GAME_DATE")]
    pub game_date: String,

    /// Matchup, e.g. "PHI vs. BOS" or "PHI @ NYK"
    #[serde(rename = "MATCHUP")]
    pub matchup: String,

    #[serde(rename = "PTS")]
    pub points: u32,

    #[serde(rename = "REB")]
    pub rebounds: u32,

    #[serde(rename = "AST")]
    pub assists: u32,

    #[serde(rename = "BLK")]
    pub blocks: u32,

    #[serde(rename = "STL")]
    pub steals: u32,

    /// Minutes played (decimal; whole minutes go out as integers)
    #[serde(rename = "MIN", serialize_with = "serialize_minutes")]
    pub minutes: f64,

    /// "W" or "L"; null while a game is in progress
    #[serde(rename = "WL")]
    pub win_loss: Option<String>,

    /// Field goal percentage (0-100)
    #[serde(rename = "FG_PCT", default, skip_serializing_if = "Option::is_none")]
    pub field_goal_pct: Option<f64>,

    /// Three point percentage (0-100)
    #[serde(rename = "FG3_PCT", default, skip_serializing_if = "Option::is_none")]
    pub three_point_pct: Option<f64>,

    /// Free throw percentage (0-100)
    #[serde(rename = "FT_PCT", default, skip_serializing_if = "Option::is_none")]
    pub free_throw_pct: Option<f64>,
}

fn serialize_minutes<S: Serializer>(minutes: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if minutes.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(minutes) {
        serializer.serialize_u32(*minutes as u32)
    } else {
        serializer.serialize_f64(*minutes)
    }
}

impl GameLogRow {
    pub fn is_win(&self) -> bool {
        self.win_loss.as_deref() == Some("W")
    }

    /// Home game when the matchup reads "TEAM vs. OPP"
    pub fn is_home(&self) -> bool {
        self.matchup.contains("vs.")
    }
}
