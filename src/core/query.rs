use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StatsEngineError};

/// Category of games queried upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeasonType {
    #[default]
    #[serde(rename = "Regular Season")]
    RegularSeason,
    #[serde(rename = "Playoffs")]
    Playoffs,
    #[serde(rename = "Pre Season")]
    PreSeason,
    #[serde(rename = "All Star")]
    AllStar,
    #[serde(rename = "PlayIn")]
    PlayIn,
}

impl SeasonType {
    /// Value sent to the stats provider
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::RegularSeason => "Regular Season",
            SeasonType::Playoffs => "Playoffs",
            SeasonType::PreSeason => "Pre Season",
            SeasonType::AllStar => "All Star",
            SeasonType::PlayIn => "PlayIn",
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonType {
    type Err = StatsEngineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match normalized.as_str() {
            "regular season" | "regular" | "regularseason" => Ok(SeasonType::RegularSeason),
            "playoffs" | "playoff" => Ok(SeasonType::Playoffs),
            "pre season" | "preseason" => Ok(SeasonType::PreSeason),
            "all star" | "allstar" => Ok(SeasonType::AllStar),
            "playin" | "play in" => Ok(SeasonType::PlayIn),
            _ => Err(StatsEngineError::Validation(format!(
                "unknown season_type '{}' (expected Regular Season, Playoffs, Pre Season, All Star or PlayIn)",
                s.trim()
            ))),
        }
    }
}

/// Season label in the provider's "YYYY-YY" form, e.g. "2023-24"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season(String);

impl Season {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = || {
            StatsEngineError::Validation(format!(
                "invalid season '{}' (expected format like 2023-24)",
                raw
            ))
        };

        let (start, end) = raw.split_once('-').ok_or_else(invalid)?;
        let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if start.len() != 4 || end.len() != 2 || !digits(start) || !digits(end) {
            return Err(invalid());
        }

        let start_year: u32 = start.parse().map_err(|_| invalid())?;
        let end_year: u32 = end.parse().map_err(|_| invalid())?;
        if (start_year + 1) % 100 != end_year {
            return Err(invalid());
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First calendar year of the season
    pub fn start_year(&self) -> i32 {
        self.0[..4].parse().unwrap_or_default()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Season {
    type Error = StatsEngineError;

    fn try_from(value: String) -> Result<Self> {
        Season::parse(&value)
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.0
    }
}

/// Composite cache key: everything that changes the upstream answer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    pub player_id: u32,
    pub season: Season,
    pub season_type: SeasonType,
    /// 0 = whole season
    pub last_n_games: u32,
}

impl QuerySignature {
    pub fn new(player_id: u32, season: Season, season_type: SeasonType, last_n_games: u32) -> Self {
        Self {
            player_id,
            season,
            season_type,
            last_n_games,
        }
    }
}

impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.player_id, self.season, self.season_type, self.last_n_games
        )
    }
}
