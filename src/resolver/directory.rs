use std::path::Path;

use crate::core::PlayerIdentity;
use crate::error::{Result, StatsEngineError};
use crate::resolver::fuzzy::{self, Suggestion};
use crate::resolver::normalize_name;

/// Well-known players and their stats provider IDs, in lookup order
const KNOWN_PLAYERS: &[(&str, u32)] = &[
    ("LeBron James", 2544),
    ("Stephen Curry", 201939),
    ("Kevin Durant", 201142),
    ("Luka Doncic", 1629029),
    ("Giannis Antetokounmpo", 203507),
    ("Nikola Jokic", 203999),
    ("Joel Embiid", 203954),
    ("Jayson Tatum", 1628369),
    ("Ja Morant", 1629630),
    ("Devin Booker", 1626164),
    ("Trae Young", 1629027),
    ("Donovan Mitchell", 1628378),
    ("Anthony Davis", 203076),
    ("Damian Lillard", 203081),
    ("Jimmy Butler", 202710),
    ("Paul George", 202331),
    ("Kawhi Leonard", 202695),
    ("Kyrie Irving", 202681),
    ("Anthony Edwards", 1630162),
    ("Shai Gilgeous Alexander", 1628983),
    ("Victor Wembanyama", 1641705),
];

#[derive(Debug, Clone)]
struct DirectoryEntry {
    key: String,
    player: PlayerIdentity,
}

/// Static directory of players used to resolve free-text names.
///
/// Iteration order is insertion order; partial matches resolve to the
/// first entry encountered.
#[derive(Debug, Clone)]
pub struct PlayerDirectory {
    entries: Vec<DirectoryEntry>,
}

impl PlayerDirectory {
    /// Build a directory; later duplicates of a normalized name are ignored
    pub fn new(players: impl IntoIterator<Item = PlayerIdentity>) -> Self {
        let mut entries: Vec<DirectoryEntry> = Vec::new();

        for player in players {
            let key = normalize_name(&player.name);
            if key.is_empty() || entries.iter().any(|e| e.key == key) {
                tracing::debug!("Skipping duplicate or blank directory entry: {}", player);
                continue;
            }
            entries.push(DirectoryEntry { key, player });
        }

        Self { entries }
    }

    /// Built-in directory of well-known players
    pub fn known_players() -> Self {
        Self::new(
            KNOWN_PLAYERS
                .iter()
                .map(|(name, id)| PlayerIdentity::new(*id, *name)),
        )
    }

    /// Load from a JSON array of `{ "id": .., "full_name": .. }` objects
    pub fn from_json_str(json: &str) -> Result<Self> {
        let players: Vec<PlayerIdentity> = serde_json::from_str(json)?;
        Ok(Self::new(players))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            StatsEngineError::Config(format!("cannot read players file {}: {}", path.display(), e))
        })?;

        let directory = Self::from_json_str(&json)?;
        tracing::info!("📇 Loaded {} players from {}", directory.len(), path.display());
        Ok(directory)
    }

    /// Exact match first, then substring in either direction
    pub fn find(&self, name: &str) -> Option<&PlayerIdentity> {
        let query = normalize_name(name);
        if query.is_empty() {
            return None;
        }

        if let Some(entry) = self.entries.iter().find(|e| e.key == query) {
            return Some(&entry.player);
        }

        self.entries
            .iter()
            .find(|e| e.key.contains(&query) || query.contains(&e.key))
            .map(|e| &e.player)
    }

    /// Resolve a name or fail with `PlayerNotFound` (with suggestions when any)
    pub fn resolve(&self, name: &str) -> Result<PlayerIdentity> {
        if let Some(player) = self.find(name) {
            return Ok(player.clone());
        }

        let suggestions = self.suggest(name, 3);
        let message = if suggestions.is_empty() {
            name.trim().to_string()
        } else {
            let names: Vec<&str> = suggestions.iter().map(|s| s.player.name.as_str()).collect();
            format!("{} (did you mean: {}?)", name.trim(), names.join(", "))
        };

        Err(StatsEngineError::PlayerNotFound(message))
    }

    /// Closest directory names by fuzzy similarity
    pub fn suggest(&self, name: &str, limit: usize) -> Vec<Suggestion> {
        let query = normalize_name(name);
        if query.is_empty() {
            return Vec::new();
        }

        fuzzy::rank(
            &query,
            self.entries.iter().map(|e| (e.key.as_str(), &e.player)),
            limit,
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerIdentity> {
        self.entries.iter().map(|e| &e.player)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlayerDirectory {
    fn default() -> Self {
        Self::known_players()
    }
}
