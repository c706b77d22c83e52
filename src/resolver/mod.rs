pub mod directory;
pub mod fuzzy;

pub use directory::PlayerDirectory;
pub use fuzzy::Suggestion;

/// Normalize a player name for lookups: lowercase, trimmed, single spaces
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
