use rapidfuzz::distance::jaro_winkler;

use crate::core::PlayerIdentity;

/// Minimum similarity (0-100) for a name to be offered as a suggestion
pub const MIN_SUGGESTION_SCORE: f64 = 70.0;

/// Directory entry with similarity score
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub player: PlayerIdentity,
    pub score: f64,
}

/// Rank `candidates` (normalized name, player) against an already
/// normalized query, best first.
pub fn rank<'a, I>(query: &str, candidates: I, limit: usize) -> Vec<Suggestion>
where
    I: IntoIterator<Item = (&'a str, &'a PlayerIdentity)>,
{
    let mut ranked: Vec<Suggestion> = candidates
        .into_iter()
        .map(|(key, player)| {
            // Jaro-Winkler similarity (0.0 - 1.0)
            let score = jaro_winkler::normalized_similarity(query.chars(), key.chars());

            Suggestion {
                player: player.clone(),
                score: score * 100.0,
            }
        })
        .filter(|s| s.score >= MIN_SUGGESTION_SCORE)
        .collect();

    // Stable sort keeps directory order between equal scores
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}
