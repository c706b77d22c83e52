use serde::{Deserialize, Serialize};
use std::fmt;

/// A player resolved from the directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlayerIdentity {
    /// Stats provider player ID
    pub id: u32,

    /// Display name (e.g. "LeBron James")
    #[serde(alias = "full_name")]
    pub name: String,
}

impl PlayerIdentity {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}
