use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StatsEngineError};

/// One upstream table: column headers plus positional rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub name: String,

    pub headers: Vec<String>,

    #[serde(rename = "rowSet", default)]
    pub row_set: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(name: impl Into<String>, headers: &[&str], row_set: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            row_set,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_set.is_empty()
    }

    pub fn len(&self) -> usize {
        self.row_set.len()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(header))
    }

    /// Zip headers with every row into named records
    pub fn records(&self) -> Result<Vec<Map<String, Value>>> {
        self.row_set
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != self.headers.len() {
                    return Err(StatsEngineError::upstream(
                        self.name.as_str(),
                        format!(
                            "row {} has {} values for {} headers",
                            i,
                            row.len(),
                            self.headers.len()
                        ),
                    ));
                }

                Ok(self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect())
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultSets {
    Many(Vec<ResultSet>),
    One(ResultSet),
}

/// Top-level stats provider response body
#[derive(Debug, Deserialize)]
pub struct StatsPayload {
    #[serde(rename = "resultSets", alias = "resultSet")]
    result_sets: Option<ResultSets>,
}

impl StatsPayload {
    /// Parse a response body, tagging errors with the source name
    pub fn parse(body: &str, source_name: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(StatsEngineError::upstream(source_name, "empty response body"));
        }

        serde_json::from_str(body).map_err(|e| {
            StatsEngineError::upstream(source_name, format!("Invalid JSON: {}", e))
        })
    }

    /// The result set called `preferred`, or the first one
    pub fn into_result_set(self, preferred: &str) -> Option<ResultSet> {
        match self.result_sets? {
            ResultSets::One(set) => Some(set),
            ResultSets::Many(mut sets) => {
                let index = sets
                    .iter()
                    .position(|s| s.name.eq_ignore_ascii_case(preferred))
                    .unwrap_or(0);
                if sets.is_empty() {
                    None
                } else {
                    Some(sets.swap_remove(index))
                }
            }
        }
    }
}
