use crate::core::models::residue::ResidueKey;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConservationError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unexpected conservation document layout: {0}")]
    Layout(String),
}

#[derive(Debug, Deserialize)]
struct ConservationRow {
    residue: String,
    score: f64,
    #[serde(default)]
    chain: Option<String>,
}

/// Per-residue conservation scores, optionally split by chain.
///
/// Lookups use the chain's own table when one exists and fall back to the
/// chain-independent table otherwise. Residue keys match exactly on their
/// textual form (`"52"`, `"52A"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConservationTable {
    chains: HashMap<char, HashMap<String, f64>>,
    shared: HashMap<String, f64>,
}

impl ConservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chain: Option<char>, key: &str, score: f64) {
        let table = match chain {
            Some(chain) => self.chains.entry(chain).or_default(),
            None => &mut self.shared,
        };
        table.insert(key.to_string(), score);
    }

    pub fn lookup(&self, chain: char, key: &ResidueKey) -> Option<f64> {
        let table = self.chains.get(&chain).unwrap_or(&self.shared);
        table.get(&key.to_string()).copied()
    }

    pub fn len(&self) -> usize {
        self.shared.len() + self.chains.values().map(HashMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads `{"data": {<chain>: {<key>: score}}}` or `{"data": {<key>: score}}`.
    ///
    /// The `data` wrapper is optional; both forms may be mixed in one document.
    pub fn read_json(reader: impl Read) -> Result<Self, ConservationError> {
        let root: Value = serde_json::from_reader(reader)?;
        let Value::Object(mut root) = root else {
            return Err(ConservationError::Layout(
                "top level must be a JSON object".to_string(),
            ));
        };
        let data = match root.remove("data") {
            Some(Value::Object(data)) => data,
            Some(_) => {
                return Err(ConservationError::Layout(
                    "'data' must be a JSON object".to_string(),
                ));
            }
            None => root,
        };

        let mut table = Self::new();
        for (key, value) in data {
            match value {
                Value::Object(scores) => {
                    let mut chars = key.chars();
                    match (chars.next(), chars.next()) {
                        (Some(chain), None) => table.extend_from_json(Some(chain), scores),
                        _ => warn!(key = %key, "Ignoring score table for a multi-character chain id."),
                    }
                }
                other => match json_score(&other) {
                    Some(score) => table.insert(None, &key, score),
                    None => debug!(residue = %key, "Ignoring non-numeric conservation score."),
                },
            }
        }
        Ok(table)
    }

    fn extend_from_json(&mut self, chain: Option<char>, scores: Map<String, Value>) {
        for (key, value) in scores {
            match json_score(&value) {
                Some(score) => self.insert(chain, &key, score),
                None => debug!(residue = %key, "Ignoring non-numeric conservation score."),
            }
        }
    }

    /// Reads CSV with a `residue,score` header and an optional `chain` column.
    pub fn read_csv(reader: impl Read) -> Result<Self, ConservationError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut table = Self::new();
        for row in csv_reader.deserialize::<ConservationRow>() {
            let row = row?;
            let chain = row.chain.as_deref().and_then(|c| c.chars().next());
            table.insert(chain, &row.residue, row.score);
        }
        Ok(table)
    }

    /// Reads a conservation file, choosing the format from its extension.
    ///
    /// `.csv` files are read as CSV; anything else is read as JSON.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConservationError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::read_csv(reader)
        } else {
            Self::read_json(reader)
        }
    }
}

fn json_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
