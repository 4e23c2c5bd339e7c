//! On-disk shape of the system memory document

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::history::BoundedHistory;
use crate::types::{deserialize_score, deserialize_type_name};

/// Learnings kept in memory
pub const MAX_LEARNINGS: usize = 100;
/// Errors kept in memory
pub const MAX_ERRORS: usize = 50;
/// Top ideas kept as success factors
pub const MAX_SUCCESS_FACTORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEntry {
    pub learning: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub error: String,
    pub context: String,
    pub timestamp: NaiveDateTime,
}

/// Projection of a top-scoring idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessFactor {
    /// Type name as written; files from older runs may carry any label
    #[serde(rename = "tipo", alias = "type", default, deserialize_with = "deserialize_type_name")]
    pub idea_type: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(rename = "nombre", alias = "name")]
    pub name: String,
    /// `"<target audience> - <problem>"`
    #[serde(rename = "caracteristicas", alias = "features")]
    pub features: String,
}

/// Average score per type name in the order the types were first seen.
///
/// Stored as a JSON object; key order is kept on load and save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeScores(Vec<(String, f64)>);

impl TypeScores {
    /// Set the average for `type_name`, keeping its position if already present.
    pub fn insert(&mut self, type_name: String, avg: f64) {
        match self.0.iter_mut().find(|(name, _)| *name == type_name) {
            Some(entry) => entry.1 = avg,
            None => self.0.push((type_name, avg)),
        }
    }

    pub fn get(&self, type_name: &str) -> Option<f64> {
        self.0.iter().find(|(name, _)| name == type_name).map(|(_, avg)| *avg)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, avg)| (name.as_str(), *avg))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TypeScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, avg) in &self.0 {
            map.serialize_entry(name, avg)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypeScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TypeScoresVisitor;

        impl<'de> Visitor<'de> for TypeScoresVisitor {
            type Value = TypeScores;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of type names to average scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TypeScores, A::Error> {
                let mut scores = TypeScores::default();
                while let Some((name, avg)) = access.next_entry::<String, f64>()? {
                    scores.insert(name, avg);
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(TypeScoresVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patterns {
    /// Mean score per type name, rounded to one decimal
    #[serde(default)]
    pub best_scores_by_type: TypeScores,
    #[serde(default)]
    pub best_channels: Vec<serde_json::Value>,
    #[serde(default)]
    pub success_factors: Vec<SuccessFactor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_ideas: u64,
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub best_score: u8,
    #[serde(default)]
    pub deploys_success: u64,
}

/// Everything the system remembers between cycles.
///
/// `best_prompts`, `improvements` and `patterns.best_channels` are not
/// written by this crate but are carried through so existing files keep them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    #[serde(default)]
    pub learnings: BoundedHistory<LearningEntry, MAX_LEARNINGS>,
    #[serde(default)]
    pub best_prompts: Vec<serde_json::Value>,
    #[serde(default)]
    pub patterns: Patterns,
    #[serde(default)]
    pub errors: BoundedHistory<ErrorEntry, MAX_ERRORS>,
    #[serde(default)]
    pub improvements: Vec<serde_json::Value>,
    #[serde(default)]
    pub stats: Stats,
}
