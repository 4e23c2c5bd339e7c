//! Anti-duplication tracker
//!
//! Keeps the last [`MAX_TRACKED_IDEAS`] accepted ideas together with the
//! names they used, and rejects candidates whose name or description is too
//! close to one already seen. State lives in a single JSON document that is
//! rewritten after every accepted idea.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StorageResult;
use crate::history::BoundedHistory;
use crate::similarity::similarity;
use crate::storage;
use crate::types::{now_local, IdeaType};

/// Ideas (and names) remembered for duplicate detection
pub const MAX_TRACKED_IDEAS: usize = 1000;

/// Tracker thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Description similarity above which a candidate is a duplicate
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Name similarity above which a candidate is a duplicate
    #[serde(default = "default_name_threshold")]
    pub name_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    0.70
}

fn default_name_threshold() -> f64 {
    0.85
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            name_threshold: default_name_threshold(),
        }
    }
}

/// An accepted idea as stored in the history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedIdea {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// Type name as written; files from older runs may carry any label
    #[serde(rename = "tipo", default, deserialize_with = "crate::types::deserialize_type_name")]
    pub idea_type: String,
    #[serde(deserialize_with = "crate::types::deserialize_score")]
    pub score: u8,
    #[serde(rename = "fecha")]
    pub created_at: NaiveDateTime,
}

/// On-disk shape of the history file.
///
/// `names` is pushed and truncated together with `ideas`, so both always
/// hold the same number of entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdeaHistory {
    #[serde(default)]
    pub ideas: BoundedHistory<TrackedIdea, MAX_TRACKED_IDEAS>,
    #[serde(rename = "nombres_usados", default)]
    pub names: BoundedHistory<String, MAX_TRACKED_IDEAS>,
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateReason {
    /// Same name, ignoring case
    ExactName,
    /// Name too close to a previously used one
    SimilarName { prior: String, score: f64 },
    /// Description too close to a previous idea's
    SimilarConcept { prior: String, score: f64 },
}

impl std::fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateReason::ExactName => write!(f, "exact name match"),
            DuplicateReason::SimilarName { prior, score } => {
                write!(f, "name similar to: {} ({:.2})", prior, score)
            }
            DuplicateReason::SimilarConcept { prior, score } => {
                write!(f, "concept similar to: {} ({:.2})", prior, score)
            }
        }
    }
}

/// Persistent duplicate detector
pub struct IdeaTracker {
    path: PathBuf,
    config: TrackerConfig,
    history: IdeaHistory,
}

impl IdeaTracker {
    /// Load the history at `path`, or start empty if the file is absent.
    pub fn open(path: impl Into<PathBuf>, config: TrackerConfig) -> StorageResult<Self> {
        let path = path.into();
        let history: IdeaHistory = storage::load_json_or_default(&path)?;
        info!("Idea tracker loaded {} ideas from {}", history.ideas.len(), path.display());
        Ok(Self { path, config, history })
    }

    /// Decide whether a candidate repeats an earlier idea.
    ///
    /// Checks run in order and the first hit wins: exact name, similar name,
    /// similar description. Returns `None` for a fresh idea.
    pub fn is_duplicate(&self, name: &str, description: &str) -> Option<DuplicateReason> {
        let name_lower = name.to_lowercase();

        if self.history.names.iter().any(|n| n.to_lowercase() == name_lower) {
            return Some(DuplicateReason::ExactName);
        }

        for prior in &self.history.names {
            let score = similarity(&name_lower, &prior.to_lowercase());
            if score > self.config.name_threshold {
                return Some(DuplicateReason::SimilarName { prior: prior.clone(), score });
            }
        }

        let description_lower = description.to_lowercase();
        for prior in &self.history.ideas {
            let score = similarity(&description_lower, &prior.description.to_lowercase());
            if score > self.config.similarity_threshold {
                return Some(DuplicateReason::SimilarConcept { prior: prior.name.clone(), score });
            }
        }

        None
    }

    /// Remember an accepted idea and persist the history before returning.
    pub fn add_idea(
        &mut self,
        name: &str,
        description: &str,
        idea_type: IdeaType,
        score: u8,
    ) -> StorageResult<()> {
        let evicted = self.history.ideas.push(TrackedIdea {
            name: name.to_string(),
            description: description.to_string(),
            idea_type: idea_type.as_str().to_string(),
            score,
            created_at: now_local(),
        });
        self.history.names.push(name.to_string());

        if evicted > 0 {
            debug!("Evicted {} oldest tracked ideas", evicted);
        }

        storage::save_json(&self.path, &self.history)
    }

    pub fn len(&self) -> usize {
        self.history.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.ideas.is_empty()
    }

    /// Tracked ideas, oldest first
    pub fn ideas(&self) -> &[TrackedIdea] {
        self.history.ideas.as_slice()
    }

    /// Used names, oldest first
    pub fn names(&self) -> &[String] {
        self.history.names.as_slice()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
