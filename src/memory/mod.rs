//! Persistent system memory
//!
//! Cross-cycle learning state kept apart from the duplicate history:
//! - running statistics over every accepted idea
//! - per-type score patterns and the best ideas so far
//! - free-form learnings and recorded errors (bounded)
//!
//! Each mutating call rewrites the whole memory file before returning.

pub mod state;

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StorageResult;
use crate::storage;
use crate::types::{now_local, Idea, IdeaRecord};

pub use state::{
    ErrorEntry, LearningEntry, MemoryState, Patterns, Stats, SuccessFactor, TypeScores,
    MAX_ERRORS, MAX_LEARNINGS, MAX_SUCCESS_FACTORS,
};

/// File-backed learning memory
pub struct SystemMemory {
    path: PathBuf,
    state: MemoryState,
}

impl SystemMemory {
    /// Load memory from `path`, or start empty if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let state: MemoryState = storage::load_json_or_default(&path)?;
        info!(
            "System memory loaded from {} ({} ideas, {} learnings)",
            path.display(),
            state.stats.total_ideas,
            state.learnings.len()
        );
        Ok(Self { path, state })
    }

    /// Record a learning, keeping the most recent [`MAX_LEARNINGS`].
    pub fn add_learning(&mut self, learning: &str) -> StorageResult<()> {
        self.state.learnings.push(LearningEntry {
            learning: learning.to_string(),
            timestamp: now_local(),
        });
        self.save()
    }

    /// Record an error and where it happened, keeping the most recent [`MAX_ERRORS`].
    pub fn add_error(&mut self, error: &str, context: &str) -> StorageResult<()> {
        self.state.errors.push(ErrorEntry {
            error: error.to_string(),
            context: context.to_string(),
            timestamp: now_local(),
        });
        self.save()
    }

    /// Fold one accepted idea into the running statistics.
    pub fn update_stats(&mut self, idea: &IdeaRecord) -> StorageResult<()> {
        let stats = &mut self.state.stats;
        stats.total_ideas += 1;
        stats.best_score = stats.best_score.max(idea.score);

        // Incremental mean; must stay this exact expression so accumulated
        // values match previously persisted ones.
        let n = stats.total_ideas as f64;
        stats.avg_score = (stats.avg_score * (n - 1.0) + f64::from(idea.score)) / n;

        debug!(
            "Stats updated: total={} avg={:.2} best={}",
            stats.total_ideas, stats.avg_score, stats.best_score
        );
        self.save()
    }

    /// Recompute per-type averages and the top ideas from the full table.
    ///
    /// Does nothing for an empty dataset.
    pub fn analyze_patterns(&mut self, dataset: &[Idea]) -> StorageResult<()> {
        if dataset.is_empty() {
            return Ok(());
        }

        // (type, sum, count) in first-appearance order
        let mut by_type: Vec<(String, f64, usize)> = Vec::new();
        for idea in dataset {
            let name = idea.idea_type.as_str();
            match by_type.iter_mut().find(|(t, _, _)| t == name) {
                Some(entry) => {
                    entry.1 += f64::from(idea.score);
                    entry.2 += 1;
                }
                None => by_type.push((name.to_string(), f64::from(idea.score), 1)),
            }
        }
        for (type_name, sum, count) in by_type {
            self.state
                .patterns
                .best_scores_by_type
                .insert(type_name, round1(sum / count as f64));
        }

        // Stable sort keeps table order among equal scores
        let mut ranked: Vec<&Idea> = dataset.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        self.state.patterns.success_factors = ranked
            .into_iter()
            .take(MAX_SUCCESS_FACTORS)
            .map(|idea| SuccessFactor {
                idea_type: idea.idea_type.as_str().to_string(),
                score: idea.score,
                name: idea.name.clone(),
                features: format!("{} - {}", idea.target_audience, idea.problem),
            })
            .collect();

        info!(
            "Analyzed patterns over {} ideas ({} types)",
            dataset.len(),
            self.state.patterns.best_scores_by_type.len()
        );
        self.save()
    }

    /// Up to three summary lines: overall stats, best type, latest learning.
    pub fn get_insights(&self) -> Vec<String> {
        let mut insights = Vec::new();

        let stats = &self.state.stats;
        if stats.total_ideas > 0 {
            insights.push(format!(
                "Generated {} ideas with an average score of {:.1}",
                stats.total_ideas, stats.avg_score
            ));
        }

        if let Some((best_type, avg)) = self.best_type() {
            insights.push(format!(
                "{} ideas perform best (avg {:.1})",
                best_type, avg
            ));
        }

        if let Some(latest) = self.state.learnings.last() {
            insights.push(format!("Latest learning: {}", latest.learning));
        }

        insights
    }

    /// Type with the highest average score; on a tie the first one stored wins.
    fn best_type(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, avg) in self.state.patterns.best_scores_by_type.iter() {
            if best.map_or(true, |(_, b)| avg > b) {
                best = Some((name, avg));
            }
        }
        best
    }

    pub fn stats(&self) -> &Stats {
        &self.state.stats
    }

    pub fn patterns(&self) -> &Patterns {
        &self.state.patterns
    }

    pub fn learnings(&self) -> &[LearningEntry] {
        self.state.learnings.as_slice()
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        self.state.errors.as_slice()
    }

    pub fn state(&self) -> &MemoryState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> StorageResult<()> {
        storage::save_json(&self.path, &self.state)
    }
}

/// Round half away from zero to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
