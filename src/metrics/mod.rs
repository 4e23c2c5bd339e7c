//! Metrics report over the idea table

use chrono::Local;
use std::fmt;

use crate::types::{Idea, IdeaType};

/// Ideas scoring strictly above this count as top performers
pub const TOP_PERFORMER_SCORE: u8 = 70;

/// Aggregate view of the idea table
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub total_ideas: usize,
    /// Mean score rounded to one decimal
    pub avg_score: f64,
    pub top_performers: usize,
    pub deployed: usize,
    /// Most frequent first; ties keep first-seen order
    pub by_type: Vec<(IdeaType, usize)>,
}

impl MetricsReport {
    pub fn from_ideas(ideas: &[Idea]) -> Self {
        let total_ideas = ideas.len();
        let avg_score = if ideas.is_empty() {
            0.0
        } else {
            let sum: f64 = ideas.iter().map(|i| f64::from(i.score)).sum();
            (sum / total_ideas as f64 * 10.0).round() / 10.0
        };

        Self {
            total_ideas,
            avg_score,
            top_performers: ideas.iter().filter(|i| i.score > TOP_PERFORMER_SCORE).count(),
            deployed: ideas.iter().filter(|i| i.landing_deployed).count(),
            by_type: type_counts(ideas),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_ideas == 0
    }
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "METRICS - {}", Local::now().format("%H:%M:%S"))?;
        writeln!(f, "{}", rule)?;

        if self.is_empty() {
            writeln!(f, "No ideas yet.")?;
            return write!(f, "{}", rule);
        }

        writeln!(f, "Total ideas:     {}", self.total_ideas)?;
        writeln!(f, "Average score:   {:.1}/100", self.avg_score)?;
        writeln!(
            f,
            "Top performers:  {} (score > {})",
            self.top_performers, TOP_PERFORMER_SCORE
        )?;
        writeln!(f, "Deployed:        {}", self.deployed)?;

        if !self.by_type.is_empty() {
            writeln!(f)?;
            writeln!(f, "By type:")?;
            for (idea_type, count) in &self.by_type {
                writeln!(f, "  {:15}: {}", idea_type.as_str(), count)?;
            }
        }
        write!(f, "{}", rule)
    }
}

/// Count ideas per type, most frequent first. Equal counts keep the order
/// in which each type first appears.
pub fn type_counts(ideas: &[Idea]) -> Vec<(IdeaType, usize)> {
    let mut counts: Vec<(IdeaType, usize)> = Vec::new();
    for idea in ideas {
        match counts.iter_mut().find(|(t, _)| *t == idea.idea_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((idea.idea_type, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
