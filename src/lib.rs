//! Idea Engine - continuous business-idea generator
//!
//! Periodically asks a language model for a product idea and keeps only
//! the ones that are new and good enough:
//! - Ratcliff/Obershelp similarity for duplicate detection
//! - Bounded, file-backed idea history
//! - Self-learning memory (statistics, per-type patterns, learnings)
//! - CSV idea table, most recent first
//!
//! # Example
//!
//! ```ignore
//! use idea_engine::{IdeaTracker, TrackerConfig};
//!
//! let tracker = IdeaTracker::open("data/ideas_history.json", TrackerConfig::default())?;
//! if let Some(reason) = tracker.is_duplicate("InvoiceFlow", "Automated invoice reminders") {
//!     println!("rejected: {}", reason);
//! }
//! ```

// Core modules (leaf first)
pub mod types;
pub mod error;
pub mod similarity;
pub mod history;
pub mod storage;
pub mod tracker;
pub mod memory;
pub mod table;

// Application modules
pub mod config;
pub mod security;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod cli;

pub use types::{Idea, IdeaRecord, IdeaType};
pub use error::{GenerationError, StorageError, StorageResult};
pub use similarity::similarity;
pub use history::BoundedHistory;
pub use tracker::{DuplicateReason, IdeaTracker, TrackerConfig, MAX_TRACKED_IDEAS};
pub use memory::SystemMemory;
pub use table::IdeaTable;
pub use config::Config;
pub use generator::{ChatClient, GenerationResult, IdeaGenerator};
pub use metrics::MetricsReport;
pub use orchestrator::GenerationOrchestrator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Truncate `s` to at most `max_bytes` without splitting a UTF-8 character.
pub fn truncate_safe(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_safe() {
        assert_eq!(truncate_safe("short", 10), "short");
        assert_eq!(truncate_safe("abcdef", 3), "abc...");
        // 'é' is two bytes; never cut inside it
        assert_eq!(truncate_safe("aé", 2), "a...");
    }
}
