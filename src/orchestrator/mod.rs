//! Generation cycle
//!
//! One cycle asks the generator for an idea (up to `max_attempts` times),
//! filters it by score and against the duplicate history, and persists the
//! winner to the idea table, the tracker and the memory, in that order.
//! Every `reflect_every` cycles the table is re-analyzed and a learning is
//! recorded.

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::{Config, GeneratorConfig};
use crate::error::StorageResult;
use crate::generator::{build_prompt, IdeaGenerator};
use crate::memory::SystemMemory;
use crate::metrics::type_counts;
use crate::table::IdeaTable;
use crate::tracker::IdeaTracker;
use crate::types::{now_local, Idea, IdeaType};

/// Drives generation cycles over the persistent stores
pub struct GenerationOrchestrator {
    config: GeneratorConfig,
    generator: Box<dyn IdeaGenerator>,
    tracker: IdeaTracker,
    memory: SystemMemory,
    table: IdeaTable,
    iteration: u64,
}

impl GenerationOrchestrator {
    pub fn new(
        config: GeneratorConfig,
        generator: Box<dyn IdeaGenerator>,
        tracker: IdeaTracker,
        memory: SystemMemory,
        table: IdeaTable,
    ) -> Self {
        Self {
            config,
            generator,
            tracker,
            memory,
            table,
            iteration: 0,
        }
    }

    /// Open every store under the configured data directory.
    pub fn open(config: &Config, generator: Box<dyn IdeaGenerator>) -> Result<Self> {
        let paths = config.data_paths()?;
        let tracker = IdeaTracker::open(paths.history.clone(), config.tracker.clone())
            .context("Failed to open idea history")?;
        let memory =
            SystemMemory::open(paths.memory.clone()).context("Failed to open system memory")?;
        let table = IdeaTable::open(paths.table.clone()).context("Failed to open idea table")?;

        Ok(Self::new(config.generator.clone(), generator, tracker, memory, table))
    }

    /// Ask for ideas until one passes the score and duplicate filters.
    ///
    /// Generation failures are recorded in memory and consume an attempt.
    /// Returns `None` once every attempt is used up; storage failures abort.
    pub async fn generate_idea(&mut self) -> StorageResult<Option<Idea>> {
        for attempt in 1..=self.config.max_attempts {
            debug!("Generation attempt {}/{}", attempt, self.config.max_attempts);

            let prompt = build_prompt(
                &self.memory.get_insights(),
                &self.memory.patterns().success_factors,
            );

            let generated = self
                .generator
                .generate(&prompt)
                .await
                .and_then(|result| result.idea.into_idea(&result.reasoning, now_local()));

            let idea = match generated {
                Ok(idea) => idea,
                Err(e) => {
                    warn!("Generation failed: {}", e);
                    self.memory
                        .add_error(&e.to_string(), &format!("generate_idea attempt {}", attempt))?;
                    continue;
                }
            };

            if idea.score < self.config.min_score {
                info!("Rejected '{}': score {} < {}", idea.name, idea.score, self.config.min_score);
                continue;
            }

            if let Some(reason) = self.tracker.is_duplicate(&idea.name, &idea.description) {
                info!("Rejected '{}': {}", idea.name, reason);
                continue;
            }

            return Ok(Some(idea));
        }

        Ok(None)
    }

    /// Persist an accepted idea to the table, the history and the stats.
    pub fn save_idea(&mut self, idea: &Idea) -> StorageResult<()> {
        self.table.prepend(idea)?;
        self.tracker
            .add_idea(&idea.name, &idea.description, idea.idea_type, idea.score)?;
        self.memory.update_stats(&idea.record())
    }

    /// Run one full cycle. Returns the saved idea, if any.
    pub async fn run_iteration(&mut self) -> Result<Option<Idea>> {
        self.iteration += 1;
        info!("Iteration #{}", self.iteration);

        let Some(idea) = self.generate_idea().await? else {
            warn!("No valid idea after {} attempts", self.config.max_attempts);
            return Ok(None);
        };

        info!("Accepted '{}' ({}, score {})", idea.name, idea.idea_type, idea.score);
        self.save_idea(&idea).context("Failed to save idea")?;

        self.reflect_and_improve();
        Ok(Some(idea))
    }

    /// Periodic pattern analysis; failures are logged and ignored.
    pub fn reflect_and_improve(&mut self) {
        let every = self.config.reflect_every;
        if every == 0 || self.iteration == 0 || self.iteration % every != 0 {
            return;
        }

        info!("Reflecting on results after iteration {}", self.iteration);
        match self.reflect() {
            Ok(Some(learning)) => {
                info!("Learning: {}", learning);
                for insight in self.memory.get_insights().iter().take(3) {
                    info!("Insight: {}", insight);
                }
            }
            Ok(None) => debug!("Idea table is empty, nothing to reflect on"),
            Err(e) => warn!("Reflection failed: {:#}", e),
        }
    }

    fn reflect(&mut self) -> Result<Option<String>> {
        let ideas = self.table.load()?;
        if ideas.is_empty() {
            return Ok(None);
        }

        self.memory.analyze_patterns(&ideas)?;
        let learning = summarize(&ideas);
        self.memory.add_learning(&learning)?;
        Ok(Some(learning))
    }

    /// Run one cycle, or cycle every `interval_secs` until `shutdown` fires.
    ///
    /// The first cycle starts immediately. A failed cycle is logged and the
    /// loop carries on; in single-shot mode the failure is returned.
    pub async fn run(&mut self, once: bool, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        if once {
            self.run_iteration().await?;
            return Ok(());
        }

        info!(
            "Generator started (min score {}, interval {}s)",
            self.config.min_score, self.config.interval_secs
        );
        let interval = std::time::Duration::from_secs(self.config.interval_secs);

        loop {
            if let Err(e) = self.run_iteration().await {
                error!("Cycle failed: {:#}", e);
            }
            info!("Next idea in {} minutes", self.config.interval_secs / 60);

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => {
                    info!("Generator stopped after {} iterations", self.iteration);
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn memory(&self) -> &SystemMemory {
        &self.memory
    }

    pub fn tracker(&self) -> &IdeaTracker {
        &self.tracker
    }

    pub fn table(&self) -> &IdeaTable {
        &self.table
    }
}

/// "After N ideas: avg score X.X, best B. Predominant type: T"
fn summarize(ideas: &[Idea]) -> String {
    let total: f64 = ideas.iter().map(|i| f64::from(i.score)).sum();
    let avg = total / ideas.len() as f64;
    let best = ideas.iter().map(|i| i.score).max().unwrap_or(0);
    let predominant = type_counts(ideas)
        .first()
        .map(|(t, _)| *t)
        .unwrap_or(IdeaType::SaaS);

    format!(
        "After {} ideas: avg score {:.1}, best {}. Predominant type: {}",
        ideas.len(),
        avg,
        best,
        predominant
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::generator::{parse_generation, GenerationResult, MockIdeaGenerator};
    use crate::tracker::TrackerConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn reply(name: &str, description: &str, idea_type: &str, score: u8) -> GenerationResult {
        let content = json!({
            "reasoning": {"oportunidad": "test"},
            "idea": {
                "nombre": name,
                "descripcion": description,
                "tipo": idea_type,
                "publico_objetivo": "Freelancers",
                "problema": "Late payments",
                "score": score
            }
        });
        parse_generation(&content.to_string()).unwrap()
    }

    fn orchestrator(
        dir: &TempDir,
        generator: MockIdeaGenerator,
        reflect_every: u64,
    ) -> GenerationOrchestrator {
        let config = GeneratorConfig { reflect_every, ..GeneratorConfig::default() };
        let history = dir.path().join("ideas_history.json");
        let tracker = IdeaTracker::open(history, TrackerConfig::default()).unwrap();
        let memory = SystemMemory::open(dir.path().join("system_memory.json")).unwrap();
        let table = IdeaTable::open(dir.path().join("ideas-validadas.csv")).unwrap();
        GenerationOrchestrator::new(config, Box::new(generator), tracker, memory, table)
    }

    #[tokio::test]
    async fn test_accepted_idea_is_saved_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockIdeaGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| {
                Ok(reply("InvoiceFlow", "Automated invoice reminders", "MicroSaaS", 72))
            });

        let mut orch = orchestrator(&dir, generator, 10);
        let idea = orch.run_iteration().await.unwrap().unwrap();

        assert_eq!(idea.name, "InvoiceFlow");
        assert_eq!(orch.iteration(), 1);
        assert_eq!(orch.tracker().len(), 1);
        assert_eq!(orch.memory().stats().total_ideas, 1);
        assert_eq!(orch.memory().stats().best_score, 72);

        let rows = orch.table().load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, idea.id);
        assert_eq!(rows[0].landing_url, "");
        assert!(!rows[0].landing_deployed);
    }

    #[tokio::test]
    async fn test_low_scores_exhaust_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockIdeaGenerator::new();
        generator
            .expect_generate()
            .times(5)
            .returning(|_| Ok(reply("Meh", "An unremarkable tool", "SaaS", 39)));

        let mut orch = orchestrator(&dir, generator, 10);
        assert!(orch.run_iteration().await.unwrap().is_none());
        assert!(orch.tracker().is_empty());
        assert!(orch.table().load().unwrap().is_empty());
        assert!(orch.memory().errors().is_empty());
    }

    #[tokio::test]
    async fn test_generation_errors_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockIdeaGenerator::new();
        generator
            .expect_generate()
            .times(5)
            .returning(|_| Err(GenerationError::InvalidJson("not json".to_string())));

        let mut orch = orchestrator(&dir, generator, 10);
        assert!(orch.generate_idea().await.unwrap().is_none());

        let errors = orch.memory().errors();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0].context, "generate_idea attempt 1");
        assert!(errors[4].error.contains("not json"));
    }

    #[tokio::test]
    async fn test_duplicate_consumes_an_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let mut calls = 0;
        let mut generator = MockIdeaGenerator::new();
        generator.expect_generate().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(reply("invoiceflow", "Something else entirely", "SaaS", 80))
            } else {
                Ok(reply("RecipeBox", "Meal planning from your fridge contents", "Extension", 66))
            }
        });

        let mut orch = orchestrator(&dir, generator, 10);
        orch.tracker
            .add_idea("InvoiceFlow", "Automated invoice reminders", IdeaType::SaaS, 70)
            .unwrap();

        let idea = orch.generate_idea().await.unwrap().unwrap();
        assert_eq!(idea.name, "RecipeBox");
        assert_eq!(idea.idea_type, IdeaType::Extension);
    }

    #[tokio::test]
    async fn test_missing_fields_count_as_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockIdeaGenerator::new();
        generator
            .expect_generate()
            .times(5)
            .returning(|_| parse_generation(r#"{"idea": {"nombre": "NoDescription"}}"#));

        let mut orch = orchestrator(&dir, generator, 10);
        assert!(orch.generate_idea().await.unwrap().is_none());
        assert_eq!(orch.memory().errors().len(), 5);
    }

    #[tokio::test]
    async fn test_prompt_carries_memory_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockIdeaGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt| prompt.contains("Latest learning: prefer niche B2B"))
            .times(1)
            .returning(|_| Ok(reply("Niche", "A niche B2B helper", "SaaS", 60)));

        let mut orch = orchestrator(&dir, generator, 10);
        orch.memory.add_learning("prefer niche B2B").unwrap();
        assert!(orch.generate_idea().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reflection_records_learning() {
        let dir = tempfile::tempdir().unwrap();
        let replies = vec![
            reply("Alpha", "First product about invoices for freelancers", "SaaS", 60),
            reply("Bravo", "Browser add-on that blocks distracting feeds", "Extension", 90),
            reply("Charlie", "Notion budget planner for students", "Plantilla", 75),
            reply("Delta", "Course on shipping side projects quickly", "InfoProducto", 45),
        ];
        let mut calls = 0;
        let mut generator = MockIdeaGenerator::new();
        generator.expect_generate().times(4).returning(move |_| {
            let r = replies[calls].clone();
            calls += 1;
            Ok(r)
        });

        let mut orch = orchestrator(&dir, generator, 2);
        orch.run_iteration().await.unwrap();
        assert!(orch.memory().learnings().is_empty());

        orch.run_iteration().await.unwrap();
        let learnings = orch.memory().learnings();
        assert_eq!(learnings.len(), 1);
        assert_eq!(
            learnings[0].learning,
            "After 2 ideas: avg score 75.0, best 90. Predominant type: Extension"
        );
        assert_eq!(orch.memory().patterns().success_factors[0].name, "Bravo");

        orch.run_iteration().await.unwrap();
        orch.run_iteration().await.unwrap();
        assert_eq!(orch.memory().learnings().len(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockIdeaGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok(reply("Once", "Only one cycle runs", "SaaS", 55)));

        let mut orch = orchestrator(&dir, generator, 10);
        let (tx, rx) = broadcast::channel(1);
        tx.send(()).unwrap();

        orch.run(false, rx).await.unwrap();
        assert_eq!(orch.iteration(), 1);
        assert_eq!(orch.tracker().len(), 1);
    }

    #[test]
    fn test_summarize_ties_keep_first_type() {
        let created_at = now_local();
        let base = Idea {
            id: Idea::id_for(&created_at),
            name: "A".to_string(),
            idea_type: IdeaType::Template,
            summary: String::new(),
            description: String::new(),
            target_audience: String::new(),
            problem: String::new(),
            solution: String::new(),
            complexity: "Media".to_string(),
            dev_hours: 80,
            price: "$29/mes".to_string(),
            mvp_features: String::new(),
            channels: String::new(),
            competition: String::new(),
            differentiation: String::new(),
            score: 50,
            landing_url: String::new(),
            landing_deployed: false,
            created_at,
            reasoning: "{}".to_string(),
        };
        let other = Idea { idea_type: IdeaType::SaaS, score: 61, ..base.clone() };

        assert_eq!(
            summarize(&[base, other]),
            "After 2 ideas: avg score 55.5, best 61. Predominant type: Plantilla"
        );
    }
}
