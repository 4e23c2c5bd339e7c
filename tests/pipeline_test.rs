//! Full generation cycles against a scripted generator

use async_trait::async_trait;
use idea_engine::generator::parse_generation;
use idea_engine::{
    Config, GenerationError, GenerationOrchestrator, GenerationResult, IdeaGenerator, IdeaType,
    MetricsReport,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies in order
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self { replies: Mutex::new(replies.into()) }
    }
}

#[async_trait]
impl IdeaGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GenerationResult, GenerationError> {
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => parse_generation(&content),
            Some(Err(e)) => Err(e),
            None => Err(GenerationError::Request("script exhausted".to_string())),
        }
    }
}

fn idea_json(name: &str, description: &str, tipo: &str, score: u8) -> String {
    json!({
        "reasoning": {"porque_ahora": "remote work"},
        "idea": {
            "nombre": name,
            "tipo": tipo,
            "descripcion": description,
            "publico_objetivo": "Remote teams",
            "problema": "Too many meetings",
            "canales": ["Product Hunt", "LinkedIn"],
            "score": score
        }
    })
    .to_string()
}

fn config_in(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = Some(dir.path().to_path_buf());
    config.generator.reflect_every = 2;
    config
}

#[tokio::test]
async fn test_cycles_fill_table_history_and_memory() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let generator = ScriptedGenerator::new(vec![
        // cycle 1: a failure, a low score, then a keeper
        Ok("I'm sorry, I can't help with that.".to_string()),
        Ok(idea_json("Meh", "Yet another to-do list", "SaaS", 30)),
        Ok(idea_json("StandupBot", "Async standups in Slack for remote teams", "MicroSaaS", 78)),
        // cycle 2: a duplicate name, then a keeper
        Ok(idea_json("standupbot", "Whatever", "SaaS", 90)),
        Ok(idea_json("FocusTab", "Browser tab that hides feeds during deep work", "Extension", 66)),
    ]);

    let mut orchestrator = GenerationOrchestrator::open(&config, Box::new(generator)).unwrap();

    let first = orchestrator.run_iteration().await.unwrap().unwrap();
    assert_eq!(first.name, "StandupBot");
    assert_eq!(first.channels, "Product Hunt, LinkedIn");

    let second = orchestrator.run_iteration().await.unwrap().unwrap();
    assert_eq!(second.name, "FocusTab");
    assert_eq!(second.idea_type, IdeaType::Extension);

    let paths = config.data_paths().unwrap();
    assert!(paths.history.exists());
    assert!(paths.memory.exists());

    let raw = std::fs::read(&paths.table).unwrap();
    assert!(raw.starts_with(&[0xEF, 0xBB, 0xBF]), "table must start with a BOM");

    let rows = orchestrator.table().load().unwrap();
    let names: Vec<&str> = rows.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["FocusTab", "StandupBot"]);

    let memory = orchestrator.memory();
    assert_eq!(memory.stats().total_ideas, 2);
    assert_eq!(memory.stats().avg_score, 72.0);
    assert_eq!(memory.errors().len(), 1);
    assert_eq!(
        memory.learnings()[0].learning,
        "After 2 ideas: avg score 72.0, best 78. Predominant type: Extension"
    );

    let report = MetricsReport::from_ideas(&rows);
    assert_eq!(report.total_ideas, 2);
    assert_eq!(report.top_performers, 1);
    assert_eq!(report.deployed, 0);
}

#[tokio::test]
async fn test_single_shot_run_with_exhausted_generator() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let generator = ScriptedGenerator::new(vec![Err(GenerationError::Timeout(60))]);
    let mut orchestrator = GenerationOrchestrator::open(&config, Box::new(generator)).unwrap();

    let (_tx, rx) = tokio::sync::broadcast::channel(1);
    orchestrator.run(true, rx).await.unwrap();

    assert_eq!(orchestrator.iteration(), 1);
    assert!(orchestrator.tracker().is_empty());
    assert_eq!(orchestrator.memory().errors().len(), config.generator.max_attempts as usize);
    assert!(orchestrator.table().load().unwrap().is_empty());
}
