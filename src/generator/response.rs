//! Parsing and validation of the generator's JSON reply
//!
//! The model is asked for `{"reasoning": {...}, "idea": {...}}` with the
//! original Spanish field names. Only `nombre` and `descripcion` are
//! required; every other field falls back to a fixed default so a sparse
//! but usable reply is still accepted.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationError;
use crate::types::{Idea, IdeaType};

const DEFAULT_COMPLEXITY: &str = "Media";
const DEFAULT_DEV_HOURS: u32 = 80;
const DEFAULT_PRICE: &str = "$29/mes";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("valid fence regex")
});

/// Raw idea object as produced by the model. Values stay untyped until
/// [`IdeaDraft::into_idea`] so that lists, numbers-as-strings and the like
/// can be normalized in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeaDraft {
    #[serde(default, rename = "nombre", alias = "name")]
    pub name: Option<Value>,
    #[serde(default, rename = "tipo", alias = "type")]
    pub idea_type: Option<Value>,
    #[serde(default, rename = "resumen", alias = "summary")]
    pub summary: Option<Value>,
    #[serde(default, rename = "descripcion", alias = "description")]
    pub description: Option<Value>,
    #[serde(default, rename = "publico_objetivo", alias = "target_audience")]
    pub target_audience: Option<Value>,
    #[serde(default, rename = "problema", alias = "problem")]
    pub problem: Option<Value>,
    #[serde(default, rename = "solucion", alias = "solution")]
    pub solution: Option<Value>,
    #[serde(default, rename = "complejidad", alias = "complexity")]
    pub complexity: Option<Value>,
    #[serde(default, rename = "horas_desarrollo", alias = "dev_hours")]
    pub dev_hours: Option<Value>,
    #[serde(default, rename = "precio_estimado", alias = "price")]
    pub price: Option<Value>,
    #[serde(default)]
    pub mvp_features: Option<Value>,
    #[serde(default, rename = "canales", alias = "channels")]
    pub channels: Option<Value>,
    #[serde(default, rename = "competencia", alias = "competition")]
    pub competition: Option<Value>,
    #[serde(default, rename = "diferenciacion", alias = "differentiation")]
    pub differentiation: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
}

/// A parsed generator reply
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub reasoning: Value,
    pub idea: IdeaDraft,
}

/// Parse the model's message content into a [`GenerationResult`].
///
/// Accepts the JSON bare or wrapped in a Markdown code fence.
pub fn parse_generation(content: &str) -> Result<GenerationResult, GenerationError> {
    let body = CODE_FENCE
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content)
        .trim();

    if body.is_empty() {
        return Err(GenerationError::InvalidJson("empty response".to_string()));
    }

    let mut root: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidJson(e.to_string()))?;
    let object = root
        .as_object_mut()
        .ok_or_else(|| GenerationError::InvalidJson("top level is not an object".to_string()))?;

    let idea_value = object.remove("idea").ok_or(GenerationError::MissingField("idea"))?;
    if !idea_value.is_object() {
        return Err(GenerationError::InvalidField {
            field: "idea",
            reason: "expected an object".to_string(),
        });
    }
    let idea: IdeaDraft = serde_json::from_value(idea_value).map_err(|e| {
        GenerationError::InvalidField { field: "idea", reason: e.to_string() }
    })?;

    let reasoning = object
        .remove("reasoning")
        .unwrap_or_else(|| Value::Object(Default::default()));

    Ok(GenerationResult { reasoning, idea })
}

impl IdeaDraft {
    /// Candidate name, if present and non-blank
    pub fn name_text(&self) -> Option<String> {
        non_blank(text(&self.name))
    }

    /// Candidate description, if present and non-blank
    pub fn description_text(&self) -> Option<String> {
        non_blank(text(&self.description))
    }

    /// Score as an integer in 0..=100; a missing score counts as 0.
    pub fn score_value(&self) -> Result<u8, GenerationError> {
        let invalid = |reason: String| GenerationError::InvalidField { field: "score", reason };

        let raw = match &self.score {
            None | Some(Value::Null) => return Ok(0),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| invalid(format!("unrepresentable number {}", n)))?,
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid(format!("'{}' is not a number", s)))?,
            Some(other) => return Err(invalid(format!("unexpected value {}", other))),
        };

        if !(0.0..=100.0).contains(&raw) {
            return Err(invalid(format!("{} is outside 0..=100", raw)));
        }
        Ok(raw.round() as u8)
    }

    /// Idea type; a missing type defaults to SaaS, an unknown one is rejected.
    pub fn type_value(&self) -> Result<IdeaType, GenerationError> {
        match non_blank(text(&self.idea_type)) {
            None => Ok(IdeaType::default()),
            Some(raw) => raw.parse().map_err(|e: crate::types::UnknownIdeaType| {
                GenerationError::InvalidField { field: "tipo", reason: e.to_string() }
            }),
        }
    }

    /// Validate and fill defaults, producing a table row.
    pub fn into_idea(
        self,
        reasoning: &Value,
        created_at: NaiveDateTime,
    ) -> Result<Idea, GenerationError> {
        let name = self.name_text().ok_or(GenerationError::MissingField("nombre"))?;
        let description = self
            .description_text()
            .ok_or(GenerationError::MissingField("descripcion"))?;
        let score = self.score_value()?;
        let idea_type = self.type_value()?;

        Ok(Idea {
            id: Idea::id_for(&created_at),
            name,
            idea_type,
            summary: text(&self.summary),
            description,
            target_audience: text(&self.target_audience),
            problem: text(&self.problem),
            solution: text(&self.solution),
            complexity: non_blank(text(&self.complexity))
                .unwrap_or_else(|| DEFAULT_COMPLEXITY.to_string()),
            dev_hours: hours(&self.dev_hours).unwrap_or(DEFAULT_DEV_HOURS),
            price: non_blank(text(&self.price)).unwrap_or_else(|| DEFAULT_PRICE.to_string()),
            mvp_features: text(&self.mvp_features),
            channels: text(&self.channels),
            competition: text(&self.competition),
            differentiation: text(&self.differentiation),
            score,
            landing_url: String::new(),
            landing_deployed: false,
            created_at,
            reasoning: reasoning.to_string(),
        })
    }
}

/// Flatten a loosely typed value to text; lists become comma-separated.
fn text(value: &Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| text(&Some(v.clone())))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Hours as a whole number; `"120"` and `120.0` are accepted
fn hours(value: &Option<Value>) -> Option<u32> {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|h| *h >= 0.0).map(|h| h.round() as u32),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}
