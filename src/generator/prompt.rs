//! Generation prompt assembled from the system's memory

use crate::memory::SuccessFactor;

const FIRST_IDEA: &str = "No history yet: this is the first idea.";

const TASK: &str = r#"TASK:
Generate ONE viable digital product idea with real commercial potential.
Think through the problem, who suffers it, why now, the minimum viable product,
technical effort and go-to-market before answering.

Score it honestly from 40 to 90:
- real market demand (0-30)
- technical feasibility (0-30)
- commercial potential (0-30)

Reply with this JSON object:
{
  "reasoning": {
    "problema_identificado": "...",
    "porque_ahora": "...",
    "oportunidad": "...",
    "diferenciacion": "..."
  },
  "idea": {
    "nombre": "...",
    "tipo": "SaaS|Extension|MicroSaaS|Plantilla|InfoProducto",
    "resumen": "...",
    "descripcion": "...",
    "publico_objetivo": "...",
    "problema": "...",
    "solucion": "...",
    "complejidad": "Baja|Media|Alta",
    "horas_desarrollo": 80,
    "precio_estimado": "$X/mes or $X one-time",
    "mvp_features": "Feature 1, Feature 2, Feature 3",
    "canales": "Channel 1, Channel 2, Channel 3",
    "competencia": "...",
    "diferenciacion": "...",
    "score": 60
  }
}"#;

/// Build the generation prompt from memory insights and the best prior ideas.
///
/// Only the first three success factors are quoted.
pub fn build_prompt(insights: &[String], success_factors: &[SuccessFactor]) -> String {
    let mut prompt = String::from("SYSTEM CONTEXT:\n");
    if insights.is_empty() {
        prompt.push_str(FIRST_IDEA);
        prompt.push('\n');
    } else {
        for insight in insights {
            prompt.push_str(insight);
            prompt.push('\n');
        }
    }

    if !success_factors.is_empty() {
        prompt.push_str("\nSuccessful previous ideas:\n");
        for factor in success_factors.iter().take(3) {
            prompt.push_str(&format!(
                "- {}: {} (score {})\n",
                factor.idea_type, factor.name, factor.score
            ));
        }
    }

    prompt.push('\n');
    prompt.push_str(TASK);
    prompt.push('\n');
    prompt
}
