//! Shared types used across modules
//!
//! Idea records exist in two shapes: the compact [`IdeaRecord`] kept in the
//! de-duplication history and fed to statistics, and the full [`Idea`] row
//! stored in the idea table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Product category of an idea.
///
/// Wire names are the ones the generator and existing data files use
/// (`Plantilla`, `InfoProducto`); English spellings are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdeaType {
    #[default]
    SaaS,
    Extension,
    MicroSaaS,
    Template,
    InfoProduct,
}

impl IdeaType {
    pub const ALL: [IdeaType; 5] = [
        IdeaType::SaaS,
        IdeaType::Extension,
        IdeaType::MicroSaaS,
        IdeaType::Template,
        IdeaType::InfoProduct,
    ];

    /// Name as written to files and prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaType::SaaS => "SaaS",
            IdeaType::Extension => "Extension",
            IdeaType::MicroSaaS => "MicroSaaS",
            IdeaType::Template => "Plantilla",
            IdeaType::InfoProduct => "InfoProducto",
        }
    }
}

impl std::fmt::Display for IdeaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown idea type '{0}'")]
pub struct UnknownIdeaType(pub String);

impl FromStr for IdeaType {
    type Err = UnknownIdeaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "saas" => Ok(IdeaType::SaaS),
            "extension" | "extensión" | "browserextension" => Ok(IdeaType::Extension),
            "microsaas" => Ok(IdeaType::MicroSaaS),
            "plantilla" | "template" => Ok(IdeaType::Template),
            "infoproducto" | "infoproduct" => Ok(IdeaType::InfoProduct),
            _ => Err(UnknownIdeaType(s.to_string())),
        }
    }
}

impl Serialize for IdeaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdeaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Read a persisted score leniently: integers, fractional numbers such as
/// `72.5` or `80.0`, and numeric strings are rounded and clamped to 0..=100.
pub(crate) fn deserialize_score<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(f64),
        Text(String),
    }

    let value = match RawScore::deserialize(deserializer)? {
        RawScore::Number(n) => n,
        RawScore::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid score '{}'", s)))?,
    };
    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!("invalid score {}", value)));
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// Read a persisted type name as written, whatever category it names.
/// `null` becomes an empty string; other scalars keep their JSON text.
pub(crate) fn deserialize_type_name<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Compact, immutable record of an accepted idea.
#[derive(Debug, Clone, PartialEq)]
pub struct IdeaRecord {
    pub name: String,
    pub description: String,
    pub idea_type: IdeaType,
    /// 0..=100
    pub score: u8,
    pub created_at: NaiveDateTime,
}

/// One full row of the idea table.
#[derive(Debug, Clone, PartialEq)]
pub struct Idea {
    pub id: String,
    pub name: String,
    pub idea_type: IdeaType,
    pub summary: String,
    pub description: String,
    pub target_audience: String,
    pub problem: String,
    pub solution: String,
    pub complexity: String,
    pub dev_hours: u32,
    pub price: String,
    pub mvp_features: String,
    pub channels: String,
    pub competition: String,
    pub differentiation: String,
    pub score: u8,
    pub landing_url: String,
    pub landing_deployed: bool,
    pub created_at: NaiveDateTime,
    /// Generator's reasoning, as a JSON document
    pub reasoning: String,
}

impl Idea {
    /// Table ID derived from the creation time, e.g. `IDEA-20240131093000`
    pub fn id_for(created_at: &NaiveDateTime) -> String {
        format!("IDEA-{}", created_at.format("%Y%m%d%H%M%S"))
    }

    pub fn record(&self) -> IdeaRecord {
        IdeaRecord {
            name: self.name.clone(),
            description: self.description.clone(),
            idea_type: self.idea_type,
            score: self.score,
            created_at: self.created_at,
        }
    }
}

/// Local wall-clock time without offset, the timestamp format used by the
/// data files.
pub fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idea_type_wire_names() {
        assert_eq!(IdeaType::Template.to_string(), "Plantilla");
        assert_eq!(IdeaType::InfoProduct.to_string(), "InfoProducto");
        assert_eq!(IdeaType::SaaS.to_string(), "SaaS");
    }

    #[test]
    fn test_idea_type_parse_aliases() {
        assert_eq!("saas".parse::<IdeaType>().unwrap(), IdeaType::SaaS);
        assert_eq!("Micro-SaaS".parse::<IdeaType>().unwrap(), IdeaType::MicroSaaS);
        assert_eq!("Template".parse::<IdeaType>().unwrap(), IdeaType::Template);
        assert_eq!("info producto".parse::<IdeaType>().unwrap(), IdeaType::InfoProduct);
        assert!("Hardware".parse::<IdeaType>().is_err());
    }

    #[test]
    fn test_idea_type_serde() {
        let json = serde_json::to_string(&IdeaType::Template).unwrap();
        assert_eq!(json, "\"Plantilla\"");
        let parsed: IdeaType = serde_json::from_str("\"InfoProduct\"").unwrap();
        assert_eq!(parsed, IdeaType::InfoProduct);
    }

    #[derive(Debug, Deserialize)]
    struct Persisted {
        #[serde(deserialize_with = "deserialize_score")]
        score: u8,
        #[serde(deserialize_with = "deserialize_type_name")]
        tipo: String,
    }

    #[test]
    fn test_persisted_scores_are_rounded() {
        let cases = [
            ("72", 72),
            ("72.5", 73),
            ("80.0", 80),
            ("\"64\"", 64),
            ("140", 100),
            ("-3", 0),
        ];
        for (raw, expected) in cases {
            let json = format!(r#"{{"score": {}, "tipo": "SaaS"}}"#, raw);
            let parsed: Persisted = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.score, expected, "score {}", raw);
        }
        let bad = serde_json::from_str::<Persisted>(r#"{"score": "high", "tipo": "SaaS"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_persisted_type_names_are_kept() {
        let parsed: Persisted =
            serde_json::from_str(r#"{"score": 50, "tipo": "Herramienta"}"#).unwrap();
        assert_eq!(parsed.tipo, "Herramienta");
        let parsed: Persisted = serde_json::from_str(r#"{"score": 50, "tipo": null}"#).unwrap();
        assert_eq!(parsed.tipo, "");
    }

    #[test]
    fn test_id_format() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(Idea::id_for(&at), "IDEA-20240131093000");
    }
}
