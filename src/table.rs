//! Idea table - the CSV file holding every accepted idea
//!
//! UTF-8 with a byte-order mark, one header row, most recent idea first.
//! Fields are quoted per RFC 4180 when they contain a delimiter, quote or
//! line break.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::storage::write_atomic;
use crate::types::{Idea, IdeaType};

const BOM: char = '\u{feff}';

/// Column headers, in file order
pub const COLUMNS: [&str; 20] = [
    "ID",
    "Nombre",
    "Tipo",
    "Resumen",
    "Descripción",
    "Público Objetivo",
    "Problema",
    "Solución",
    "Complejidad",
    "Horas Desarrollo",
    "Precio Estimado",
    "MVP Features",
    "Canales",
    "Competencia",
    "Diferenciación",
    "Score Total",
    "Landing URL",
    "Landing Deployed",
    "Created Date",
    "Reasoning",
];

const DEPLOYED_YES: &str = "Sí";
const DEPLOYED_NO: &str = "No";

/// Append-at-front store of idea rows
pub struct IdeaTable {
    path: PathBuf,
}

impl IdeaTable {
    /// Open the table, writing an empty one (header only) if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if !path.exists() {
            write_atomic(&path, render(&[header_row()]).as_bytes())?;
            info!("Created idea table at {}", path.display());
        }
        Ok(Self { path })
    }

    /// Insert `idea` as the first data row.
    ///
    /// Existing rows are carried over verbatim.
    pub fn prepend(&self, idea: &Idea) -> StorageResult<()> {
        let mut rows = self.read_rows()?;
        if rows.is_empty() {
            rows.push(header_row());
        }
        rows.insert(1, idea_to_row(idea));
        write_atomic(&self.path, render(&rows).as_bytes())?;
        debug!("Prepended {} to {}", idea.id, self.path.display());
        Ok(())
    }

    /// All ideas, most recent first.
    pub fn load(&self) -> StorageResult<Vec<Idea>> {
        let rows = self.read_rows()?;
        let Some((header, data)) = rows.split_first() else {
            return Ok(Vec::new());
        };

        let index: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();
        for column in COLUMNS {
            if !index.contains_key(column) {
                return Err(self.malformed(1, format!("missing column '{}'", column)));
            }
        }

        data.iter()
            .enumerate()
            .map(|(i, row)| {
                row_to_idea(row, &index).map_err(|message| self.malformed(i + 2, message))
            })
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self) -> StorageResult<Vec<Vec<String>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse(&contents).map_err(|(line, message)| self.malformed(line, message))
    }

    fn malformed(&self, line: usize, message: String) -> StorageError {
        StorageError::Table { path: self.path.clone(), line, message }
    }
}

fn header_row() -> Vec<String> {
    COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn idea_to_row(idea: &Idea) -> Vec<String> {
    vec![
        idea.id.clone(),
        idea.name.clone(),
        idea.idea_type.to_string(),
        idea.summary.clone(),
        idea.description.clone(),
        idea.target_audience.clone(),
        idea.problem.clone(),
        idea.solution.clone(),
        idea.complexity.clone(),
        idea.dev_hours.to_string(),
        idea.price.clone(),
        idea.mvp_features.clone(),
        idea.channels.clone(),
        idea.competition.clone(),
        idea.differentiation.clone(),
        idea.score.to_string(),
        idea.landing_url.clone(),
        if idea.landing_deployed { DEPLOYED_YES } else { DEPLOYED_NO }.to_string(),
        idea.created_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        idea.reasoning.clone(),
    ]
}

fn row_to_idea(row: &[String], index: &HashMap<&str, usize>) -> Result<Idea, String> {
    let field = |name: &str| column(row, index, name);

    let idea_type: IdeaType = field("Tipo").parse().map_err(|e| format!("{}", e))?;
    let score = parse_whole_number(field("Score Total"))
        .filter(|s| *s <= 100)
        .ok_or_else(|| format!("invalid score '{}'", field("Score Total")))?;
    let dev_hours = parse_whole_number(field("Horas Desarrollo")).unwrap_or(0);
    let created_at = NaiveDateTime::parse_from_str(field("Created Date"), "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| format!("invalid date '{}': {}", field("Created Date"), e))?;

    Ok(Idea {
        id: field("ID").to_string(),
        name: field("Nombre").to_string(),
        idea_type,
        summary: field("Resumen").to_string(),
        description: field("Descripción").to_string(),
        target_audience: field("Público Objetivo").to_string(),
        problem: field("Problema").to_string(),
        solution: field("Solución").to_string(),
        complexity: field("Complejidad").to_string(),
        dev_hours: dev_hours as u32,
        price: field("Precio Estimado").to_string(),
        mvp_features: field("MVP Features").to_string(),
        channels: field("Canales").to_string(),
        competition: field("Competencia").to_string(),
        differentiation: field("Diferenciación").to_string(),
        score: score as u8,
        landing_url: field("Landing URL").to_string(),
        landing_deployed: is_deployed_marker(field("Landing Deployed")),
        created_at,
        reasoning: field("Reasoning").to_string(),
    })
}

fn column<'a>(row: &'a [String], index: &HashMap<&str, usize>, name: &str) -> &'a str {
    index
        .get(name)
        .and_then(|&i| row.get(i))
        .map(|s| s.as_str())
        .unwrap_or("")
}

/// `"75"` and `"75.0"` both read as 75
fn parse_whole_number(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64)
    })
}

pub(crate) fn is_deployed_marker(raw: &str) -> bool {
    raw.trim().to_lowercase() == DEPLOYED_YES.to_lowercase()
}

fn render(rows: &[Vec<String>]) -> String {
    let mut out = String::with_capacity(4096);
    out.push(BOM);
    for row in rows {
        let line: Vec<String> = row.iter().map(|f| quote(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split CSV text into rows of fields. Errors carry the 1-based line number.
fn parse(contents: &str) -> Result<Vec<Vec<String>>, (usize, String)> {
    let text = contents.strip_prefix(BOM).unwrap_or(contents);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err((quote_line, "unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    // Blank lines carry no data
    rows.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    Ok(rows)
}
