//! Data models for the chart pipeline.
//!
//! This module contains the in-memory dataset representation, the role
//! mapping produced by column resolution, and every payload structure
//! the aggregators emit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used wherever a value or column is missing.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Placeholder label for an empty marquee view.
pub const NO_DATA_LABEL: &str = "No Data";

static NULL: Value = Value::Null;

/// A single scalar cell of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value. Distinct from an empty string.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Returns true for absent values and NaN floats.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Returns the text content for textual values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness of a non-textual value (non-zero, non-null).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => !f.is_nan() && *f != 0.0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Returns the value as a label, or `None` when it is null.
    pub fn label(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Returns the value as a label, substituting [`UNKNOWN_LABEL`] for nulls.
    pub fn label_or_unknown(&self) -> String {
        self.label().unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

/// An in-memory table whose column set is discovered at load time.
///
/// Every row holds exactly one value per column; rows are padded with
/// [`Value::Null`] (or truncated) on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, normalizing every row to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Column names in declared order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over rows as value slices.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Read a cell by optional column index; unresolved columns read as null.
pub fn cell(row: &[Value], index: Option<usize>) -> &Value {
    index.and_then(|i| row.get(i)).unwrap_or(&NULL)
}

/// Semantic slot a dataset column may be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Temporal,
    Category,
    Entity,
    Outcome,
}

impl Role {
    /// All roles in resolution order.
    pub const ALL: [Role; 4] = [Role::Temporal, Role::Category, Role::Entity, Role::Outcome];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Temporal => write!(f, "temporal"),
            Role::Category => write!(f, "category"),
            Role::Entity => write!(f, "entity"),
            Role::Outcome => write!(f, "outcome"),
        }
    }
}

/// Resolved column per role. Computed once per dataset load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMapping {
    pub temporal: Option<String>,
    pub category: Option<String>,
    pub entity: Option<String>,
    pub outcome: Option<String>,
    /// Award-like column scanned for marquee categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub award: Option<String>,
}

impl RoleMapping {
    /// Column mapped to a role, if any.
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Temporal => self.temporal.as_deref(),
            Role::Category => self.category.as_deref(),
            Role::Entity => self.entity.as_deref(),
            Role::Outcome => self.outcome.as_deref(),
        }
    }

    /// Column used to detect marquee categories.
    pub fn marquee_column(&self) -> Option<&str> {
        self.award.as_deref()
    }

    /// Roles that could not be resolved.
    pub fn unresolved(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.get(*r).is_none())
            .collect()
    }
}

/// Year bucket on the evolution axis. Unknown sorts after every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum YearBucket {
    Year(i32),
    Unknown,
}

impl fmt::Display for YearBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearBucket::Year(y) => write!(f, "{}", y),
            YearBucket::Unknown => write!(f, "{}", UNKNOWN_LABEL),
        }
    }
}

/// Per-entity accumulator for nominations and wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityStat {
    pub nominations: usize,
    pub wins: usize,
}

/// Label/count pairs over the category role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

/// One category series of the evolution matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionSeries {
    pub label: String,
    pub data: Vec<usize>,
    pub background_color: String,
    pub border_color: String,
}

impl EvolutionSeries {
    /// Create a series drawn in a single color.
    pub fn new(label: String, data: Vec<usize>, color: &str) -> Self {
        Self {
            label,
            data,
            background_color: color.to_string(),
            border_color: color.to_string(),
        }
    }
}

/// Year-ordered, category-keyed count matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evolution {
    pub labels: Vec<String>,
    pub datasets: Vec<EvolutionSeries>,
}

/// Win efficiency of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyPoint {
    pub entity: String,
    pub nominations: usize,
    pub wins: usize,
    pub efficiency_pct: f64,
    /// Bubble radius for rendering.
    pub size_hint: u32,
}

/// Per-entity efficiency scatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Efficiency {
    pub points: Vec<EfficiencyPoint>,
}

/// Wins per entity within the marquee categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marquee {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

impl Marquee {
    /// Explicit placeholder emitted when nothing can be counted.
    pub fn placeholder() -> Self {
        Self {
            labels: vec![NO_DATA_LABEL.to_string()],
            counts: vec![0],
        }
    }

    /// Returns true if this is the placeholder shape.
    pub fn is_placeholder(&self) -> bool {
        self.labels.len() == 1 && self.labels[0] == NO_DATA_LABEL && self.counts == [0]
    }
}

impl Default for Marquee {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Dataset metadata attached to every payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMeta {
    pub row_count: usize,
    pub column_names: Vec<String>,
    /// `"min-max"` over parseable years, or `"Unknown"`.
    pub year_range: String,
    pub roles: RoleMapping,
    /// Sections that fell back to their degraded shape.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

/// The complete chart payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub polar: Distribution,
    pub evolution: Evolution,
    pub scatter: Efficiency,
    pub big4: Marquee,
    pub meta: PayloadMeta,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Dataset location the payload was built from.
    pub source: String,
    /// Date and time of generation.
    pub generated_at: DateTime<Utc>,
    /// Load plus assembly time in seconds.
    pub duration_seconds: f64,
}

/// A payload together with how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_pads_short_rows() {
        let dataset = Dataset::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::from("x")], vec![Value::from("y"), Value::Int(1)]],
        );

        let rows: Vec<_> = dataset.rows().collect();
        assert_eq!(rows[0], &[Value::from("x"), Value::Null][..]);
        assert_eq!(rows[1].len(), 2);
        assert_eq!(dataset.column_index("b"), Some(1));
        assert_eq!(dataset.column_index("c"), None);
    }

    #[test]
    fn test_null_is_distinct_from_empty_text() {
        assert!(Value::Null.is_null());
        assert!(Value::Float(f64::NAN).is_null());
        assert!(!Value::from("").is_null());
        assert_eq!(Value::from("").label(), Some(String::new()));
        assert_eq!(Value::Null.label_or_unknown(), UNKNOWN_LABEL);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(2).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_year_bucket_ordering() {
        let mut buckets = vec![
            YearBucket::Unknown,
            YearBucket::Year(2001),
            YearBucket::Year(1999),
        ];
        buckets.sort();
        assert_eq!(
            buckets,
            vec![
                YearBucket::Year(1999),
                YearBucket::Year(2001),
                YearBucket::Unknown
            ]
        );
        assert_eq!(YearBucket::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_marquee_placeholder() {
        let marquee = Marquee::default();
        assert!(marquee.is_placeholder());
        assert_eq!(marquee.labels, vec!["No Data"]);
        assert_eq!(marquee.counts, vec![0]);
    }

    #[test]
    fn test_payload_field_names() {
        let json = serde_json::to_value(Payload::default()).unwrap();
        for key in ["polar", "evolution", "scatter", "big4", "meta"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["meta"].get("rowCount").is_some());
        assert!(json["meta"].get("columnNames").is_some());
        assert!(json["meta"].get("degraded").is_none());
    }

    #[test]
    fn test_role_mapping_marquee_column() {
        let roles = RoleMapping {
            category: Some("genre".to_string()),
            award: Some("Award Name".to_string()),
            ..RoleMapping::default()
        };
        assert_eq!(roles.marquee_column(), Some("Award Name"));
        assert_eq!(roles.unresolved().len(), 4);
    }
}
