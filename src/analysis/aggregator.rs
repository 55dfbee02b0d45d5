//! Chart aggregations over a resolved dataset.
//!
//! Every aggregation here is a pure function of the dataset snapshot,
//! the role mapping and the chart options. Missing roles never fail an
//! aggregation; each one has a documented degraded shape instead.

use crate::config::{ChartsConfig, DistributionOrder, MarqueeOrder};
use crate::models::{
    cell, Dataset, Distribution, Efficiency, EfficiencyPoint, EntityStat, Evolution,
    EvolutionSeries, Marquee, RoleMapping, Value, YearBucket, UNKNOWN_LABEL,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

/// Color used when the palette is configured empty.
const FALLBACK_COLOR: &str = "#9ca3af";

const MIN_SIZE_HINT: usize = 4;
const MAX_SIZE_HINT: usize = 40;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y",
];

/// Options shared by the aggregators.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub palette: Vec<String>,
    /// Lower-cased marquee phrases.
    pub marquee_categories: Vec<String>,
    pub marquee_limit: usize,
    pub marquee_order: MarqueeOrder,
    pub distribution_order: DistributionOrder,
    pub distribution_limit: Option<usize>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self::from(&ChartsConfig::default())
    }
}

impl From<&ChartsConfig> for ChartOptions {
    fn from(config: &ChartsConfig) -> Self {
        Self {
            palette: config.palette.clone(),
            marquee_categories: config
                .marquee_categories
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            marquee_limit: config.marquee_limit,
            marquee_order: config.marquee_order,
            distribution_order: config.distribution_order,
            distribution_limit: config.distribution_limit,
        }
    }
}

impl ChartOptions {
    /// Palette color for the series at `position`.
    pub fn color_for(&self, position: usize) -> &str {
        if self.palette.is_empty() {
            FALLBACK_COLOR
        } else {
            &self.palette[position % self.palette.len()]
        }
    }
}

/// Insertion-ordered keyed accumulator.
#[derive(Debug)]
struct Tally<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V: Default> Tally<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Position of `key`, inserting it on first sight.
    fn position(&mut self, key: String) -> usize {
        if let Some(&pos) = self.index.get(&key) {
            return pos;
        }
        let pos = self.entries.len();
        self.index.insert(key.clone(), pos);
        self.entries.push((key, V::default()));
        pos
    }

    fn entry(&mut self, key: String) -> &mut V {
        let pos = self.position(key);
        &mut self.entries[pos].1
    }

    fn into_entries(self) -> Vec<(String, V)> {
        self.entries
    }
}

/// Decide whether an outcome value marks a win.
///
/// Text wins when it contains "win" or is one of yes/y/true/1 (after
/// trimming, case-insensitive). Other values win when truthy.
pub fn is_win(value: &Value) -> bool {
    if value.is_null() {
        return false;
    }

    match value.as_text() {
        Some(text) => {
            let lowered = text.trim().to_lowercase();
            lowered.contains("win") || matches!(lowered.as_str(), "yes" | "y" | "true" | "1")
        }
        None => value.is_truthy(),
    }
}

/// Derive a year from a temporal value: date/time parse first, then numeric.
pub fn parse_year(value: &Value) -> Option<i32> {
    match value {
        Value::Int(i) => i32::try_from(*i).ok(),
        Value::Float(f) => integral_year(*f),
        Value::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            parse_date_year(s).or_else(|| s.parse::<f64>().ok().and_then(integral_year))
        }
        Value::Null | Value::Bool(_) => None,
    }
}

fn parse_date_year(s: &str) -> Option<i32> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.year());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.year())
}

fn integral_year(f: f64) -> Option<i32> {
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn column_of(dataset: &Dataset, column: Option<&str>) -> Option<usize> {
    column.and_then(|c| dataset.column_index(c))
}

/// Count rows per category label.
///
/// Labels appear in first-seen order unless frequency ordering is
/// configured. Unresolved categories and null values count as "Unknown".
pub fn distribution(dataset: &Dataset, roles: &RoleMapping, options: &ChartOptions) -> Distribution {
    let category = column_of(dataset, roles.category.as_deref());

    let mut tally: Tally<usize> = Tally::new();
    for row in dataset.rows() {
        *tally.entry(cell(row, category).label_or_unknown()) += 1;
    }

    let mut entries = tally.into_entries();
    if options.distribution_order == DistributionOrder::Frequency {
        entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    }
    if let Some(limit) = options.distribution_limit {
        entries.truncate(limit);
    }

    let (labels, counts) = entries.into_iter().unzip();
    Distribution { labels, counts }
}

/// Build the dense year × category count matrix.
///
/// Empty when the temporal role is unresolved. Falls back to the first
/// dataset column when the category role is unresolved. Unparseable years
/// go to a trailing "Unknown" bucket.
pub fn evolution(dataset: &Dataset, roles: &RoleMapping, options: &ChartOptions) -> Evolution {
    let Some(temporal) = column_of(dataset, roles.temporal.as_deref()) else {
        return Evolution::default();
    };
    let category = column_of(dataset, roles.category.as_deref())
        .or_else(|| (!dataset.columns().is_empty()).then_some(0));

    let mut categories: Tally<()> = Tally::new();
    let mut matrix: BTreeMap<YearBucket, HashMap<usize, usize>> = BTreeMap::new();

    for row in dataset.rows() {
        let bucket = parse_year(cell(row, Some(temporal)))
            .map(YearBucket::Year)
            .unwrap_or(YearBucket::Unknown);
        let position = categories.position(cell(row, category).label_or_unknown());
        *matrix.entry(bucket).or_default().entry(position).or_default() += 1;
    }

    let labels = matrix.keys().map(ToString::to_string).collect();
    let datasets = categories
        .into_entries()
        .into_iter()
        .enumerate()
        .map(|(position, (label, ()))| {
            let data = matrix
                .values()
                .map(|counts| counts.get(&position).copied().unwrap_or(0))
                .collect();
            EvolutionSeries::new(label, data, options.color_for(position))
        })
        .collect();

    Evolution { labels, datasets }
}

/// Nominations, wins and efficiency per entity, in first-seen order.
pub fn efficiency(dataset: &Dataset, roles: &RoleMapping) -> Efficiency {
    let entity = column_of(dataset, roles.entity.as_deref());
    let outcome = column_of(dataset, roles.outcome.as_deref());

    let mut stats: Tally<EntityStat> = Tally::new();
    for row in dataset.rows() {
        let stat = stats.entry(cell(row, entity).label_or_unknown());
        stat.nominations += 1;
        if is_win(cell(row, outcome)) {
            stat.wins += 1;
        }
    }

    let points = stats
        .into_entries()
        .into_iter()
        .map(|(entity, stat)| EfficiencyPoint {
            entity,
            nominations: stat.nominations,
            wins: stat.wins,
            efficiency_pct: efficiency_pct(stat),
            size_hint: size_hint(stat.wins),
        })
        .collect();

    Efficiency { points }
}

fn efficiency_pct(stat: EntityStat) -> f64 {
    if stat.nominations == 0 {
        return 0.0;
    }
    let pct = stat.wins as f64 / stat.nominations as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

fn size_hint(wins: usize) -> u32 {
    wins.saturating_mul(4).clamp(MIN_SIZE_HINT, MAX_SIZE_HINT) as u32
}

/// Wins per entity within the marquee categories.
///
/// Needs a category-like column and an entity column; otherwise, or when
/// nothing was won, the "No Data" placeholder is returned.
pub fn marquee(dataset: &Dataset, roles: &RoleMapping, options: &ChartOptions) -> Marquee {
    let (Some(category), Some(entity)) = (
        column_of(dataset, roles.marquee_column()),
        column_of(dataset, roles.entity.as_deref()),
    ) else {
        return Marquee::placeholder();
    };
    let outcome = column_of(dataset, roles.outcome.as_deref());

    let mut wins: Tally<usize> = Tally::new();
    for row in dataset.rows() {
        let label = cell(row, Some(category)).label().unwrap_or_default().to_lowercase();
        let is_marquee = options
            .marquee_categories
            .iter()
            .any(|phrase| label.contains(phrase.as_str()));

        if is_marquee && is_win(cell(row, outcome)) {
            *wins.entry(cell(row, Some(entity)).label_or_unknown()) += 1;
        }
    }

    let mut entries = wins.into_entries();
    if options.marquee_order == MarqueeOrder::Wins {
        entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    }
    entries.truncate(options.marquee_limit);

    if entries.is_empty() {
        return Marquee::placeholder();
    }

    let (labels, counts) = entries.into_iter().unzip();
    Marquee { labels, counts }
}

/// `"min-max"` over the parseable years of the temporal column.
pub fn year_range(dataset: &Dataset, roles: &RoleMapping) -> String {
    let Some(temporal) = column_of(dataset, roles.temporal.as_deref()) else {
        return UNKNOWN_LABEL.to_string();
    };

    let years = dataset.rows().filter_map(|row| parse_year(cell(row, Some(temporal))));
    let range = years.fold(None, |acc: Option<(i32, i32)>, y| match acc {
        None => Some((y, y)),
        Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
    });

    match range {
        Some((lo, hi)) => format!("{}-{}", lo, hi),
        None => UNKNOWN_LABEL.to_string(),
    }
}
