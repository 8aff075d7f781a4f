use std::collections::BTreeMap;
use std::fmt;

use crate::data::ImpactRecord;
use crate::error::QueryError;

/// The fixed decade axis: 1900, 1910, ..., 2100
pub const DECADES: [i32; 21] = [
    1900, 1910, 1920, 1930, 1940, 1950, 1960, 1970, 1980, 1990, 2000, 2010, 2020, 2030, 2040,
    2050, 2060, 2070, 2080, 2090, 2100,
];

pub const FIRST_DECADE: i32 = DECADES[0];
pub const LAST_DECADE: i32 = DECADES[DECADES.len() - 1];
const DECADE_STEP: i32 = 10;

pub fn is_decade(year: i32) -> bool {
    (FIRST_DECADE..=LAST_DECADE).contains(&year) && year % DECADE_STEP == 0
}

/// Inclusive window over the decade axis. Always `min <= max`, both on the axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecadeRange {
    min: i32,
    max: i32,
}

impl DecadeRange {
    pub fn new(min: i32, max: i32) -> Result<Self, QueryError> {
        for year in [min, max] {
            if !is_decade(year) {
                return Err(QueryError::UnknownDecade(year));
            }
        }
        if min > max {
            return Err(QueryError::ReversedRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// The whole axis
    pub fn all() -> Self {
        Self {
            min: FIRST_DECADE,
            max: LAST_DECADE,
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, decade: i32) -> bool {
        (self.min..=self.max).contains(&decade)
    }

    /// Number of decades covered
    pub fn decade_count(&self) -> usize {
        ((self.max - self.min) / DECADE_STEP + 1) as usize
    }

    /// Move the start handle by `steps` decades; `None` if that leaves the axis or passes the end
    pub fn move_start(&self, steps: i32) -> Option<Self> {
        Self::new(self.min + steps * DECADE_STEP, self.max).ok()
    }

    /// Move the end handle by `steps` decades
    pub fn move_end(&self, steps: i32) -> Option<Self> {
        Self::new(self.min, self.max + steps * DECADE_STEP).ok()
    }

    /// Slide the whole window by `steps` decades, keeping its width
    pub fn shift(&self, steps: i32) -> Option<Self> {
        let delta = steps * DECADE_STEP;
        Self::new(self.min + delta, self.max + delta).ok()
    }
}

impl Default for DecadeRange {
    fn default() -> Self {
        Self { min: 1900, max: 1920 }
    }
}

impl fmt::Display for DecadeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Which magnitude gets summed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImpactMetric {
    #[default]
    Human,
    Financial,
}

impl ImpactMetric {
    pub fn value_of(&self, record: &ImpactRecord) -> f64 {
        match self {
            ImpactMetric::Human => record.human_impact,
            ImpactMetric::Financial => record.financial_impact,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ImpactMetric::Human => ImpactMetric::Financial,
            ImpactMetric::Financial => ImpactMetric::Human,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactMetric::Human => "Human",
            ImpactMetric::Financial => "Financial",
        }
    }
}

/// Climate scenario constraint
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScenarioFilter {
    Any,
    Only(f64),
}

impl ScenarioFilter {
    pub fn matches(&self, scenario: f64) -> bool {
        match self {
            ScenarioFilter::Any => true,
            ScenarioFilter::Only(code) => scenario == *code,
        }
    }
}

impl Default for ScenarioFilter {
    fn default() -> Self {
        ScenarioFilter::Only(0.0)
    }
}

impl fmt::Display for ScenarioFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioFilter::Any => write!(f, "all scenarios"),
            ScenarioFilter::Only(code) if *code == 0.0 => write!(f, "baseline"),
            ScenarioFilter::Only(code) => write!(f, "RCP {code}"),
        }
    }
}

/// One query's parameters
#[derive(Clone, Debug, PartialEq)]
pub struct QueryParams {
    pub decades: DecadeRange,
    pub disaster_type: String,
    pub metric: ImpactMetric,
    pub scenario: ScenarioFilter,
}

impl QueryParams {
    pub fn matches(&self, record: &ImpactRecord) -> bool {
        self.decades.contains(record.decade)
            && record.disaster_type == self.disaster_type
            && self.scenario.matches(record.scenario)
    }
}

/// Per-sub-region sums for one query. Sub-regions without matches are absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregation {
    sums: BTreeMap<String, f64>,
    matched: usize,
}

impl Aggregation {
    pub fn get(&self, subregion: &str) -> Option<f64> {
        self.sums.get(subregion).copied()
    }

    /// (sub-region, sum) in sub-region order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.sums.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Records that passed the filter
    pub fn matched_records(&self) -> usize {
        self.matched
    }
}

/// Filter records and sum the chosen metric per sub-region.
/// Records are accumulated in slice order, so equal inputs give bit-identical sums.
pub fn aggregate(records: &[ImpactRecord], params: &QueryParams) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for record in records.iter().filter(|r| params.matches(r)) {
        let value = params.metric.value_of(record);
        match aggregation.sums.get_mut(record.subregion.as_str()) {
            Some(sum) => *sum += value,
            None => {
                aggregation.sums.insert(record.subregion.clone(), value);
            }
        }
        aggregation.matched += 1;
    }

    tracing::debug!(
        decades = %params.decades,
        disaster = %params.disaster_type,
        metric = params.metric.label(),
        matched = aggregation.matched,
        regions = aggregation.len(),
        "aggregated impacts"
    );

    aggregation
}
