use crate::{CategoryCounts, DomainError, Granularity, OutcomeCategory, OutcomeRecord, TimeRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Client,
    Node,
    Path,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Client => "client",
            FilterField::Node => "node",
            FilterField::Path => "path",
        }
    }
}

impl FromStr for FilterField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(FilterField::Client),
            "node" => Ok(FilterField::Node),
            "path" => Ok(FilterField::Path),
            other => Err(DomainError::InvalidFilter(format!("unknown field '{}'", other))),
        }
    }
}

/// Equality predicates applied to outcome records.
///
/// Predicates are kept in field order, so two filters with the same content
/// always produce the same [`ReportFilter::normalized`] form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportFilter {
    predicates: BTreeMap<FilterField, String>,
}

impl ReportFilter {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a predicate. Blank values are ignored.
    pub fn with(mut self, field: FilterField, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.predicates.insert(field, value.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.predicates.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.predicates.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn normalized(&self) -> String {
        self.predicates
            .iter()
            .map(|(field, value)| format!("{}={}", field.as_str(), value))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn matches(&self, record: &OutcomeRecord) -> bool {
        self.predicates.iter().all(|(field, value)| match field {
            FilterField::Client => record.client.as_ref() == value,
            FilterField::Node => record.node.as_deref() == Some(value.as_str()),
            FilterField::Path => record.path.as_ref() == value,
        })
    }
}

impl FromStr for ReportFilter {
    type Err = DomainError;

    /// Parses `field=value` pairs separated by `,` or `&`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = ReportFilter::empty();
        for pair in s.split([',', '&']).map(str::trim).filter(|p| !p.is_empty()) {
            let (field, value) = pair
                .split_once('=')
                .ok_or_else(|| DomainError::InvalidFilter(format!("expected field=value, got '{}'", pair)))?;
            let field: FilterField = field.parse()?;
            if filter.predicates.contains_key(&field) {
                return Err(DomainError::InvalidFilter(format!(
                    "field '{}' given more than once",
                    field.as_str()
                )));
            }
            filter = filter.with(field, value);
        }
        Ok(filter)
    }
}

impl fmt::Display for ReportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// Which store answered a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Raw,
    Aggregated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub label: String,
    pub counts: CategoryCounts,
}

impl TimeSlot {
    pub fn total(&self) -> u64 {
        self.counts.total()
    }
}

/// Outcome counts per time bucket over a window.
///
/// Built only through [`ReportResult::from_bucket_counts`], which derives every
/// total from the slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportResult {
    total_requests: u64,
    totals: CategoryCounts,
    slots: Vec<TimeSlot>,
    granularity: Granularity,
    label_format: &'static str,
    source: ReportSource,
}

impl ReportResult {
    /// Assembles a report covering every bucket in the span of `range`.
    ///
    /// Counts are attributed to the bucket containing their timestamp; counts
    /// outside the span are dropped. Buckets without counts get zero slots.
    pub fn from_bucket_counts<I>(
        range: &TimeRange,
        granularity: Granularity,
        counts: I,
        source: ReportSource,
    ) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, OutcomeCategory, u64)>,
    {
        let span = granularity.span(range);
        let mut per_bucket: HashMap<DateTime<Utc>, CategoryCounts> = HashMap::new();
        for (ts, category, count) in counts {
            if !span.contains(ts) {
                continue;
            }
            per_bucket
                .entry(granularity.bucket_start(ts))
                .or_default()
                .add(category, count);
        }

        let slots: Vec<TimeSlot> = granularity
            .bucket_starts(range)
            .into_iter()
            .map(|start| TimeSlot {
                start,
                label: granularity.label(start),
                counts: per_bucket.remove(&start).unwrap_or_default(),
            })
            .collect();

        let mut totals = CategoryCounts::default();
        for slot in &slots {
            totals.merge(&slot.counts);
        }

        Self {
            total_requests: totals.total(),
            totals,
            slots,
            granularity,
            label_format: granularity.label_format(),
            source,
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn totals(&self) -> &CategoryCounts {
        &self.totals
    }

    pub fn count(&self, category: OutcomeCategory) -> u64 {
        self.totals.get(category)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<TimeSlot> {
        self.slots
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn label_format(&self) -> &'static str {
        self.label_format
    }

    pub fn source(&self) -> ReportSource {
        self.source
    }
}
