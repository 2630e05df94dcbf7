use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Coarse classification of an outcome code.
///
/// Redirects (3xx) and unparseable codes both count as [`OutcomeCategory::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Success,
    ClientError,
    ServerError,
    Other,
}

impl OutcomeCategory {
    pub const ALL: [OutcomeCategory; 4] = [
        OutcomeCategory::Success,
        OutcomeCategory::ClientError,
        OutcomeCategory::ServerError,
        OutcomeCategory::Other,
    ];

    pub fn from_status(status_code: Option<u16>) -> Self {
        match status_code.map(|code| code / 100) {
            Some(2) => OutcomeCategory::Success,
            Some(4) => OutcomeCategory::ClientError,
            Some(5) => OutcomeCategory::ServerError,
            _ => OutcomeCategory::Other,
        }
    }

    /// Numeric code persisted in the aggregate store (`status / 100`, 0 for other).
    pub fn code(&self) -> i64 {
        match self {
            OutcomeCategory::Success => 2,
            OutcomeCategory::ClientError => 4,
            OutcomeCategory::ServerError => 5,
            OutcomeCategory::Other => 0,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(OutcomeCategory::Success),
            4 => Some(OutcomeCategory::ClientError),
            5 => Some(OutcomeCategory::ServerError),
            0 => Some(OutcomeCategory::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCategory::Success => "success",
            OutcomeCategory::ClientError => "client_error",
            OutcomeCategory::ServerError => "server_error",
            OutcomeCategory::Other => "other",
        }
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category request counts. The total is always derived from the subtotals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub success: u64,
    pub client_error: u64,
    pub server_error: u64,
    pub other: u64,
}

impl CategoryCounts {
    pub fn total(&self) -> u64 {
        self.success + self.client_error + self.server_error + self.other
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, category: OutcomeCategory) -> u64 {
        match category {
            OutcomeCategory::Success => self.success,
            OutcomeCategory::ClientError => self.client_error,
            OutcomeCategory::ServerError => self.server_error,
            OutcomeCategory::Other => self.other,
        }
    }

    fn slot_mut(&mut self, category: OutcomeCategory) -> &mut u64 {
        match category {
            OutcomeCategory::Success => &mut self.success,
            OutcomeCategory::ClientError => &mut self.client_error,
            OutcomeCategory::ServerError => &mut self.server_error,
            OutcomeCategory::Other => &mut self.other,
        }
    }

    pub fn add(&mut self, category: OutcomeCategory, count: u64) {
        *self.slot_mut(category) += count;
    }

    pub fn set(&mut self, category: OutcomeCategory, count: u64) {
        *self.slot_mut(category) = count;
    }

    pub fn merge(&mut self, other: &CategoryCounts) {
        for (category, count) in other.iter() {
            self.add(category, count);
        }
    }

    /// Every category with its count, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (OutcomeCategory, u64)> + '_ {
        OutcomeCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

impl FromIterator<(OutcomeCategory, u64)> for CategoryCounts {
    fn from_iter<I: IntoIterator<Item = (OutcomeCategory, u64)>>(iter: I) -> Self {
        let mut counts = CategoryCounts::default();
        for (category, count) in iter {
            counts.add(category, count);
        }
        counts
    }
}

/// One request outcome as written by the proxy. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub path: Arc<str>,
    pub client: Arc<str>,
    pub node: Option<Arc<str>>,
    pub status_code: Option<u16>,
    pub latency_ms: Option<u64>,
    pub is_error: bool,
    pub error_message: Option<Arc<str>>,
}

impl OutcomeRecord {
    pub fn new(timestamp: DateTime<Utc>, path: &str, client: &str, status_code: Option<u16>) -> Self {
        Self {
            id: None,
            timestamp,
            path: Arc::from(path),
            client: Arc::from(client),
            node: None,
            status_code,
            latency_ms: None,
            is_error: status_code.is_none_or(|code| code >= 500),
            error_message: None,
        }
    }

    pub fn with_node(mut self, node: &str) -> Self {
        self.node = Some(Arc::from(node));
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.is_error = true;
        self.error_message = Some(Arc::from(message));
        self
    }

    pub fn category(&self) -> OutcomeCategory {
        OutcomeCategory::from_status(self.status_code)
    }
}

/// One page of outcome records, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutcomePage {
    pub records: Vec<OutcomeRecord>,
    pub next_cursor: Option<i64>,
}
