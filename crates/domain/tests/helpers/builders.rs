#![allow(dead_code)]
use chrono::{DateTime, TimeZone, Utc};
use ferrous_analytics_domain::OutcomeRecord;

pub fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub struct OutcomeRecordBuilder {
    timestamp: DateTime<Utc>,
    path: String,
    client: String,
    node: Option<String>,
    status_code: Option<u16>,
    latency_ms: Option<u64>,
}

impl OutcomeRecordBuilder {
    pub fn new() -> Self {
        Self {
            timestamp: ts(2024, 3, 1, 12, 0),
            path: "/api/orders".to_string(),
            client: "10.0.0.1".to_string(),
            node: None,
            status_code: Some(200),
            latency_ms: Some(12),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn client(mut self, client: &str) -> Self {
        self.client = client.to_string();
        self
    }

    pub fn node(mut self, node: &str) -> Self {
        self.node = Some(node.to_string());
        self
    }

    pub fn status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn build(self) -> OutcomeRecord {
        let mut record = OutcomeRecord::new(
            self.timestamp,
            &self.path,
            &self.client,
            self.status_code,
        );
        if let Some(node) = self.node {
            record = record.with_node(&node);
        }
        if let Some(latency) = self.latency_ms {
            record = record.with_latency(latency);
        }
        record
    }
}
