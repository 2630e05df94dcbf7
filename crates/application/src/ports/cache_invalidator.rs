use ferrous_analytics_domain::TimeRange;

/// Something holding results derived from a time range that can be told the range changed.
pub trait CacheInvalidator: Send + Sync {
    /// Returns how many entries were dropped.
    fn invalidate(&self, range: &TimeRange) -> usize;
}
